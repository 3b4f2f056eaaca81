//! `check`, `sql` and `script`: one management shell call each.

use crate::cli::context::Session;
use crate::cli::output::print_rows;
use anyhow::{bail, Context, Result};
use shellctl_executor::Executor;
use std::path::PathBuf;

pub fn check(session: &Session) -> Result<()> {
    let address = session.connection.address();
    session
        .executor()
        .check_connection()
        .with_context(|| format!("Cannot connect to {}", address))?;
    println!(
        "Connected to {} as {}",
        address,
        session.connection.username()
    );
    Ok(())
}

pub fn sql(session: &Session, statement: &str, json: bool) -> Result<()> {
    let rows = session
        .executor()
        .execute_sql(statement, session.timeout)
        .context("Statement failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("No rows.");
    } else {
        print_rows(&rows);
    }
    Ok(())
}

/// Script source: inline code or a file, exactly one of them.
pub fn script_source(code: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (code, file) {
        (Some(code), None) => Ok(code),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        (Some(_), Some(_)) => bail!("Give the script inline or with --file, not both"),
        (None, None) => bail!("No script given; pass CODE or --file"),
    }
}

pub fn script(session: &Session, code: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let code = script_source(code, file)?;
    let output = session
        .executor()
        .execute_script(&code, session.timeout)
        .context("Script failed")?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
