//! shellctl: run statements and AdminAPI scripts through the MySQL
//! management shell, and coordinate cluster operations with the task lock.

use anyhow::Result;
use clap::{Parser, Subcommand};
use shellctl_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

use cli::cluster::ClusterAction;
use cli::config::ConfigAction;
use cli::context::ConnectionArgs;
use cli::lock::LockAction;

#[derive(Parser, Debug)]
#[command(name = "shellctl", version, about = "Drive the MySQL management shell")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify the instance accepts the configured credentials
    Check,

    /// Run one SQL statement and print the result rows
    Sql {
        statement: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a Python script in the management shell and print its output
    Script {
        code: Option<String>,

        /// Read the script from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Manage the task lock table
    Lock {
        #[command(subcommand)]
        action: LockAction,
    },

    /// Query the InnoDB cluster
    Cluster {
        #[command(subcommand)]
        action: ClusterAction,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn run_command(cli: Cli) -> Result<()> {
    let args = &cli.connection;
    match cli.command {
        // No password or server needed.
        Commands::Config { action } => cli::config::run(action, args),

        Commands::Check => cli::query::check(&args.session()?),
        Commands::Sql { statement, json } => cli::query::sql(&args.session()?, &statement, json),
        Commands::Script { code, file } => cli::query::script(&args.session()?, code, file),
        Commands::Lock { action } => cli::lock::run(action, &args.session()?),
        Commands::Cluster { action } => cli::cluster::run(action, &args.session()?),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "shellctl",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: logging disabled: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::from(1)
        }
    }
}
