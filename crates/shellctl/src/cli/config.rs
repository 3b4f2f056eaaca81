//! `shellctl config`: inspect the effective configuration.

use crate::cli::context::ConnectionArgs;
use anyhow::{Context, Result};
use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the configuration after flags and environment are applied
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction, args: &ConnectionArgs) -> Result<()> {
    match action {
        ConfigAction::Show { json } => {
            let config = args.merge(args.load_config()?);
            let rendered = if json {
                serde_json::to_string_pretty(&config)?
            } else {
                toml::to_string_pretty(&config).context("Failed to render config")?
            };
            println!("{}", rendered.trim_end());
        }
        ConfigAction::Path => {
            let path = args.config_path();
            let state = if path.exists() { "" } else { " (not found; using defaults)" };
            println!("{}{}", path.display(), state);
        }
    }
    Ok(())
}
