//! Tracing setup for shellctl binaries.
//!
//! Every event goes to `<home>/logs/<app>.log` (size-capped, a few
//! generations kept). Stderr only shows warnings unless verbose, so command
//! output on stdout stays machine-readable. `RUST_LOG` overrides both
//! filters.

mod rotate;

pub use rotate::RotatingFile;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str =
    "shellctl=info,shellctl_clients=info,shellctl_executor=info,shellctl_logging=info";
const QUIET_CONSOLE_FILTER: &str = "warn";

/// Rotated generations kept next to the live file.
const KEEP_GENERATIONS: usize = 4;
const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

pub struct LogConfig<'a> {
    /// Names the log file.
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only.
    pub verbose: bool,
    /// Defaults to `<home>/logs`.
    pub log_dir: Option<PathBuf>,
}

fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = config
        .log_dir
        .unwrap_or_else(shellctl_protocol::paths::default_logs_dir);
    let log_file = RotatingFile::open(&log_dir, config.app_name, KEEP_GENERATIONS, MAX_FILE_BYTES)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;

    let console_filter = if config.verbose {
        filter(DEFAULT_FILTER)
    } else {
        EnvFilter::new(QUIET_CONSOLE_FILTER)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_filter(filter(DEFAULT_FILTER)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(dir = %log_dir.display(), "Logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_logging_writes_to_log_dir() {
        let tmp = TempDir::new().unwrap();
        init_logging(LogConfig {
            app_name: "shellctl",
            verbose: false,
            log_dir: Some(tmp.path().to_path_buf()),
        })
        .unwrap();

        tracing::warn!(target: "shellctl", "lock table missing");
        let contents = std::fs::read_to_string(tmp.path().join("shellctl.log")).unwrap();
        assert!(contents.contains("lock table missing"));

        let again = init_logging(LogConfig {
            app_name: "shellctl",
            verbose: false,
            log_dir: Some(tmp.path().to_path_buf()),
        });
        assert!(again.is_err());
    }
}
