//! Configuration file parsing
//!
//! Reads settings from `~/.shellctl/config.toml`. Every section and key is
//! optional; a missing file yields the defaults. Passwords are never read
//! from this file.

use crate::defaults::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellctlConfig {
    #[serde(default)]
    pub shell: ShellConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub locking: LockingConfig,
}

/// `[shell]`: where the management shell lives and how long it may run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default = "default_shell_path")]
    pub path: PathBuf,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            path: default_shell_path(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ShellConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// `[connection]`: addressing and account, without the password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub socket: Option<PathBuf>,
    pub username: Option<String>,
}

/// `[locking]`: lock table location and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockingConfig {
    #[serde(default = "default_lock_schema")]
    pub schema: String,

    #[serde(default = "default_lock_table")]
    pub table: String,

    /// Identity this agent records as lock holder (e.g. a unit name).
    pub executor_id: Option<String>,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            schema: default_lock_schema(),
            table: default_lock_table(),
            executor_id: None,
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_shell_path() -> PathBuf { PathBuf::from(DEFAULT_SHELL_PATH) }
fn default_timeout_seconds() -> u64 { DEFAULT_TIMEOUT_SECS }
fn default_lock_schema() -> String { DEFAULT_LOCK_SCHEMA.to_string() }
fn default_lock_table() -> String { DEFAULT_LOCK_TABLE.to_string() }
fn default_max_attempts() -> u32 { DEFAULT_LOCK_MAX_ATTEMPTS }
fn default_initial_backoff_ms() -> u64 { DEFAULT_LOCK_INITIAL_BACKOFF_MS }
fn default_max_backoff_ms() -> u64 { DEFAULT_LOCK_MAX_BACKOFF_MS }

impl ShellctlConfig {
    /// Load configuration from a file; a missing file yields defaults.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        Self::parse(&content)
    }

    /// Load configuration from `~/.shellctl/config.toml`.
    pub fn load_default() -> Result<Self> {
        Self::load(&crate::paths::default_config_path())
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ShellctlConfig::default();
        assert_eq!(config.shell.path, PathBuf::from("mysqlsh"));
        assert_eq!(config.shell.timeout(), Duration::from_secs(10));
        assert_eq!(config.locking.schema, "mysql");
        assert_eq!(config.locking.table, "locking");
        assert!(config.connection.host.is_none());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ShellctlConfig::load(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config.shell.timeout_seconds, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_partial_config() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[shell]
path = "/snap/bin/mysqlsh"

[connection]
socket = "/var/run/mysqld/mysqld.sock"
username = "clusteradmin"

[locking]
executor_id = "mysql-1"
max_attempts = 3
"#,
        )
        .unwrap();

        let config = ShellctlConfig::load(&config_path).unwrap();
        assert_eq!(config.shell.path, PathBuf::from("/snap/bin/mysqlsh"));
        assert_eq!(config.shell.timeout_seconds, DEFAULT_TIMEOUT_SECS);
        assert_eq!(
            config.connection.socket,
            Some(PathBuf::from("/var/run/mysqld/mysqld.sock"))
        );
        assert_eq!(config.connection.username.as_deref(), Some("clusteradmin"));
        assert_eq!(config.locking.executor_id.as_deref(), Some("mysql-1"));
        assert_eq!(config.locking.max_attempts, 3);
        assert_eq!(config.locking.table, "locking");
    }

    #[test]
    fn test_rejects_unknown_section() {
        let result = ShellctlConfig::parse("[secrets]\npassword = \"nope\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));

        let result = ShellctlConfig::parse("[connection]\npassword = \"nope\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}
