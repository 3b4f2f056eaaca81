//! Settings for tests against a real server and shell.

use shellctl_executor::LocalExecutor;
use shellctl_protocol::ConnectionDetails;
use std::path::PathBuf;

/// Connection settings read from the environment.
#[derive(Debug, Clone)]
pub struct LiveShellConfig {
    /// `MYSQL_SHELL_PATH`
    pub shell_path: PathBuf,
    /// `MYSQL_USERNAME`
    pub username: String,
    /// `MYSQL_PASSWORD`
    pub password: String,
    /// `MYSQL_HOST` (defaults to 127.0.0.1)
    pub host: String,
    /// `MYSQL_PORT` (defaults to 3306)
    pub port: u16,
}

impl LiveShellConfig {
    /// `None` unless shell path, username and password are all set.
    pub fn from_env() -> Option<Self> {
        let shell_path = std::env::var_os("MYSQL_SHELL_PATH")?;
        let username = std::env::var("MYSQL_USERNAME").ok()?;
        let password = std::env::var("MYSQL_PASSWORD").ok()?;
        let host = std::env::var("MYSQL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("MYSQL_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3306);

        Some(Self {
            shell_path: PathBuf::from(shell_path),
            username,
            password,
            host,
            port,
        })
    }

    pub fn connection(&self) -> ConnectionDetails {
        ConnectionDetails::tcp(&self.username, &self.password, &self.host, self.port)
    }

    pub fn executor(&self) -> LocalExecutor {
        LocalExecutor::new(self.connection(), &self.shell_path)
    }

    /// Executor with the right address and a wrong password.
    pub fn executor_with_password(&self, password: &str) -> LocalExecutor {
        LocalExecutor::new(
            ConnectionDetails::tcp(&self.username, password, &self.host, self.port),
            &self.shell_path,
        )
    }
}
