//! Connection settings shared by every subcommand.
//!
//! Priority, highest first: command-line flags (and their `SHELLCTL_*`
//! environment fallbacks), `config.toml`, built-in defaults. The password
//! only ever comes from `--password`, `SHELLCTL_PASSWORD` or stdin.

use anyhow::{bail, Context, Result};
use clap::Args;
use shellctl_executor::LocalExecutor;
use shellctl_protocol::paths::default_config_path;
use shellctl_protocol::{ConnectionDetails, ShellctlConfig};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Management shell binary (bare names are looked up on PATH)
    #[arg(long, global = true, env = "SHELLCTL_SHELL_PATH")]
    pub shell_path: Option<PathBuf>,

    /// Server host; requires --port
    #[arg(long, global = true, env = "SHELLCTL_HOST")]
    pub host: Option<String>,

    /// Server port; requires --host
    #[arg(long, global = true, env = "SHELLCTL_PORT")]
    pub port: Option<u16>,

    /// Server socket file, instead of host and port
    #[arg(long, global = true, env = "SHELLCTL_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Account to authenticate as
    #[arg(short = 'u', long, global = true, env = "SHELLCTL_USER")]
    pub user: Option<String>,

    /// Account password. Prefer SHELLCTL_PASSWORD or --password-stdin; flags show up in `ps`.
    #[arg(long, global = true, env = "SHELLCTL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long, global = true)]
    pub password_stdin: bool,

    /// Per-call timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Config file [default: ~/.shellctl/config.toml]
    #[arg(long, global = true, env = "SHELLCTL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Everything a subcommand needs to reach one instance.
#[derive(Debug)]
pub struct Session {
    pub config: ShellctlConfig,
    pub connection: ConnectionDetails,
    pub shell_path: PathBuf,
    pub timeout: Duration,
}

impl Session {
    pub fn executor(&self) -> LocalExecutor {
        LocalExecutor::new(self.connection.clone(), self.shell_path.clone())
    }
}

impl ConnectionArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }

    pub fn load_config(&self) -> Result<ShellctlConfig> {
        let path = self.config_path();
        ShellctlConfig::load(&path)
            .with_context(|| format!("Failed to load config file {}", path.display()))
    }

    /// Apply the flags on top of `config`.
    ///
    /// Any addressing flag replaces the file's addressing as a whole, so a
    /// `--socket` on the command line is never combined with a `host` from
    /// the file.
    pub fn merge(&self, mut config: ShellctlConfig) -> ShellctlConfig {
        if let Some(path) = &self.shell_path {
            config.shell.path = path.clone();
        }
        if let Some(timeout) = self.timeout {
            config.shell.timeout_seconds = timeout;
        }
        if self.host.is_some() || self.port.is_some() || self.socket.is_some() {
            config.connection.host = self.host.clone();
            config.connection.port = self.port;
            config.connection.socket = self.socket.clone();
        }
        if let Some(user) = &self.user {
            config.connection.username = Some(user.clone());
        }
        config
    }

    pub fn read_password(&self) -> Result<String> {
        if self.password_stdin {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            let password = line.trim_end_matches(['\r', '\n']);
            if password.is_empty() {
                bail!("Empty password on stdin");
            }
            return Ok(password.to_string());
        }
        match &self.password {
            Some(password) => Ok(password.clone()),
            None => bail!("No password given; set SHELLCTL_PASSWORD or pass --password-stdin"),
        }
    }

    pub fn session(&self) -> Result<Session> {
        let config = self.merge(self.load_config()?);
        let password = self.read_password()?;
        session_from(config, password)
    }
}

pub fn session_from(config: ShellctlConfig, password: String) -> Result<Session> {
    let conn = &config.connection;
    let username = conn
        .username
        .clone()
        .context("No user given; pass --user or set `username` under [connection]")?;
    let connection = ConnectionDetails::new(
        username,
        password,
        conn.host.clone(),
        conn.port,
        conn.socket.clone(),
    )
    .context("Invalid connection settings")?;

    Ok(Session {
        shell_path: config.shell.path.clone(),
        timeout: config.shell.timeout(),
        connection,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellctl_protocol::Address;

    fn file_config() -> ShellctlConfig {
        ShellctlConfig::parse(
            r#"
[shell]
path = "/snap/bin/mysqlsh"
timeout_seconds = 30

[connection]
host = "10.0.0.5"
port = 3306
username = "clusteradmin"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_file_values_used_without_flags() {
        let session = session_from(file_config(), "pw".to_string()).unwrap();
        assert_eq!(session.shell_path, PathBuf::from("/snap/bin/mysqlsh"));
        assert_eq!(session.timeout, Duration::from_secs(30));
        assert_eq!(session.connection.username(), "clusteradmin");
        assert_eq!(session.connection.host(), Some("10.0.0.5"));
    }

    #[test]
    fn test_socket_flag_replaces_file_address() {
        let args = ConnectionArgs {
            socket: Some(PathBuf::from("/run/mysqld/mysqld.sock")),
            user: Some("root".to_string()),
            timeout: Some(5),
            ..Default::default()
        };
        let config = args.merge(file_config());
        let session = session_from(config, "pw".to_string()).unwrap();

        assert_eq!(
            session.connection.address(),
            &Address::Socket(PathBuf::from("/run/mysqld/mysqld.sock"))
        );
        assert_eq!(session.connection.username(), "root");
        assert_eq!(session.timeout, Duration::from_secs(5));
        assert_eq!(session.shell_path, PathBuf::from("/snap/bin/mysqlsh"));
    }

    #[test]
    fn test_host_flag_without_port_is_rejected() {
        let args = ConnectionArgs {
            host: Some("db.internal".to_string()),
            ..Default::default()
        };
        let err = session_from(args.merge(file_config()), "pw".to_string()).unwrap_err();
        assert!(format!("{:?}", err).contains("host and port must be given together"));
    }

    #[test]
    fn test_missing_user_and_address() {
        let err = session_from(ShellctlConfig::default(), "pw".to_string()).unwrap_err();
        assert!(err.to_string().contains("No user given"));

        let mut config = ShellctlConfig::default();
        config.connection.username = Some("root".to_string());
        let err = session_from(config, "pw".to_string()).unwrap_err();
        assert!(format!("{:?}", err).contains("No address given"));
    }

    #[test]
    fn test_password_flag_and_missing_password() {
        let args = ConnectionArgs {
            password: Some("s3cret".to_string()),
            ..Default::default()
        };
        assert_eq!(args.read_password().unwrap(), "s3cret");

        let err = ConnectionArgs::default().read_password().unwrap_err();
        assert!(err.to_string().contains("SHELLCTL_PASSWORD"));
    }

    #[test]
    fn test_session_debug_hides_password() {
        let session = session_from(file_config(), "hunter2-secret".to_string()).unwrap();
        assert!(!format!("{:?}", session).contains("hunter2-secret"));
    }
}
