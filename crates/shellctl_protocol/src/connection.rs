//! Connection descriptors for a single database instance.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised when a connection descriptor is assembled from loose parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("Both a TCP address and a socket were given; choose one addressing mode")]
    AmbiguousAddress,

    #[error("No address given; supply host and port, or a socket")]
    MissingAddress,

    #[error("Incomplete TCP address: host and port must be given together")]
    IncompleteTcpAddress,
}

/// How to reach the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Tcp { host: String, port: u16 },
    Socket(PathBuf),
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp { host, port } => write!(f, "{}:{}", host, port),
            Address::Socket(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Immutable description of how to authenticate against one instance.
///
/// The password is kept behind [`SecretString`] so `Debug` output and
/// accidental formatting never reveal it.
#[derive(Clone)]
pub struct ConnectionDetails {
    username: String,
    password: SecretString,
    address: Address,
}

impl ConnectionDetails {
    /// Build from optional addressing parts, as they arrive from a config
    /// file or command line. Exactly one of {host+port, socket} must be set.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: Option<String>,
        port: Option<u16>,
        socket: Option<PathBuf>,
    ) -> Result<Self, ConnectionError> {
        let address = match (host, port, socket) {
            (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => {
                return Err(ConnectionError::AmbiguousAddress)
            }
            (Some(host), Some(port), None) => Address::Tcp { host, port },
            (None, None, Some(socket)) => Address::Socket(socket),
            (None, None, None) => return Err(ConnectionError::MissingAddress),
            (Some(_), None, None) | (None, Some(_), None) => {
                return Err(ConnectionError::IncompleteTcpAddress)
            }
        };

        Ok(Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            address,
        })
    }

    pub fn tcp(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            address: Address::Tcp {
                host: host.into(),
                port,
            },
        }
    }

    pub fn socket(
        username: impl Into<String>,
        password: impl Into<String>,
        socket: impl Into<PathBuf>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            address: Address::Socket(socket.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn host(&self) -> Option<&str> {
        match &self.address {
            Address::Tcp { host, .. } => Some(host),
            Address::Socket(_) => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match &self.address {
            Address::Tcp { port, .. } => Some(*port),
            Address::Socket(_) => None,
        }
    }

    pub fn socket_path(&self) -> Option<&Path> {
        match &self.address {
            Address::Socket(path) => Some(path),
            Address::Tcp { .. } => None,
        }
    }

    /// Plain-text password. Only the process input channel should call this.
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for ConnectionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDetails")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("address", &self.address)
            .finish()
    }
}
