//! Shared data model for shellctl.
//!
//! Everything the executor, the statement builders and the clients agree on
//! lives here: how to reach an instance, the account shapes, the enums that
//! parameterise statements, the status labels the management shell reports,
//! and the on-disk configuration.

pub mod account;
pub mod config;
pub mod connection;
pub mod defaults;
pub mod paths;
pub mod statement;
pub mod status;

pub use account::{Role, User};
pub use config::{ConfigError, ShellctlConfig};
pub use connection::{Address, ConnectionDetails, ConnectionError};
pub use statement::{LogType, VariableScope, VariableValue};
pub use status::{ClusterSetStatus, ClusterStatus, InstanceRole, InstanceStatus};
