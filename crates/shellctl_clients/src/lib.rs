//! High-level clients over the execution protocol.
//!
//! [`MySQLInstanceClient`] issues SQL against one instance,
//! [`MySQLClusterClient`] drives the AdminAPI through scripts, and
//! [`TaskLocker`] serialises cluster-wide operations across agents.

pub mod cluster;
pub mod error;
pub mod instance;
pub mod lock;

pub use cluster::MySQLClusterClient;
pub use error::ClientError;
pub use instance::MySQLInstanceClient;
pub use lock::{RetryPolicy, TaskLocker};
