//! Execution protocol for the MySQL management shell.
//!
//! An [`Executor`] runs a Python script or a SQL statement against one
//! instance and returns the script's printed output or the statement's rows.
//! [`LocalExecutor`] is the subprocess transport; other transports (a remote
//! agent, a long-lived session) implement the same trait.

pub mod error;
pub mod local;
pub mod output;

pub use error::ExecutionError;
pub use local::LocalExecutor;
pub use output::Row;

use shellctl_protocol::ConnectionDetails;
use std::sync::Arc;
use std::time::Duration;

/// Budget used by [`Executor::check_connection`] and by callers that have
/// no configured timeout.
pub const DEFAULT_TIMEOUT: Duration =
    Duration::from_secs(shellctl_protocol::defaults::DEFAULT_TIMEOUT_SECS);

/// Runs code against one instance. Every call is one round trip with no
/// retries; failures are surfaced to the caller as-is.
pub trait Executor: Send + Sync {
    fn connection_details(&self) -> &ConnectionDetails;

    /// Verify the credentials authenticate against the target.
    fn check_connection(&self) -> Result<(), ExecutionError>;

    /// Run a script in the shell's Python mode; returns its printed output,
    /// trimmed.
    fn execute_script(&self, code: &str, timeout: Duration) -> Result<String, ExecutionError>;

    /// Run a SQL statement; returns the rows of its result set, column names
    /// as the server reports them.
    fn execute_sql(&self, statement: &str, timeout: Duration) -> Result<Vec<Row>, ExecutionError>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn connection_details(&self) -> &ConnectionDetails {
        (**self).connection_details()
    }

    fn check_connection(&self) -> Result<(), ExecutionError> {
        (**self).check_connection()
    }

    fn execute_script(&self, code: &str, timeout: Duration) -> Result<String, ExecutionError> {
        (**self).execute_script(code, timeout)
    }

    fn execute_sql(&self, statement: &str, timeout: Duration) -> Result<Vec<Row>, ExecutionError> {
        (**self).execute_sql(statement, timeout)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn connection_details(&self) -> &ConnectionDetails {
        (**self).connection_details()
    }

    fn check_connection(&self) -> Result<(), ExecutionError> {
        (**self).check_connection()
    }

    fn execute_script(&self, code: &str, timeout: Duration) -> Result<String, ExecutionError> {
        (**self).execute_script(code, timeout)
    }

    fn execute_sql(&self, statement: &str, timeout: Duration) -> Result<Vec<Row>, ExecutionError> {
        (**self).execute_sql(statement, timeout)
    }
}
