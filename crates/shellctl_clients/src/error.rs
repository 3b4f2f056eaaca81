//! Client error type.

use shellctl_executor::ExecutionError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The shell answered, but not in a shape this client understands.
    #[error("Unexpected management shell output: {0}")]
    UnexpectedOutput(String),

    #[error("Invalid system variable name: {0:?}")]
    InvalidVariableName(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
