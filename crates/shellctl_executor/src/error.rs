//! Error type for the execution protocol.

use std::time::Duration;
use thiserror::Error;

/// Failure of one management shell invocation.
///
/// Carries text only: there is no `source()` chain, so nothing captured from
/// the child process or the OS can surface through error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The shell exited non-zero. `message` is the shell-reported error text,
    /// or `None` when the output held no well-formed error payload (bad
    /// credentials, unreachable host, malformed output). `None` means only
    /// "an error occurred"; callers must not branch on its rendering.
    #[error("Management shell failed: {}", .message.as_deref().unwrap_or("None"))]
    Failed { message: Option<String> },

    /// The shell did not finish within the budget and was killed.
    #[error("Management shell timed out after {}s", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    /// The shell could not be spawned or waited on.
    #[error("Management shell could not run: {reason}")]
    Process { reason: String },
}

impl ExecutionError {
    pub fn failed(message: Option<String>) -> Self {
        Self::Failed { message }
    }

    pub fn process(reason: impl Into<String>) -> Self {
        Self::Process {
            reason: reason.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Shell-reported message, when one was extracted.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => message.as_deref(),
            Self::TimedOut { .. } | Self::Process { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_failed_renders_message() {
        let err = ExecutionError::failed(Some("You have an error in your SQL syntax".into()));
        assert_eq!(
            err.to_string(),
            "Management shell failed: You have an error in your SQL syntax"
        );
        assert_eq!(err.message(), Some("You have an error in your SQL syntax"));
    }

    #[test]
    fn test_failed_without_message_renders_absence_marker() {
        let err = ExecutionError::failed(None);
        assert_eq!(err.to_string(), "Management shell failed: None");
        assert!(err.message().is_none());
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        let timeout = ExecutionError::TimedOut {
            timeout: Duration::from_secs(10),
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.to_string(), "Management shell timed out after 10s");
        assert!(!ExecutionError::failed(None).is_timeout());
    }

    #[test]
    fn test_no_source_chain() {
        let errors = [
            ExecutionError::failed(Some("boom".into())),
            ExecutionError::failed(None),
            ExecutionError::TimedOut {
                timeout: Duration::from_secs(1),
            },
            ExecutionError::process("not found"),
        ];
        for err in errors {
            assert!(err.source().is_none());
        }
    }
}
