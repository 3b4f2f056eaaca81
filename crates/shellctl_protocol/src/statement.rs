//! Enums that parameterise generated statements.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server log families accepted by `FLUSH ... LOGS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Binary,
    Engine,
    Error,
    General,
    Relay,
    Slow,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Engine => "ENGINE",
            Self::Error => "ERROR",
            Self::General => "GENERAL",
            Self::Relay => "RELAY",
            Self::Slow => "SLOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BINARY" => Some(Self::Binary),
            "ENGINE" => Some(Self::Engine),
            "ERROR" => Some(Self::Error),
            "GENERAL" => Some(Self::General),
            "RELAY" => Some(Self::Relay),
            "SLOW" => Some(Self::Slow),
            _ => None,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scope of a system variable read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableScope {
    Global,
    Session,
    Persist,
    PersistOnly,
}

impl VariableScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::Session => "SESSION",
            Self::Persist => "PERSIST",
            Self::PersistOnly => "PERSIST_ONLY",
        }
    }

    /// Scope to read a variable back from. Persisted values are only
    /// observable through the global scope.
    pub fn readable(&self) -> Self {
        match self {
            Self::Session => Self::Session,
            Self::Global | Self::Persist | Self::PersistOnly => Self::Global,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "GLOBAL" => Some(Self::Global),
            "SESSION" => Some(Self::Session),
            "PERSIST" => Some(Self::Persist),
            "PERSIST_ONLY" => Some(Self::PersistOnly),
            _ => None,
        }
    }
}

impl fmt::Display for VariableScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value assigned to a system variable. Integers and booleans are rendered
/// bare, text goes through value quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl From<i64> for VariableValue {
    fn from(v: i64) -> Self {
        VariableValue::Integer(v)
    }
}

impl From<i32> for VariableValue {
    fn from(v: i32) -> Self {
        VariableValue::Integer(v as i64)
    }
}

impl From<bool> for VariableValue {
    fn from(v: bool) -> Self {
        VariableValue::Boolean(v)
    }
}

impl From<&str> for VariableValue {
    fn from(v: &str) -> Self {
        VariableValue::Text(v.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(v: String) -> Self {
        VariableValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_type_parse_is_case_insensitive() {
        assert_eq!(LogType::parse("general"), Some(LogType::General));
        assert_eq!(LogType::parse("SLOW"), Some(LogType::Slow));
        assert_eq!(LogType::parse("audit"), None);
    }

    #[test]
    fn test_variable_scope_parse_and_readable() {
        assert_eq!(VariableScope::parse("persist-only"), Some(VariableScope::PersistOnly));
        assert_eq!(VariableScope::PersistOnly.as_str(), "PERSIST_ONLY");
        assert_eq!(VariableScope::Persist.readable(), VariableScope::Global);
        assert_eq!(VariableScope::Session.readable(), VariableScope::Session);
    }
}
