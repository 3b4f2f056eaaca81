//! Database principals.

use crate::defaults::DEFAULT_ACCOUNT_HOST;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A role: a locked account used only to carry privileges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub host: String,
}

impl Role {
    /// Role reachable from any host (`%`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: DEFAULT_ACCOUNT_HOST.to_string(),
        }
    }

    pub fn with_host(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
        }
    }
}

/// A login account plus free-form attributes stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: DEFAULT_ACCOUNT_HOST.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_host(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attributes as the JSON object text MySQL stores in `ATTRIBUTE`.
    pub fn serialize_attrs(&self) -> String {
        // A string-keyed map of strings always serializes.
        serde_json::to_string(&self.attributes).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_empty_attrs() {
        let user = User::with_host("test", "localhost");
        assert_eq!(user.serialize_attrs(), "{}");
    }

    #[test]
    fn test_serialize_filled_attrs() {
        let user = User::with_host("test", "localhost").with_attribute("attribute", "example");
        assert_eq!(user.serialize_attrs(), r#"{"attribute":"example"}"#);
    }

    #[test]
    fn test_default_host_is_wildcard() {
        assert_eq!(Role::new("reader").host, "%");
        assert_eq!(User::new("app").host, "%");
    }
}
