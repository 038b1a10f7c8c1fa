//! Identifier types for flows and executions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical identity of a Flow.
///
/// Server records may carry the identity under `id` or the legacy `_id`;
/// both are folded into this single value when a record is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub String);

impl FlowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FlowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FlowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Canonical identity of an Execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ExecutionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Picks the canonical identity out of a primary and a legacy field.
///
/// The primary field wins when both are present. Numeric identities are
/// stringified; empty strings and any other JSON shape count as absent.
pub(crate) fn canonical_identity(primary: Option<&Value>, legacy: Option<&Value>) -> Option<String> {
    fn as_identity(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    primary.and_then(as_identity).or_else(|| legacy.and_then(as_identity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_identity_wins() {
        let id = canonical_identity(Some(&json!("abc")), Some(&json!("legacy")));
        assert_eq!(id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_legacy_identity_fallback() {
        assert_eq!(canonical_identity(None, Some(&json!("64f0"))).as_deref(), Some("64f0"));
        assert_eq!(canonical_identity(Some(&json!("")), Some(&json!("64f0"))).as_deref(), Some("64f0"));
        assert_eq!(canonical_identity(Some(&Value::Null), Some(&json!(7))).as_deref(), Some("7"));
    }

    #[test]
    fn test_missing_identity() {
        assert!(canonical_identity(None, None).is_none());
        assert!(canonical_identity(Some(&json!({"nested": 1})), None).is_none());
    }
}
