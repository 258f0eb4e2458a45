//! API error taxonomy
//!
//! Every request the client issues resolves to either a typed value or
//! an [`ApiError`]. The variants mirror how the backend reports
//! failures: transport problems, expired authentication, rate limits,
//! server faults, and field-keyed validation maps on 400 responses.

use std::collections::BTreeMap;
use std::fmt;

/// Field-keyed validation messages, as returned by the backend on
/// malformed registration or job submissions (`{"field": ["msg", ...]}`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for a single field, if any
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    /// Iterate over (field, messages) pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Parse a JSON body of the shape `{"field": ["msg"] | "msg"}`.
    ///
    /// Returns None when the body is not a field map (e.g. a bare
    /// `{"detail": ...}` is still a field map; a string or array is not).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.is_empty() {
            return None;
        }
        let mut errors = Self::new();
        for (field, messages) in map {
            match messages {
                serde_json::Value::String(msg) => errors.add(field, msg),
                serde_json::Value::Array(items) => {
                    for item in items {
                        if let Some(msg) = item.as_str() {
                            errors.add(field, msg);
                        }
                    }
                }
                other => errors.add(field, other.to_string()),
            }
        }
        Some(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(", "))?;
            first = false;
        }
        Ok(())
    }
}

/// Errors produced by the API client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, DNS, offline)
    #[error("network error: {0}")]
    Network(String),

    /// 401 that survived the single refresh-and-retry attempt
    #[error("authentication required")]
    Unauthorized,

    /// 429 from the backend or the Gmail API behind it
    #[error("rate limited, try again later")]
    RateLimited,

    /// 5xx from the backend
    #[error("server error (status {0})")]
    Server(u16),

    /// 400 with a field-keyed error map
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Any other non-success status
    #[error("request failed (status {status}): {message}")]
    Http { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    Decode(String),

    /// Local credential storage could not be read or written
    #[error("credential storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Whether a manual retry of the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::RateLimited | ApiError::Server(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_from_field_map() {
        let body = json!({
            "username": ["A user with that username already exists."],
            "password": ["This password is too short.", "This password is too common."]
        });
        let errors = ValidationErrors::from_json(&body).unwrap();
        assert_eq!(errors.field("username").unwrap().len(), 1);
        assert_eq!(errors.field("password").unwrap().len(), 2);
        assert!(errors.field("email").is_none());
    }

    #[test]
    fn test_validation_from_string_values() {
        let body = json!({"detail": "Passwords don't match"});
        let errors = ValidationErrors::from_json(&body).unwrap();
        assert_eq!(errors.field("detail").unwrap(), ["Passwords don't match"]);
    }

    #[test]
    fn test_validation_rejects_non_object() {
        assert!(ValidationErrors::from_json(&json!("nope")).is_none());
        assert!(ValidationErrors::from_json(&json!(["nope"])).is_none());
        assert!(ValidationErrors::from_json(&json!({})).is_none());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Network("offline".into()).is_transient());
        assert!(ApiError::RateLimited.is_transient());
        assert!(ApiError::Server(502).is_transient());
        assert!(!ApiError::Unauthorized.is_transient());
        assert!(!ApiError::Validation(ValidationErrors::new()).is_transient());
    }
}
