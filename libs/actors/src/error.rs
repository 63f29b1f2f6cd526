//! Payload Access Error Types
//!
//! The runtime swallows and logs failures at the actor/loop boundary to keep
//! the loop live; payload access is the one place an error reaches caller
//! code, because payload shape is the one contract the runtime cannot verify
//! itself.

use thiserror::Error;

/// Failure reading a typed value out of a message payload
#[derive(Error, Debug)]
pub enum PayloadError {
    /// The requested key is not present in the payload
    #[error("payload key not found: {key}")]
    MissingKey { key: String },

    /// The key exists but its value does not deserialize to the requested type
    #[error("payload type mismatch for key '{key}': expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for payload operations
pub type Result<T> = std::result::Result<T, PayloadError>;

impl PayloadError {
    /// Create a missing-key error
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(
        key: impl Into<String>,
        expected: &'static str,
        source: serde_json::Error,
    ) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected,
            source,
        }
    }

    /// True when the failure is an absent key rather than a bad type
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PayloadError::missing_key("count");
        assert_eq!(err.to_string(), "payload key not found: count");
        assert!(err.is_missing_key());
    }

    #[test]
    fn test_type_mismatch_display() {
        let source = serde_json::from_value::<u64>(serde_json::json!("nope")).unwrap_err();
        let err = PayloadError::type_mismatch("count", "u64", source);
        assert!(err.to_string().contains("count"));
        assert!(err.to_string().contains("u64"));
        assert!(!err.is_missing_key());
    }
}
