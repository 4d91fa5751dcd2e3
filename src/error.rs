//! Error types shared across the gateway, controller, and offline queue.
//!
//! Field-level validation errors never reach this module: they stay inside
//! the form engine (see `form`). Everything here describes a remote call
//! that failed.

use std::fmt;

/// Well-known error codes produced by gateway implementations.
pub mod codes {
    /// Remote reports no record with the requested id.
    pub const NOT_FOUND: &str = "not_found";
    /// The request exceeded the configured timeout.
    pub const TIMEOUT: &str = "timeout";
    /// Connection-level failure (DNS, refused, reset).
    pub const NETWORK: &str = "network";
    /// Response body could not be decoded.
    pub const DECODE: &str = "decode";
}

/// Structured failure returned by every remote operation.
///
/// Gateway implementations normalize whatever their transport produces
/// (HTTP statuses, connection errors, backend error payloads) into this one
/// shape; callers branch on `code`, display `message`, and attach `details`
/// to logs.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteError {
    pub message: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Attach a backend-provided detail payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Shorthand for the "no such record" failure on update/delete.
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::new(
            format!("No record '{}' in collection '{}'", id, collection),
            codes::NOT_FOUND,
        )
    }

    /// True when the remote reported the target record does not exist.
    pub fn is_not_found(&self) -> bool {
        self.code == codes::NOT_FOUND
    }
}

// Display stays short; details land in logs via Debug, not in user-facing text.
impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err = RemoteError::not_found("patients", "7");
        assert!(err.is_not_found());
        assert!(err.message.contains("patients"));

        let err = RemoteError::new("boom", codes::NETWORK);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_display_includes_code() {
        let err = RemoteError::new("duplicate key", "409");
        assert_eq!(err.to_string(), "[409] duplicate key");
    }
}
