//! Error types for zonesync
//!
//! This module defines all error types used throughout the workspace.

use crate::record::RecordId;
use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input, rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Retries exhausted on a transport-level or HTTP-level failure
    #[error("Transient failure after {attempts} attempt(s): {message}")]
    Transient {
        /// Number of attempts made, including the first one
        attempts: u32,
        /// Last failure seen
        message: String,
    },

    /// The provider answered with something that is not an API response
    /// (empty body, HTML, challenge page from an upstream protection layer)
    #[error("Unparseable upstream response (HTTP {status}): {detail}")]
    UnparseableResponse {
        /// HTTP status of the response
        status: u16,
        /// Human-readable description
        detail: String,
    },

    /// The remote rejected a create because an equivalent record exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A structured error answer from the provider API
    #[error("API error (code {code}): {message}")]
    Api {
        /// Code from the response envelope
        code: i64,
        /// Message from the response envelope
        message: String,
    },

    /// An identifier the system cannot address
    #[error("Invalid record identifier {id}: {message}")]
    InvalidIdentifier {
        /// The offending identifier
        id: RecordId,
        /// Context
        message: String,
    },

    /// The remote reported success but returned data that cannot be trusted
    #[error("API contract violation: {0}")]
    ContractViolation(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A failure while reconciling one record, with the record's coordinates
    #[error("{operation} failed for {name} ({record_type}) in zone {zone}{}: {source}", display_id(.id))]
    Record {
        /// Reconciler operation ("create", "read", ...)
        operation: &'static str,
        /// Caller's zone
        zone: String,
        /// Record name
        name: String,
        /// Record type
        record_type: String,
        /// Identifier when known
        id: Option<RecordId>,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn display_id(id: &Option<RecordId>) -> String {
    match id {
        Some(id) => format!(" (ID: {id})"),
        None => String::new(),
    }
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an API error
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Create an unparseable-response error
    pub fn unparseable(status: u16, detail: impl Into<String>) -> Self {
        Self::UnparseableResponse {
            status,
            detail: detail.into(),
        }
    }

    /// Create a contract violation error
    pub fn contract_violation(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Whether the remote directory client should retry after this error
    ///
    /// Only failures that a later attempt could plausibly turn into a
    /// different answer qualify. Structured rejections never do.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transient { .. } | Self::UnparseableResponse { .. } | Self::Io(_)
        )
    }

    /// Whether this error denotes an absent record or zone, looking through
    /// the [`Error::Record`] wrapper
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Record { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// The innermost error, looking through [`Error::Record`] wrappers
    pub fn root(&self) -> &Error {
        match self {
            Self::Record { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_error_names_coordinates_and_cause() {
        let err = Error::Record {
            operation: "delete",
            zone: "example.com".to_string(),
            name: "www".to_string(),
            record_type: "A".to_string(),
            id: Some(RecordId::new(42)),
            source: Box::new(Error::api(500, "database unavailable")),
        };

        let msg = err.to_string();
        assert!(msg.contains("delete failed"));
        assert!(msg.contains("www (A)"));
        assert!(msg.contains("example.com"));
        assert!(msg.contains("ID: 42"));
        assert!(msg.contains("database unavailable"));
    }

    #[test]
    fn record_error_without_id() {
        let err = Error::Record {
            operation: "create",
            zone: "example.com".to_string(),
            name: "www".to_string(),
            record_type: "A".to_string(),
            id: None,
            source: Box::new(Error::conflict("duplicate")),
        };

        assert!(!err.to_string().contains("ID:"));
        assert!(matches!(err.root(), Error::Conflict(_)));
    }

    #[test]
    fn retryable_classes() {
        assert!(
            Error::Transient {
                attempts: 1,
                message: "connection reset".to_string()
            }
            .is_retryable()
        );
        assert!(Error::unparseable(503, "challenge").is_retryable());
        assert!(!Error::api(400, "Invalid zone").is_retryable());
        assert!(!Error::conflict("exists").is_retryable());
        assert!(!Error::not_found("gone").is_retryable());
        assert!(!Error::validation("empty name").is_retryable());
    }

    #[test]
    fn from_anyhow_keeps_message() {
        let err: Error = anyhow::anyhow!("state file is locked").into();
        assert!(matches!(err, Error::Other(ref m) if m == "state file is locked"));
    }
}
