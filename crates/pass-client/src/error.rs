//! Error types for the PASS client
//!
//! Only an HTTP 404 on a read is translated into a value (`None` or an empty
//! page). Everything else surfaces here and is never retried.

use crate::model::{EntityType, TypeMismatch};
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, PassClientError>;

/// Error type for client operations
#[derive(Error, Debug)]
pub enum PassClientError {
    /// The repository answered with a non-success status
    #[error("{method} {url} failed with status {status}: {body}")]
    RequestFailed {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body is not a usable JSON:API document
    #[error("Malformed JSON:API response: {0}")]
    MalformedResponse(String),

    /// A relationship target could not be linked into its field
    #[error("Relationship '{relationship}' expects '{expected}' targets but got '{found}'")]
    RelationshipTypeMismatch {
        relationship: String,
        expected: String,
        found: String,
    },

    /// A call precondition was violated
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An entity could not be serialized
    #[error("Failed to encode entity: {0}")]
    Encode(#[source] serde_json::Error),

    /// Transport failure (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Config(#[from] pass_common::CommonError),
}

impl PassClientError {
    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Wrap a failed relationship link
    pub fn type_mismatch(relationship: &str, mismatch: TypeMismatch) -> Self {
        Self::RelationshipTypeMismatch {
            relationship: relationship.to_string(),
            expected: mismatch.expected.to_string(),
            found: mismatch.found.to_string(),
        }
    }

    /// A linkage on the wire names a different type than the relationship declares
    pub(crate) fn wire_type_mismatch(relationship: &str, expected: EntityType, found: &str) -> Self {
        Self::RelationshipTypeMismatch {
            relationship: relationship.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// HTTP status of a failed request, if that is what this error is
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PassClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_message() {
        let err = PassClientError::RequestFailed {
            method: "GET".to_string(),
            url: "http://localhost:8080/data/grant/1".to_string(),
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "GET http://localhost:8080/data/grant/1 failed with status 500: boom"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let err = PassClientError::type_mismatch(
            "pi",
            TypeMismatch { expected: EntityType::User, found: EntityType::Funder },
        );
        let msg = err.to_string();
        assert!(msg.contains("'pi'"));
        assert!(msg.contains("'user'"));
        assert!(msg.contains("'funder'"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_json_error_is_malformed_response() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = PassClientError::from(json_err);
        assert!(matches!(err, PassClientError::MalformedResponse(_)));
    }
}
