//! Error types for the hosted-store client.

use serde::Deserialize;
use thiserror::Error;

/// Error code the store uses for "a single object was requested but zero
/// rows matched". Distinguished from real failures: it drives the create
/// branch of the reconciliation flow.
pub(crate) const NO_ROWS_CODE: &str = "PGRST116";

/// SQLSTATE for a unique-constraint violation, as surfaced in the store's
/// error body when two inserts race on the same key.
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Errors that can occur when talking to the hosted store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Store is offline or unreachable
    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// Store returned an error response
    #[error("Store error ({status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Single-object request matched no rows. Expected during the first
    /// visit of a new actor; not a failure.
    #[error("No matching row")]
    NotFound,

    /// Invalid store URL
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse store response
    #[error("Failed to parse store response: {0}")]
    Parse(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    /// True when the store rejected an insert because a row with the same
    /// unique key already exists.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Api { status, code, .. } => code == UNIQUE_VIOLATION_CODE || *status == 409,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Decode a non-success response body in the store's error format,
/// translating the no-rows code into the distinguished [`StoreError::NotFound`].
pub(crate) fn decode_error_body(status: u16, body: &str) -> StoreError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_default();

    if code == NO_ROWS_CODE {
        return StoreError::NotFound;
    }

    let message = parsed
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error detail provided".to_string()
            } else {
                trimmed.to_string()
            }
        });

    StoreError::Api {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_code_is_not_found() {
        let err = decode_error_body(
            406,
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned","details":"Results contain 0 rows","hint":null}"#,
        );
        assert!(err.is_not_found());
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn unique_violation_is_detected_by_code_and_status() {
        let by_code = decode_error_body(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint \"users_clerk_id_key\""}"#,
        );
        assert!(by_code.is_unique_violation());

        let by_status = decode_error_body(409, "conflict");
        assert!(by_status.is_unique_violation());

        let other = decode_error_body(500, r#"{"message":"boom"}"#);
        assert!(!other.is_unique_violation());
        assert!(!other.is_not_found());
    }

    #[test]
    fn unparseable_body_keeps_raw_text_as_message() {
        match decode_error_body(502, "upstream exploded") {
            StoreError::Api { status, code, message } => {
                assert_eq!(status, 502);
                assert!(code.is_empty());
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
