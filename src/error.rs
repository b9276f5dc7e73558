// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::identity::IdentityError;
use crate::store::{FactoryError, StoreError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::not_found("Record not found"),
            StoreError::Api { status, code, message } => {
                tracing::error!(status = status, code = %code, "store error: {}", message);
                ApiError::bad_gateway(format!("store error ({}): {}", code, message))
            }
            StoreError::Unreachable(msg) => {
                tracing::error!("store unreachable: {}", msg);
                ApiError::service_unavailable("Store temporarily unavailable")
            }
            StoreError::Request(e) => {
                tracing::error!("store request failed: {}", e);
                ApiError::service_unavailable("Store temporarily unavailable")
            }
            StoreError::Parse(msg) => {
                tracing::error!("store response parse error: {}", msg);
                ApiError::internal_server_error("Unexpected response from the store")
            }
            StoreError::InvalidUrl(msg) => {
                tracing::error!("store client misconfigured: {}", msg);
                ApiError::internal_server_error("Store client misconfigured")
            }
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Api { status, message } => {
                tracing::error!(status = status, "identity provider error: {}", message);
                ApiError::bad_gateway("Identity provider error")
            }
            IdentityError::Unreachable(msg) => {
                tracing::error!("identity provider unreachable: {}", msg);
                ApiError::bad_gateway("Identity provider unavailable")
            }
            IdentityError::Request(e) => {
                tracing::error!("identity provider request failed: {}", e);
                ApiError::bad_gateway("Identity provider unavailable")
            }
            IdentityError::Parse(msg) => {
                tracing::error!("identity provider parse error: {}", msg);
                ApiError::internal_server_error("Unexpected response from the identity provider")
            }
        }
    }
}

impl From<FactoryError> for ApiError {
    fn from(err: FactoryError) -> Self {
        match err {
            FactoryError::Identity(e) => e.into(),
            FactoryError::Store(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
