//! API Error Handling
//!
//! Structured error responses with HTTP status codes and request tracking.

use crate::errors::{GrindError, SessionError, StorageError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level API error response with request tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

/// Error body with structured information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code (INVALID_INPUT, NON_MULTIPLE_BET, NO_ACTIVE_SESSION, ...)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error with request tracking
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub request_id: String,
}

#[derive(Debug)]
pub enum ApiErrorKind {
    /// Rejected by session rules; status derives from the error
    Session(SessionError),
    ServiceUnavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn session(request_id: String, error: SessionError) -> Self {
        Self {
            kind: ApiErrorKind::Session(error),
            request_id,
        }
    }

    pub fn service_unavailable(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::ServiceUnavailable(message),
            request_id,
        }
    }

    pub fn internal_error(request_id: String, message: String) -> Self {
        Self {
            kind: ApiErrorKind::InternalError(message),
            request_id,
        }
    }

    pub fn from_grind(request_id: String, error: GrindError) -> Self {
        match error {
            GrindError::Session(e) => Self::session(request_id, e),
            GrindError::Storage(StorageError::WriteFailed(msg)) => Self::service_unavailable(request_id, msg),
            other => Self::internal_error(request_id, other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.kind {
            ApiErrorKind::Session(SessionError::NoActiveSession) => StatusCode::NOT_FOUND,
            ApiErrorKind::Session(_) => StatusCode::BAD_REQUEST,
            ApiErrorKind::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorKind::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ApiErrorKind::Session(e) => write!(f, "[{}] {}", self.request_id, e),
            ApiErrorKind::ServiceUnavailable(msg) => write!(f, "[{}] Service Unavailable: {}", self.request_id, msg),
            ApiErrorKind::InternalError(msg) => write!(f, "[{}] Internal Error: {}", self.request_id, msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match &self.kind {
            ApiErrorKind::Session(e) => {
                let details = match e {
                    SessionError::NonMultipleBet { base_bet, .. } => {
                        Some(serde_json::json!({ "base_bet": base_bet.to_string() }))
                    }
                    SessionError::InsufficientBankroll { bankroll, .. } => {
                        Some(serde_json::json!({ "bankroll": bankroll.to_string() }))
                    }
                    SessionError::InvalidInput { field, .. } => Some(serde_json::json!({ "field": field })),
                    SessionError::NoActiveSession => None,
                };
                (e.code(), e.to_string(), details)
            }
            ApiErrorKind::ServiceUnavailable(msg) => ("SERVICE_UNAVAILABLE", msg.clone(), None),
            ApiErrorKind::InternalError(msg) => ("INTERNAL_ERROR", msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            request_id: self.request_id.clone(),
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_mapping() {
        let err = ApiError::session("r1".to_string(), SessionError::NoActiveSession);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::session(
            "r2".to_string(),
            SessionError::NonMultipleBet {
                bet: dec!(15),
                base_bet: dec!(10),
            },
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from_grind(
            "r3".to_string(),
            StorageError::WriteFailed("session limit of 1 reached".to_string()).into(),
        );
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_display_carries_request_id() {
        let err = ApiError::internal_error("abc".to_string(), "boom".to_string());
        assert_eq!(err.to_string(), "[abc] Internal Error: boom");
    }
}
