//! Unified error model
//! Every failure is converted into a structured JSON response at the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Refresh/access token failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Token not found")]
    NotFound,

    #[error("Token is invalid or has a bad signature")]
    InvalidSignature,
}

impl TokenError {
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Expired => "token_expired",
            TokenError::Revoked => "token_revoked",
            TokenError::NotFound => "token_not_found",
            TokenError::InvalidSignature => "token_invalid",
        }
    }
}

tokio::task_local! {
    /// Id of the request being served, set by the tracking middleware
    pub static REQUEST_ID: String;
}

fn current_request_id() -> String {
    REQUEST_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string())
}

/// Per-field validation messages, keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    WeakPassword(String),

    #[error("This {field} is already taken.")]
    Duplicate { field: &'static str },

    /// Same message for unknown user and wrong password
    #[error("Incorrect credentials.")]
    InvalidCredentials,

    #[error("User account is disabled.")]
    AccountDisabled,

    /// Token presented in a request body (refresh flow)
    #[error("{0}")]
    Token(TokenError),

    /// Bearer token rejected by the auth middleware
    #[error("{0}")]
    Unauthenticated(TokenError),

    #[error("Authentication credentials were not provided")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Request body is too large.")]
    PayloadTooLarge,

    #[error("Operation timed out: {0}")]
    Timeout(&'static str),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a single-field validation error
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::WeakPassword(_)
            | AppError::Duplicate { .. }
            | AppError::InvalidCredentials
            | AppError::Token(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Timeout(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> String {
        match self {
            AppError::Validation(_) => "validation_error".to_string(),
            AppError::WeakPassword(_) => "weak_password".to_string(),
            AppError::Duplicate { field } => format!("duplicate_{}", field),
            AppError::InvalidCredentials => "invalid_credentials".to_string(),
            AppError::AccountDisabled => "account_disabled".to_string(),
            AppError::Token(e) | AppError::Unauthenticated(e) => e.kind().to_string(),
            AppError::Unauthorized => "unauthorized".to_string(),
            AppError::NotFound(_) => "not_found".to_string(),
            AppError::PayloadTooLarge => "payload_too_large".to_string(),
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Timeout(_)
            | AppError::Internal(_) => "internal_error".to_string(),
        }
    }

    /// User-facing message (no internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            AppError::Timeout(_) | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value ({})", e.code))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        AppError::Validation(fields)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: u16,
    pub kind: String,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let request_id = current_request_id();

        let fields = match &self {
            AppError::Validation(fields) => Some(fields.clone()),
            _ => None,
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                kind: self.kind(),
                message: self.user_message(),
                request_id,
                fields,
            },
        };

        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                message = %self,
                request_id = %error_response.error.request_id,
                "Application error"
            );
        } else {
            tracing::debug!(
                code = self.code(),
                kind = %error_response.error.kind,
                request_id = %error_response.error.request_id,
                "Request rejected"
            );
        }

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::InvalidCredentials.code(), 400);
        assert_eq!(AppError::Duplicate { field: "email" }.code(), 400);
        assert_eq!(AppError::Token(TokenError::Revoked).code(), 400);
        assert_eq!(AppError::Unauthenticated(TokenError::Expired).code(), 401);
        assert_eq!(AppError::Unauthorized.code(), 401);
        assert_eq!(AppError::AccountDisabled.code(), 403);
        assert_eq!(AppError::NotFound("Team").code(), 404);
        assert_eq!(AppError::PayloadTooLarge.code(), 413);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(AppError::Duplicate { field: "username" }.kind(), "duplicate_username");
        assert_eq!(AppError::Token(TokenError::Revoked).kind(), "token_revoked");
        assert_eq!(AppError::Unauthenticated(TokenError::Expired).kind(), "token_expired");
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let error = AppError::Database(sqlx::Error::RowNotFound);
        let message = error.user_message();
        assert_eq!(message, "Database error occurred");
        assert!(!message.contains("sqlx"));

        let error = AppError::Internal("argon2 exploded".to_string());
        assert_eq!(error.user_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_request_id_taken_from_scope() {
        let response = REQUEST_ID
            .scope("req-42".to_string(), async {
                AppError::NotFound("Team").into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["request_id"], "req-42");
    }

    #[test]
    fn test_duplicate_message() {
        assert_eq!(
            AppError::Duplicate { field: "username" }.user_message(),
            "This username is already taken."
        );
    }
}
