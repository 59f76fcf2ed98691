//! Error handling for the Bar Stock Manager API
//!
//! Every failure leaves the API as `{"error": "...", "code": "..."}` with a
//! status from the error taxonomy. Storage details are logged, never returned.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::DomainError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // Access errors
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("No active team")]
    NoTeam,

    #[error(transparent)]
    Domain(#[from] DomainError),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    // Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingToken | AppError::TokenExpired | AppError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) | AppError::Validation(_) | AppError::NoTeam => {
                StatusCode::BAD_REQUEST
            }
            AppError::Domain(err) => match err {
                DomainError::InsufficientStock { .. } | DomainError::StockLimitExceeded => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DomainError::NoTeam => StatusCode::NOT_FOUND,
                DomainError::AlreadyMember => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingToken => "MISSING_TOKEN",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::InvalidToken(_) => "INVALID_TOKEN",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NoTeam => "NO_TEAM",
            AppError::Domain(err) => match err {
                DomainError::InvalidQuantity => "INVALID_QUANTITY",
                DomainError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
                DomainError::StockLimitExceeded => "STOCK_LIMIT_EXCEEDED",
                DomainError::SelfJoin => "SELF_JOIN",
                DomainError::NoTeam => "NO_TEAM",
                DomainError::AlreadyMember => "ALREADY_MEMBER",
                _ => "INVALID_INPUT",
            },
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::StorageError(_) => "STORAGE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to the caller
    fn public_message(&self) -> String {
        match self {
            AppError::MissingToken => "Missing or malformed Authorization header".to_string(),
            AppError::TokenExpired => "Token has expired".to_string(),
            AppError::InvalidToken(_) => "Invalid token".to_string(),
            AppError::Forbidden(msg) | AppError::Conflict(msg) | AppError::InvalidInput(msg) => {
                msg.clone()
            }
            AppError::NotFound(resource) => format!("{} not found", resource),
            AppError::Validation(errors) => first_validation_message(errors),
            AppError::NoTeam => "You are not a member of any team".to_string(),
            AppError::Domain(err) => err.to_string(),
            AppError::ExternalService(_) => "External service unavailable".to_string(),
            AppError::StorageError(_) | AppError::DatabaseError(_) => {
                "A database error occurred".to_string()
            }
            AppError::Internal(_) | AppError::InternalError(_) => {
                "An internal server error occurred".to_string()
            }
        }
    }
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {:?}", self);
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

/// Whether a database error is a unique-constraint violation, optionally on
/// a specific constraint
pub fn is_unique_violation(err: &sqlx::Error, constraint: Option<&str>) -> bool {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => match constraint {
            Some(name) => db_err.constraint() == Some(name),
            None => true,
        },
        _ => false,
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("Product".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Domain(DomainError::InvalidQuantity).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Domain(DomainError::InsufficientStock {
                available: Decimal::ONE,
                requested: Decimal::TEN
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Domain(DomainError::StockLimitExceeded).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::StorageError("commit failed".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_join_errors() {
        assert_eq!(AppError::from(DomainError::SelfJoin).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(DomainError::NoTeam).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(DomainError::AlreadyMember).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let err = AppError::StorageError("relation \"stock\" does not exist".into());
        assert_eq!(err.public_message(), "A database error occurred");
    }

    #[test]
    fn test_token_codes_are_distinct() {
        assert_eq!(AppError::TokenExpired.code(), "TOKEN_EXPIRED");
        assert_eq!(AppError::InvalidToken("bad signature".into()).code(), "INVALID_TOKEN");
    }
}
