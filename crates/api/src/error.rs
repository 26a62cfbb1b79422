//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Validation errors (rejected before any persistence)
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),

    // Resource errors
    #[error("Resource not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),

    // Access errors
    /// Host resolved to a tenant but the custom domain has not proved
    /// ownership yet. Distinct from NotFound so the operator learns the
    /// domain is recognized, just not trusted.
    #[error("Custom domain {0} is not verified. Please verify your domain first.")]
    DomainNotVerified(String),

    // Subdomain generation
    #[error("Could not allocate a free subdomain")]
    SubdomainGenerationExhausted,

    // Provisioning. A failed provisioning attempt is not an error response
    // by itself (verification stands; the verify body carries the
    // diagnostics); only the hard retry ceiling surfaces as an error.
    #[error("Provisioning retry limit reached; manual intervention required")]
    RetryExhausted,

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),

            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),

            ApiError::DomainNotVerified(_) => {
                (StatusCode::FORBIDDEN, "DOMAIN_NOT_VERIFIED", self.to_string())
            }

            ApiError::SubdomainGenerationExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SUBDOMAIN_GENERATION_EXHAUSTED",
                self.to_string(),
            ),

            ApiError::RetryExhausted => {
                (StatusCode::CONFLICT, "RETRY_EXHAUSTED", self.to_string())
            }

            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error".to_string(),
            ),
        };

        // Clients branch on verification_required to start the DNS flow
        let body = if matches!(self, ApiError::DomainNotVerified(_)) {
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                },
                "verification_required": true,
            }))
        } else {
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            }))
        };

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    // PostgreSQL unique violation: the store is the final
                    // arbiter of subdomain/custom-domain uniqueness, so a
                    // pre-check that passed can still lose the race here.
                    if code == "23505" {
                        return ApiError::Conflict("Resource already exists".to_string());
                    }
                }
                ApiError::Database(db_err.to_string())
            }
            _ => ApiError::Database(err.to_string()),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
