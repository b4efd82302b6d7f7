use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Gateway error taxonomy. Client-caused failures (401/403/404/400/429)
/// are distinguished from server-caused ones (500) by variant, not by
/// status inspection.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid or missing API credentials")]
    Unauthorized,

    #[error("Insufficient scope for this operation")]
    Forbidden { missing_scopes: Vec<String> },

    #[error("Not found")]
    NotFound,

    #[error("Validation failed")]
    Validation(BTreeMap<String, String>),

    #[error("Rate limit exceeded")]
    RateLimited { limit: u64, reset: DateTime<Utc> },

    #[error("Resource already exists")]
    Duplicate,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationError,
    RateLimitExceeded,
    DuplicateError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::DuplicateError => "DUPLICATE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::Forbidden { .. } => ErrorCode::Forbidden,
            ApiError::NotFound => ErrorCode::NotFound,
            ApiError::Validation(_) => ErrorCode::ValidationError,
            ApiError::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            ApiError::Duplicate => ErrorCode::DuplicateError,
            ApiError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.into());
        ApiError::Validation(fields)
    }
}

/// Storage errors arrive as tagged sqlx variants and are translated here,
/// so callers never see driver detail or schema names.
impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::Duplicate,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
