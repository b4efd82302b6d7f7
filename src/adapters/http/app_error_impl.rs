use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::SecondsFormat;

use crate::app_error::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Server-caused failures get error-level logs; client mistakes stay
        // at debug so a misbehaving client cannot flood the logs.
        match &self {
            ApiError::Internal(_) => tracing::error!(error = ?self, "Request failed"),
            _ => tracing::debug!(error = ?self, "Request rejected"),
        }

        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Duplicate => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match &self {
            ApiError::Forbidden { missing_scopes } => {
                Some(serde_json::json!({ "missing_scopes": missing_scopes }))
            }
            ApiError::Validation(fields) => Some(serde_json::json!(fields)),
            ApiError::RateLimited { limit, reset } => Some(serde_json::json!({
                "limit": limit,
                "reset": reset.to_rfc3339_opts(SecondsFormat::Millis, true),
            })),
            #[cfg(debug_assertions)]
            ApiError::Internal(detail) => Some(serde_json::json!({ "debug": detail })),
            _ => None,
        };

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code().as_str(),
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}
