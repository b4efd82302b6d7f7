use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, middleware::gateway},
    app_error::ApiResult,
    application::pagination::{PageQuery, Paginated, Pagination},
    application::use_cases::auth::{CreateApiKeyRequest, KeyEnvironment},
    domain::entities::api_key::ApiKeyRecord,
    domain::entities::auth_context::AuthContext,
};

pub fn router(state: AppState) -> Router {
    let read = Router::new()
        .route("/api-keys", get(list_keys))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, request: Request, next: Next| {
                gateway(state, request, next, &["admin:read"])
            },
        ));

    let write = Router::new()
        .route("/api-keys", post(create_key))
        .route("/api-keys/{id}", delete(revoke_key))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, request: Request, next: Next| {
                gateway(state, request, next, &["admin:write"])
            },
        ));

    Router::new().merge(read).merge(write).with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct CreateApiKeyPayload {
    name: String,
    scopes: Vec<String>,
    #[serde(default)]
    environment: KeyEnvironment,
    rate_limit: Option<u64>,
    expires_at: Option<DateTime<Utc>>,
}

/// Key metadata as shown to dashboards. The hash never leaves the store.
#[derive(Serialize)]
struct ApiKeyResponse {
    id: Uuid,
    key_prefix: String,
    name: String,
    scopes: Vec<String>,
    status: String,
    rate_limit: Option<i64>,
    expires_at: Option<DateTime<Utc>>,
    last_used_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

impl From<ApiKeyRecord> for ApiKeyResponse {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            id: record.id,
            key_prefix: record.key_prefix,
            name: record.name,
            scopes: record.scopes,
            status: record.status.to_string(),
            rate_limit: record.rate_limit,
            expires_at: record.expires_at,
            last_used_at: record.last_used_at,
            created_at: record.created_at,
        }
    }
}

#[derive(Serialize)]
struct CreatedApiKeyResponse {
    /// The full secret, returned exactly once.
    key: String,
    #[serde(flatten)]
    meta: ApiKeyResponse,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/api-keys
async fn list_keys(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<ApiKeyResponse>>> {
    let pagination = Pagination::from_query(&query);
    let (keys, total) = state.auth.list_api_keys(ctx.company_id, &pagination).await?;
    let data = keys.into_iter().map(ApiKeyResponse::from).collect();
    Ok(Json(pagination.envelope(data, total)))
}

/// POST /v1/api-keys
async fn create_key(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateApiKeyPayload>,
) -> ApiResult<impl IntoResponse> {
    let (record, key) = state
        .auth
        .create_api_key(
            ctx.company_id,
            ctx.user_id,
            CreateApiKeyRequest {
                name: payload.name,
                scopes: payload.scopes,
                environment: payload.environment,
                rate_limit: payload.rate_limit,
                expires_at: payload.expires_at,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedApiKeyResponse {
            key,
            meta: record.into(),
        }),
    ))
}

/// DELETE /v1/api-keys/{id}
async fn revoke_key(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(key_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.auth.revoke_api_key(ctx.company_id, key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
