use axum::{
    Extension, Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    routing::get,
};

use crate::{
    adapters::http::{app_state::AppState, middleware::gateway},
    domain::entities::auth_context::AuthContext,
};

/// No scope requirement beyond a valid credential.
const NO_SCOPES: &[&str] = &[];

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/me", get(whoami))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, request: Request, next: Next| {
                gateway(state, request, next, NO_SCOPES)
            },
        ))
        .with_state(state)
}

/// GET /v1/me
/// Echoes the authenticated context so integration clients can verify
/// which company, scopes, and quota a credential resolves to.
async fn whoami(Extension(ctx): Extension<AuthContext>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "company_id": ctx.company_id,
        "user_id": ctx.user_id,
        "auth_method": ctx.auth_method.to_string(),
        "scopes": ctx.scopes,
        "rate_limit": ctx.rate_limit,
    }))
}
