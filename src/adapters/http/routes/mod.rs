pub mod api_keys;
pub mod me;

use axum::Router;

use crate::adapters::http::app_state::AppState;

/// The v1 surface. Every route is wrapped by the gateway chain with its own
/// scope requirements, so the state is taken here at construction time.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(me::router(state.clone()))
        .merge(api_keys::router(state))
}
