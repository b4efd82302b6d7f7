use std::sync::Arc;

use crate::{
    application::use_cases::auth::AuthUseCases,
    infra::config::AppConfig,
    infra::rate_limit::RateLimiter,
    infra::write_behind::WriteBehind,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthUseCases>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub writer: WriteBehind,
}
