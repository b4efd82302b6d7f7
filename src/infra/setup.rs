use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::use_cases::{
        audit::ApiLogRepo,
        auth::{ApiKeyRepo, AuthUseCases, OAuthTokenRepo},
    },
    infra::{
        config::AppConfig,
        db::init_db,
        rate_limit::{RateLimiter, RedisRateLimiter},
        write_behind::WriteBehind,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let persistence = Arc::new(PostgresPersistence::new(pool));

    let api_key_repo = persistence.clone() as Arc<dyn ApiKeyRepo>;
    let oauth_token_repo = persistence.clone() as Arc<dyn OAuthTokenRepo>;
    let log_repo = persistence as Arc<dyn ApiLogRepo>;

    let writer = WriteBehind::spawn(
        api_key_repo.clone(),
        oauth_token_repo.clone(),
        log_repo,
        config.write_behind_capacity,
    );

    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(
        RedisRateLimiter::new(
            &config.redis_url,
            config.rate_limit_window_secs,
            config.rate_limit_default,
        )
        .await?,
    );

    let auth = AuthUseCases::new(api_key_repo, oauth_token_repo, writer.clone());

    Ok(AppState {
        config: Arc::new(config),
        auth: Arc::new(auth),
        rate_limiter,
        writer,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "casaflow_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
