use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::adapters::http::app_state::AppState;
use crate::application::use_cases::auth::{AuthUseCases, hash_api_key};
use crate::domain::entities::api_key::ApiKeyRecord;
use crate::domain::entities::oauth_token::OAuthAccessTokenRecord;
use crate::infra::config::AppConfig;
use crate::infra::write_behind::WriteBehind;

use super::factories::{create_test_api_key_record, create_test_oauth_token_record};
use super::mocks::{
    InMemoryApiKeyRepo, InMemoryApiLogRepo, InMemoryOAuthTokenRepo, InMemoryRateLimiter,
};

fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        redis_url: String::new(),
        rate_limit_window_secs: 60,
        rate_limit_default: 1000,
        write_behind_capacity: 64,
        trust_proxy: false,
    }
}

/// Builder for an `AppState` wired entirely to in-memory stores. Keep a
/// handle to the repos (via the accessors) to seed fixtures or assert on
/// what the server wrote.
pub struct TestAppStateBuilder {
    api_keys: Arc<InMemoryApiKeyRepo>,
    oauth_tokens: Arc<InMemoryOAuthTokenRepo>,
    logs: Arc<InMemoryApiLogRepo>,
    rate_limiter: Arc<InMemoryRateLimiter>,
    config: AppConfig,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        let config = test_config();
        Self {
            api_keys: Arc::new(InMemoryApiKeyRepo::new()),
            oauth_tokens: Arc::new(InMemoryOAuthTokenRepo::new()),
            logs: Arc::new(InMemoryApiLogRepo::new()),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(
                Duration::from_secs(config.rate_limit_window_secs),
                config.rate_limit_default,
            )),
            config,
        }
    }

    /// Seed an API key whose hash matches `raw_key`, so requests carrying
    /// `Bearer <raw_key>` authenticate against it.
    pub fn with_api_key(
        self,
        company_id: Uuid,
        raw_key: &str,
        overrides: impl FnOnce(&mut ApiKeyRecord),
    ) -> Self {
        let hash = hash_api_key(raw_key);
        let prefix: String = raw_key.chars().take(16).collect();
        let record = create_test_api_key_record(company_id, |k| {
            k.key_hash = hash;
            k.key_prefix = prefix;
            overrides(k);
        });
        self.api_keys.insert(record);
        self
    }

    pub fn with_oauth_token(
        self,
        company_id: Uuid,
        token: &str,
        overrides: impl FnOnce(&mut OAuthAccessTokenRecord),
    ) -> Self {
        let record = create_test_oauth_token_record(company_id, |t| {
            t.token = token.to_string();
            overrides(t);
        });
        self.oauth_tokens.insert(record);
        self
    }

    pub fn api_keys(&self) -> Arc<InMemoryApiKeyRepo> {
        self.api_keys.clone()
    }

    pub fn oauth_tokens(&self) -> Arc<InMemoryOAuthTokenRepo> {
        self.oauth_tokens.clone()
    }

    pub fn logs(&self) -> Arc<InMemoryApiLogRepo> {
        self.logs.clone()
    }

    pub fn build(self) -> AppState {
        let writer = WriteBehind::spawn(
            self.api_keys.clone(),
            self.oauth_tokens.clone(),
            self.logs,
            self.config.write_behind_capacity,
        );
        let auth = AuthUseCases::new(self.api_keys, self.oauth_tokens, writer.clone());
        AppState {
            config: Arc::new(self.config),
            auth: Arc::new(auth),
            rate_limiter: self.rate_limiter,
            writer,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
