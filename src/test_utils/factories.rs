use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::api_key::{ApiKeyRecord, ApiKeyStatus};
use crate::domain::entities::api_log::ApiLogEntry;
use crate::domain::entities::oauth_token::OAuthAccessTokenRecord;
use crate::infra::write_behind::WriteBehind;

use super::mocks::{InMemoryApiKeyRepo, InMemoryApiLogRepo, InMemoryOAuthTokenRepo};

/// An active, unexpired API key for `company_id`. Apply overrides via the
/// closure.
pub fn create_test_api_key_record(
    company_id: Uuid,
    overrides: impl FnOnce(&mut ApiKeyRecord),
) -> ApiKeyRecord {
    let id = Uuid::new_v4();
    let mut record = ApiKeyRecord {
        id,
        company_id,
        key_prefix: "sk_live_deadbeef".to_string(),
        // Unique per record so hash lookups never collide between fixtures.
        key_hash: format!("test-hash-{id}"),
        name: "Default".to_string(),
        scopes: vec!["properties:read".to_string()],
        rate_limit: None,
        status: ApiKeyStatus::Active,
        expires_at: None,
        last_used_at: None,
        created_by: None,
        created_at: Some(Utc::now()),
        company_active: true,
    };
    overrides(&mut record);
    record
}

/// A live OAuth access token for `company_id`, expiring in an hour.
pub fn create_test_oauth_token_record(
    company_id: Uuid,
    overrides: impl FnOnce(&mut OAuthAccessTokenRecord),
) -> OAuthAccessTokenRecord {
    let id = Uuid::new_v4();
    let mut record = OAuthAccessTokenRecord {
        id,
        token: format!("oauth_{id}"),
        company_id,
        user_id: Uuid::new_v4(),
        scopes: vec!["properties:read".to_string()],
        expires_at: Utc::now() + Duration::hours(1),
        revoked: false,
        app_rate_limit: None,
        last_used_at: None,
        company_active: true,
    };
    overrides(&mut record);
    record
}

pub fn create_test_log_entry(
    company_id: Uuid,
    overrides: impl FnOnce(&mut ApiLogEntry),
) -> ApiLogEntry {
    let mut entry = ApiLogEntry {
        company_id,
        method: "GET".to_string(),
        path: "/v1/properties".to_string(),
        status_code: 200,
        response_time_ms: 12,
        ip_address: "203.0.113.9".to_string(),
        user_agent: Some("casaflow-test/1.0".to_string()),
        rate_limit_hit: false,
        timestamp: Utc::now(),
    };
    overrides(&mut entry);
    entry
}

/// A write-behind worker over the given in-memory credential stores, with a
/// throwaway log sink.
pub fn spawn_test_writer(
    api_keys: Arc<InMemoryApiKeyRepo>,
    oauth_tokens: Arc<InMemoryOAuthTokenRepo>,
) -> WriteBehind {
    WriteBehind::spawn(api_keys, oauth_tokens, Arc::new(InMemoryApiLogRepo::new()), 64)
}
