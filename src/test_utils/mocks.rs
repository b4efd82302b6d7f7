use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::app_error::{ApiError, ApiResult};
use crate::application::use_cases::audit::ApiLogRepo;
use crate::application::use_cases::auth::{ApiKeyRepo, OAuthTokenRepo};
use crate::domain::entities::api_key::{ApiKeyRecord, ApiKeyStatus};
use crate::domain::entities::api_log::ApiLogEntry;
use crate::domain::entities::oauth_token::OAuthAccessTokenRecord;
use crate::infra::rate_limit::{RateLimitDecision, RateLimiter, counter_key};

/// In-memory API key store.
pub struct InMemoryApiKeyRepo {
    keys: Mutex<HashMap<Uuid, ApiKeyRecord>>,
    /// Number of `get_by_hash` calls, for asserting that bad credential
    /// prefixes never reach the store.
    pub lookups: AtomicUsize,
}

impl InMemoryApiKeyRepo {
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, record: ApiKeyRecord) {
        self.keys.lock().unwrap().insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<ApiKeyRecord> {
        self.keys.lock().unwrap().get(&id).cloned()
    }
}

impl Default for InMemoryApiKeyRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyRepo for InMemoryApiKeyRepo {
    async fn create(
        &self,
        company_id: Uuid,
        key_prefix: &str,
        key_hash: &str,
        name: &str,
        scopes: &[String],
        rate_limit: Option<i64>,
        expires_at: Option<DateTime<Utc>>,
        created_by: Option<Uuid>,
    ) -> ApiResult<ApiKeyRecord> {
        let record = ApiKeyRecord {
            id: Uuid::new_v4(),
            company_id,
            key_prefix: key_prefix.to_string(),
            key_hash: key_hash.to_string(),
            name: name.to_string(),
            scopes: scopes.to_vec(),
            rate_limit,
            status: ApiKeyStatus::Active,
            expires_at,
            last_used_at: None,
            created_by,
            created_at: Some(Utc::now()),
            company_active: true,
        };
        self.insert(record.clone());
        Ok(record)
    }

    async fn get_by_hash(&self, key_hash: &str) -> ApiResult<Option<ApiKeyRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .keys
            .lock()
            .unwrap()
            .values()
            .find(|record| record.key_hash == key_hash)
            .cloned())
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<ApiKeyRecord>> {
        let mut records: Vec<ApiKeyRecord> = self
            .keys
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.company_id == company_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_by_company(&self, company_id: Uuid) -> ApiResult<i64> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .values()
            .filter(|record| record.company_id == company_id)
            .count() as i64)
    }

    async fn revoke(&self, company_id: Uuid, key_id: Uuid) -> ApiResult<()> {
        let mut keys = self.keys.lock().unwrap();
        match keys.get_mut(&key_id) {
            Some(record)
                if record.company_id == company_id && record.status == ApiKeyStatus::Active =>
            {
                record.status = ApiKeyStatus::Revoked;
                Ok(())
            }
            _ => Err(ApiError::NotFound),
        }
    }

    async fn update_last_used(&self, key_id: Uuid) -> ApiResult<()> {
        let mut keys = self.keys.lock().unwrap();
        match keys.get_mut(&key_id) {
            Some(record) => {
                record.last_used_at = Some(Utc::now());
                Ok(())
            }
            None => Err(ApiError::NotFound),
        }
    }
}

/// In-memory OAuth access token store.
pub struct InMemoryOAuthTokenRepo {
    tokens: Mutex<HashMap<Uuid, OAuthAccessTokenRecord>>,
    pub lookups: AtomicUsize,
}

impl InMemoryOAuthTokenRepo {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, record: OAuthAccessTokenRecord) {
        self.tokens.lock().unwrap().insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<OAuthAccessTokenRecord> {
        self.tokens.lock().unwrap().get(&id).cloned()
    }
}

impl Default for InMemoryOAuthTokenRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthTokenRepo for InMemoryOAuthTokenRepo {
    async fn get_by_token(&self, token: &str) -> ApiResult<Option<OAuthAccessTokenRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .values()
            .find(|record| record.token == token)
            .cloned())
    }

    async fn update_last_used(&self, token_id: Uuid) -> ApiResult<()> {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get_mut(&token_id) {
            Some(record) => {
                record.last_used_at = Some(Utc::now());
                Ok(())
            }
            None => Err(ApiError::NotFound),
        }
    }
}

/// In-memory audit log sink.
pub struct InMemoryApiLogRepo {
    entries: Mutex<Vec<ApiLogEntry>>,
}

impl InMemoryApiLogRepo {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn entries(&self) -> Vec<ApiLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl Default for InMemoryApiLogRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiLogRepo for InMemoryApiLogRepo {
    async fn insert(&self, entry: &ApiLogEntry) -> ApiResult<()> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

struct CounterWindow {
    count: u64,
    started: Instant,
}

/// In-memory counter store mirroring the Redis increment-with-TTL
/// semantics: fixed windows keyed by `counter_key`, reset once the window
/// elapses.
pub struct InMemoryRateLimiter {
    window: Duration,
    default_limit: u64,
    counters: Mutex<HashMap<String, CounterWindow>>,
}

impl InMemoryRateLimiter {
    pub fn new(window: Duration, default_limit: u64) -> Self {
        Self {
            window,
            default_limit,
            counters: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, company_id: Uuid, custom_limit: Option<u64>) -> RateLimitDecision {
        let limit = custom_limit.unwrap_or(self.default_limit);
        let key = counter_key(company_id, custom_limit, self.default_limit);
        let now = Instant::now();

        let mut counters = self.counters.lock().unwrap();
        let window = counters.entry(key).or_insert(CounterWindow {
            count: 0,
            started: now,
        });
        if now.duration_since(window.started) >= self.window {
            window.count = 0;
            window.started = now;
        }
        window.count += 1;

        let left = self.window.saturating_sub(now.duration_since(window.started));
        RateLimitDecision {
            allowed: window.count <= limit,
            limit,
            remaining: limit.saturating_sub(window.count),
            reset_ms: Utc::now().timestamp_millis() + left.as_millis() as i64,
        }
    }
}
