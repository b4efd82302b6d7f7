use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use strum::Display;
use uuid::Uuid;

use crate::app_error::{ApiError, ApiResult};
use crate::application::pagination::Pagination;
use crate::application::use_cases::scopes::is_valid_scope;
use crate::domain::entities::api_key::ApiKeyRecord;
use crate::domain::entities::auth_context::{AuthContext, AuthMethod};
use crate::domain::entities::oauth_token::OAuthAccessTokenRecord;
use crate::infra::write_behind::{WriteBehind, WriteJob};

const KEY_PREFIX_LEN: usize = 16;
const MAX_KEY_NAME_LEN: usize = 100;

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    #[allow(clippy::too_many_arguments)]
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
    ) -> ApiResult<ApiKeyRecord>;

    /// Lookup by SHA-256 hash, joined with the owning company's active flag.
    async fn get_by_hash(&self, key_hash: &str) -> ApiResult<Option<ApiKeyRecord>>;

    async fn list_by_company(
        &self,
        company_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<ApiKeyRecord>>;

    async fn count_by_company(&self, company_id: Uuid) -> ApiResult<i64>;

    /// Revoke an active key owned by `company_id`; `NotFound` otherwise.
    async fn revoke(&self, company_id: Uuid, key_id: Uuid) -> ApiResult<()>;

    async fn update_last_used(&self, key_id: Uuid) -> ApiResult<()>;
}

#[async_trait]
pub trait OAuthTokenRepo: Send + Sync {
    /// Exact-string token lookup, joined with the owning company's active flag.
    async fn get_by_token(&self, token: &str) -> ApiResult<Option<OAuthAccessTokenRecord>>;

    async fn update_last_used(&self, token_id: Uuid) -> ApiResult<()>;
}

// ============================================================================
// Key Generation
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum KeyEnvironment {
    #[default]
    Live,
    Test,
}

#[derive(Clone, Debug)]
pub struct GeneratedApiKey {
    /// The full secret, shown to the caller exactly once.
    pub key: String,
    /// Hex SHA-256 of `key`; the only form that is persisted.
    pub key_hash: String,
    /// First 16 characters, safe for dashboards.
    pub key_prefix: String,
}

/// Generate `sk_live_<64 hex>` / `sk_test_<64 hex>` from 32 bytes of OS
/// randomness.
pub fn generate_api_key(environment: KeyEnvironment) -> GeneratedApiKey {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let key = format!("sk_{environment}_{}", hex::encode(bytes));
    let key_hash = hash_api_key(&key);
    let key_prefix = key[..KEY_PREFIX_LEN].to_string();
    GeneratedApiKey {
        key,
        key_hash,
        key_prefix,
    }
}

/// One-way, deterministic: re-hashing the raw key always reproduces the
/// stored hash.
pub fn hash_api_key(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}

/// Strip a case-insensitive `Bearer ` prefix if present.
fn bearer_credential(header: &str) -> Option<&str> {
    let header = header.trim();
    let credential = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => header,
    };
    (!credential.is_empty()).then_some(credential)
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AuthUseCases {
    api_keys: Arc<dyn ApiKeyRepo>,
    oauth_tokens: Arc<dyn OAuthTokenRepo>,
    writer: WriteBehind,
}

pub struct CreateApiKeyRequest {
    pub name: String,
    pub scopes: Vec<String>,
    pub environment: KeyEnvironment,
    pub rate_limit: Option<u64>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthUseCases {
    pub fn new(
        api_keys: Arc<dyn ApiKeyRepo>,
        oauth_tokens: Arc<dyn OAuthTokenRepo>,
        writer: WriteBehind,
    ) -> Self {
        Self {
            api_keys,
            oauth_tokens,
            writer,
        }
    }

    /// Resolve an `Authorization` header into an authenticated context.
    ///
    /// Infallible by contract: store failures are logged and collapse to
    /// `None`, exactly like a bad credential. Credentials without a known
    /// prefix are rejected before any store lookup.
    pub async fn authenticate_request(&self, header: Option<&str>) -> Option<AuthContext> {
        let credential = bearer_credential(header?)?;
        if credential.starts_with("sk_") {
            self.authenticate_api_key(credential).await
        } else if credential.starts_with("oauth_") {
            self.authenticate_oauth_token(credential).await
        } else {
            None
        }
    }

    async fn authenticate_api_key(&self, raw_key: &str) -> Option<AuthContext> {
        let key_hash = hash_api_key(raw_key);
        let record = match self.api_keys.get_by_hash(&key_hash).await {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!(error = %e, "API key lookup failed");
                return None;
            }
        };

        if !record.is_usable(Utc::now()) {
            tracing::debug!(key_id = %record.id, "Rejected unusable API key");
            return None;
        }

        self.writer.submit(WriteJob::ApiKeyUsed(record.id));

        Some(AuthContext {
            company_id: record.company_id,
            user_id: None,
            credential_id: record.id,
            scopes: record.scopes,
            auth_method: AuthMethod::ApiKey,
            rate_limit: record.rate_limit.map(|limit| limit as u64),
        })
    }

    async fn authenticate_oauth_token(&self, token: &str) -> Option<AuthContext> {
        let record = match self.oauth_tokens.get_by_token(token).await {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!(error = %e, "OAuth token lookup failed");
                return None;
            }
        };

        if !record.is_usable(Utc::now()) {
            tracing::debug!(token_id = %record.id, "Rejected unusable OAuth token");
            return None;
        }

        self.writer.submit(WriteJob::OauthTokenUsed(record.id));

        Some(AuthContext {
            company_id: record.company_id,
            user_id: Some(record.user_id),
            credential_id: record.id,
            scopes: record.scopes,
            auth_method: AuthMethod::OauthToken,
            rate_limit: record.app_rate_limit.map(|limit| limit as u64),
        })
    }

    /// Create a new API key for a company. Returns the record and the raw
    /// key, which is never persisted and shown only once.
    pub async fn create_api_key(
        &self,
        company_id: Uuid,
        created_by: Option<Uuid>,
        request: CreateApiKeyRequest,
    ) -> ApiResult<(ApiKeyRecord, String)> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ApiError::invalid_field("name", "must not be empty"));
        }
        if name.len() > MAX_KEY_NAME_LEN {
            return Err(ApiError::invalid_field("name", "must be 100 characters or fewer"));
        }
        if request.scopes.is_empty() {
            return Err(ApiError::invalid_field("scopes", "at least one scope is required"));
        }
        if let Some(invalid) = request.scopes.iter().find(|s| !is_valid_scope(s)) {
            return Err(ApiError::invalid_field(
                "scopes",
                format!("unknown scope: {invalid}"),
            ));
        }
        if request.rate_limit == Some(0) {
            return Err(ApiError::invalid_field("rate_limit", "must be at least 1"));
        }

        let generated = generate_api_key(request.environment);
        let record = self
            .api_keys
            .create(
                company_id,
                &generated.key_prefix,
                &generated.key_hash,
                name,
                &request.scopes,
                request.rate_limit.map(|limit| limit as i64),
                request.expires_at,
                created_by,
            )
            .await?;

        Ok((record, generated.key))
    }

    pub async fn list_api_keys(
        &self,
        company_id: Uuid,
        pagination: &Pagination,
    ) -> ApiResult<(Vec<ApiKeyRecord>, i64)> {
        let keys = self
            .api_keys
            .list_by_company(company_id, pagination.limit, pagination.offset())
            .await?;
        let total = self.api_keys.count_by_company(company_id).await?;
        Ok((keys, total))
    }

    pub async fn revoke_api_key(&self, company_id: Uuid, key_id: Uuid) -> ApiResult<()> {
        self.api_keys.revoke(company_id, key_id).await
    }
}
