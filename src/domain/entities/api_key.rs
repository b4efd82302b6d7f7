use chrono::{DateTime, Utc};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
}

/// A company-scoped API key as stored.
///
/// Only the SHA-256 hash of the key is persisted; the raw key is shown
/// exactly once at creation time. `key_prefix` (first 16 characters) is
/// safe to display and useless as a credential.
#[derive(Clone, Debug)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub key_prefix: String,
    pub key_hash: String,
    pub name: String,
    pub scopes: Vec<String>,
    /// Requests per minute granted to this key; `None` means the global default.
    pub rate_limit: Option<i64>,
    pub status: ApiKeyStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    /// Joined from the owning company row; an inactive company disables all
    /// of its credentials.
    pub company_active: bool,
}

impl ApiKeyRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == ApiKeyStatus::Active
            && self.company_active
            && self.expires_at.is_none_or(|exp| exp > now)
    }
}
