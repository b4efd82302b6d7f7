use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An OAuth access token issued to an end user of a company.
///
/// Issuance (the authorization-code flow) happens elsewhere; this gateway
/// only validates tokens it is handed.
#[derive(Clone, Debug)]
pub struct OAuthAccessTokenRecord {
    pub id: Uuid,
    pub token: String,
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub scopes: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    /// Rate limit of the OAuth app the token belongs to.
    pub app_rate_limit: Option<i64>,
    pub last_used_at: Option<DateTime<Utc>>,
    /// Joined from the owning company row.
    pub company_active: bool,
}

impl OAuthAccessTokenRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.company_active && self.expires_at > now
    }
}
