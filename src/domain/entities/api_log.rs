use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One audit record per gateway request, written asynchronously.
///
/// Keyed by company, so requests that never authenticated are not logged.
#[derive(Clone, Debug)]
pub struct ApiLogEntry {
    pub company_id: Uuid,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub response_time_ms: u64,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub rate_limit_hit: bool,
    pub timestamp: DateTime<Utc>,
}
