use async_trait::async_trait;

use crate::app_error::ApiResult;
use crate::domain::entities::api_log::ApiLogEntry;

/// Append-only audit store for per-request log entries. Written from the
/// write-behind worker only; this gateway never reads entries back.
#[async_trait]
pub trait ApiLogRepo: Send + Sync {
    async fn insert(&self, entry: &ApiLogEntry) -> ApiResult<()>;
}
