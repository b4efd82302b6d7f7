use async_trait::async_trait;
use chrono::Utc;
use redis::{Script, aio::ConnectionManager};
use uuid::Uuid;

use crate::infra::error::InfraError;

/// Outcome of one quota check. `reset_ms` is the absolute epoch-millisecond
/// timestamp at which the current window's quota fully replenishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    pub reset_ms: i64,
}

/// Per-company sliding-window quota enforcement against a shared counter
/// store. Infallible by contract: store outages fail open (see
/// `RedisRateLimiter::check`).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check(&self, company_id: Uuid, custom_limit: Option<u64>) -> RateLimitDecision;
}

/// Counter key for a company. A custom limit that differs from the default
/// gets its own counter, so differently-provisioned credentials of the same
/// company never share quota.
pub fn counter_key(company_id: Uuid, custom_limit: Option<u64>, default_limit: u64) -> String {
    match custom_limit {
        Some(limit) if limit != default_limit => format!("rate:company:{company_id}:{limit}"),
        _ => format!("rate:company:{company_id}"),
    }
}

/// Lua script for atomic increment with TTL.
/// Returns {count, pttl} after increment. The counter gets its TTL on first
/// hit; a key that somehow lost its TTL is repaired rather than left to
/// count forever. Running inside the store makes increment-and-check a
/// single atomic step under concurrent requests.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
elseif redis.call('PTTL', KEYS[1]) < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return {current, redis.call('PTTL', KEYS[1])}
"#;

/// Redis-backed rate limiter for production use.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_ms: i64,
    default_limit: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis_url: &str,
        window_secs: u64,
        default_limit: u64,
    ) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        let script = Script::new(INCR_WITH_TTL_SCRIPT);
        Ok(Self {
            manager,
            window_ms: (window_secs * 1000) as i64,
            default_limit,
            script,
        })
    }

    async fn bump(&self, key: &str) -> Result<(u64, i64), redis::RedisError> {
        let mut conn = self.manager.clone();
        let (count, pttl): (u64, i64) = self
            .script
            .key(key)
            .arg(self.window_ms)
            .invoke_async(&mut conn)
            .await?;
        Ok((count, pttl))
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    /// Fail-open: if the counter store is unreachable the request is allowed
    /// with a synthetic `remaining = limit - 1`, trading strict enforcement
    /// for availability.
    async fn check(&self, company_id: Uuid, custom_limit: Option<u64>) -> RateLimitDecision {
        let limit = custom_limit.unwrap_or(self.default_limit);
        let key = counter_key(company_id, custom_limit, self.default_limit);

        match self.bump(&key).await {
            Ok((count, pttl)) => RateLimitDecision {
                allowed: count <= limit,
                limit,
                remaining: limit.saturating_sub(count),
                reset_ms: Utc::now().timestamp_millis() + pttl.max(0),
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    %company_id,
                    "Rate limit store unreachable, failing open"
                );
                RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit.saturating_sub(1),
                    reset_ms: Utc::now().timestamp_millis() + self.window_ms,
                }
            }
        }
    }
}
