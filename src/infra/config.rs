use std::net::SocketAddr;

use env_helpers::{get_env, get_env_default};

/// Process-wide configuration, loaded once at startup and injected into the
/// middleware and stores it configures. Nothing reads the environment after
/// this point.
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub redis_url: String,
    /// Sliding-window length for rate limiting.
    pub rate_limit_window_secs: u64,
    /// Requests per window for credentials without a custom limit.
    pub rate_limit_default: u64,
    /// Bound of the write-behind queue (audit log + last-used refreshes).
    pub write_behind_capacity: usize,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy (Caddy, nginx).
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_default: u64 = get_env_default("RATE_LIMIT_DEFAULT", 1000);
        let write_behind_capacity: usize = get_env_default("WRITE_BEHIND_CAPACITY", 4096);
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        Self {
            bind_addr,
            database_url,
            redis_url,
            rate_limit_window_secs,
            rate_limit_default,
            write_behind_capacity,
            trust_proxy,
        }
    }
}
