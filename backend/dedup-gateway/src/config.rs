//! Environment-driven configuration, in the style of `db_pool::DbConfig::for_gateway`.

use std::time::Duration;

use db_pool::env_utils::parse_env_with_default;
use redis_utils::SentinelConfig;

#[derive(Clone)]
pub struct GatewayConfig {
    pub database_url: String,
    pub redis_url: String,
    pub redis_sentinel: Option<SentinelConfig>,
    pub dedup_ttl: Duration,
    pub bind_addr: String,
    pub log_format: LogFormat,
    pub coordinator_timeout: Duration,
    pub store_timeout: Duration,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable not set".to_string())?;
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };
        let redis_sentinel = sentinel_config_from_env();

        Ok(Self {
            database_url,
            redis_url,
            redis_sentinel,
            dedup_ttl: Duration::from_secs(parse_env_with_default("DEDUP_TTL_SECONDS", 300)),
            bind_addr,
            log_format,
            coordinator_timeout: Duration::from_millis(parse_env_with_default(
                "COORDINATOR_TIMEOUT_MS",
                500,
            )),
            store_timeout: Duration::from_millis(parse_env_with_default("STORE_TIMEOUT_MS", 2000)),
        })
    }
}

/// `REDIS_SENTINEL_ENDPOINTS` (comma-separated `host:port` list) and
/// `REDIS_SENTINEL_MASTER_NAME` must both be set to enable Sentinel
/// supervision; Redis runs standalone otherwise.
fn sentinel_config_from_env() -> Option<SentinelConfig> {
    let endpoints = std::env::var("REDIS_SENTINEL_ENDPOINTS").ok()?;
    let master_name = std::env::var("REDIS_SENTINEL_MASTER_NAME").ok()?;

    let endpoints = redis_utils::parse_sentinel_endpoints(&endpoints);
    if endpoints.is_empty() {
        return None;
    }

    let poll_interval = Duration::from_secs(parse_env_with_default(
        "REDIS_SENTINEL_POLL_INTERVAL_SECS",
        5,
    ));

    Some(SentinelConfig::new(endpoints, master_name, poll_interval))
}
