use anyhow::{Result, anyhow};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Optional JSON file of opening balances
    pub seed_file: Option<PathBuf>,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub capacity: u32,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 60,
            refill_per_sec: 20.0,
        }
    }
}

/// Load configuration from the process environment, after reading `.env`
/// if one exists.
pub fn load_config() -> Result<GatewayConfig> {
    // Silent if the file does not exist; production injects env vars directly
    let _ = dotenvy::dotenv();
    GatewayConfig::from_lookup(|key| std::env::var(key).ok())
}

impl GatewayConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = RateLimitConfig::default();
        let cfg = Self {
            bind_addr: env_parse(&lookup, "BROKER_BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            jwt_secret: env_required(&lookup, "BROKER_JWT_SECRET")?,
            seed_file: lookup("BROKER_SEED_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            rate_limit: RateLimitConfig {
                capacity: env_parse(&lookup, "BROKER_RATE_LIMIT_CAPACITY", defaults.capacity)?,
                refill_per_sec: env_parse(
                    &lookup,
                    "BROKER_RATE_LIMIT_REFILL_PER_SEC",
                    defaults.refill_per_sec,
                )?,
            },
        };
        if cfg.rate_limit.capacity == 0 || cfg.rate_limit.refill_per_sec <= 0.0 {
            return Err(anyhow!("rate limit capacity and refill rate must be positive"));
        }
        Ok(cfg)
    }
}

fn env_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("missing required env var: {key}"))
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid value for {key}: {e}")),
        None => Ok(default),
    }
}
