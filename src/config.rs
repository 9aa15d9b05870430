use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::str::FromStr;

use crate::schedule::weekly_hours::DEFAULT_WEEKLY_CAP_HOURS;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    pub weekly_hours_cap: i64,
    /// Minutes east of UTC for the center's wall clock.
    pub center_utc_offset_minutes: i32,
    pub cache_ttl_seconds: u64,
    pub rate_limit_per_minute: u32,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let config = Config {
            database_url: var_or("DATABASE_URL", "postgres://@localhost:5432/dispatch"),
            jwt_secret: var_or(
                "JWT_SECRET",
                "dispatch-dev-jwt-secret-change-this-in-production",
            ),
            jwt_expiration_days: parse_or("JWT_EXPIRATION_DAYS", 30)?,
            host: var_or("HOST", "127.0.0.1"),
            port: parse_or("PORT", 8080)?,
            environment: var_or("ENVIRONMENT", "development"),
            client_base_url: var_or("CLIENT_BASE_URL", "http://localhost:3000"),
            weekly_hours_cap: parse_or("WEEKLY_HOURS_CAP", DEFAULT_WEEKLY_CAP_HOURS)?,
            center_utc_offset_minutes: parse_or("CENTER_UTC_OFFSET_MINUTES", 0)?,
            cache_ttl_seconds: parse_or("CACHE_TTL_SECONDS", 60)?,
            rate_limit_per_minute: parse_or("RATE_LIMIT_PER_MINUTE", 100)?,
        };

        if config.weekly_hours_cap <= 0 {
            return Err(anyhow!("WEEKLY_HOURS_CAP must be positive"));
        }
        config.center_offset()?;

        Ok(config)
    }

    pub fn center_offset(&self) -> Result<FixedOffset> {
        self.center_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                anyhow!(
                    "CENTER_UTC_OFFSET_MINUTES out of range: {}",
                    self.center_utc_offset_minutes
                )
            })
    }

    /// Offset validated at load time; falls back to UTC for hand-built configs.
    pub fn offset(&self) -> FixedOffset {
        self.center_offset().unwrap_or_else(|_| Utc.fix())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
