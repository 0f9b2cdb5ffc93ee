use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: String,
    pub nats_consumer_group: String,
    pub mail_gateway_url: String,
    pub mail_gateway_token: Option<String>,
    pub inventory: InventorySettings,
}

/// Resilience knobs for the inventory service read path.
#[derive(Debug, Clone)]
pub struct InventorySettings {
    pub url: String,
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a trial call.
    pub cooldown: Duration,
    /// Total attempts per call, including the first.
    pub retry_attempts: u32,
    /// Delay between attempts.
    pub retry_backoff: Duration,
    /// Hard limit on a single attempt.
    pub attempt_timeout: Duration,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", key, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env_or("PORT", 8080)?,
            nats_url: env::var("NATS_URL").unwrap_or_else(|_| "localhost:4222".to_string()),
            nats_consumer_group: env::var("NATS_CONSUMER_GROUP")
                .unwrap_or_else(|_| "library-group".to_string()),
            mail_gateway_url: env::var("MAIL_GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:8090".to_string()),
            mail_gateway_token: env::var("MAIL_GATEWAY_TOKEN").ok(),
            inventory: InventorySettings {
                url: env::var("INVENTORY_URL")
                    .unwrap_or_else(|_| "http://localhost:8087/api/products".to_string()),
                failure_threshold: env_or("INVENTORY_FAILURE_THRESHOLD", 3)?,
                cooldown: Duration::from_secs(env_or("INVENTORY_COOLDOWN_SECS", 10)?),
                retry_attempts: env_or("INVENTORY_RETRY_ATTEMPTS", 3)?,
                retry_backoff: Duration::from_millis(env_or("INVENTORY_RETRY_BACKOFF_MS", 500)?),
                attempt_timeout: Duration::from_millis(env_or("INVENTORY_TIMEOUT_MS", 2000)?),
            },
        })
    }
}
