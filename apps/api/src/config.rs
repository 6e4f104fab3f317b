use anyhow::{Context, Result};

use crate::i18n::DEFAULT_LOCALE;

const DEFAULT_STATE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Durable wizard state; `None` keeps it in process memory.
    pub redis_url: Option<String>,
    pub wizard_state_ttl_secs: u64,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub locale: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            wizard_state_ttl_secs: std::env::var("WIZARD_STATE_TTL_SECS")
                .ok()
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("WIZARD_STATE_TTL_SECS must be a number of seconds")?
                .unwrap_or(DEFAULT_STATE_TTL_SECS),
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            locale: std::env::var("LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
