//! Configuration module
//!
//! Typed runtime configuration read from environment variables at startup.
//! `DATABASE_URL`, `JWT_SECRET`, and `JWT_REFRESH_SECRET` are required;
//! everything else has a default suitable for local development.

use std::env;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 30;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_RECONCILE_PAUSE_MS: u64 = 100;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub db_max_connections: u32,
    pub cors_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub access_token_ttl_hours: i64,
    pub refresh_token_ttl_days: i64,

    pub upload_dir: String,
    pub max_upload_bytes: usize,

    pub source_base_url: String,
    pub source_timeout_secs: u64,

    pub reconcile_interval_secs: u64,
    pub reconcile_pause_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            server_port: env_parse("SERVER_PORT", DEFAULT_PORT),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_refresh_secret: env::var("JWT_REFRESH_SECRET")
                .context("JWT_REFRESH_SECRET must be set")?,
            access_token_ttl_hours: env_parse(
                "ACCESS_TOKEN_TTL_HOURS",
                DEFAULT_ACCESS_TOKEN_TTL_HOURS,
            ),
            refresh_token_ttl_days: env_parse(
                "REFRESH_TOKEN_TTL_DAYS",
                DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            ),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            source_base_url: env::var("SOURCE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            source_timeout_secs: env_parse("SOURCE_TIMEOUT_SECS", DEFAULT_SOURCE_TIMEOUT_SECS),
            reconcile_interval_secs: env_parse(
                "RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_INTERVAL_SECS,
            ),
            reconcile_pause_ms: env_parse("RECONCILE_PAUSE_MS", DEFAULT_RECONCILE_PAUSE_MS),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
