//! Server configuration from environment variables.
//!
//!   HOSPITAL_DATABASE_URL       — Postgres connection string (unset: in-memory store)
//!   HOSPITAL_DB_POOL_SIZE       — max pool connections (default: 10)
//!   HOSPITAL_BIND_ADDR          — listen address (default: 0.0.0.0:8000)
//!   HOSPITAL_TOKEN_TTL_SECS     — token lifetime (default: 36000)
//!   HOSPITAL_PUBLIC_DEPARTMENTS — unauthenticated department list (default: false)
//!   HOSPITAL_SEED_DEMO          — create demo accounts at startup (default: true)
//!   HOSPITAL_SEED_PASSWORD      — demo account password (default: admin2001)

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use hospital_core::seeds::DEFAULT_SEED_PASSWORD;
use hospital_core::service::{ServiceSettings, DEFAULT_TOKEN_TTL_SECS};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_POOL_SIZE: u32 = 10;
/// Longest accepted token lifetime (ten years).
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: Option<String>,
    pub pool_size: u32,
    pub bind_addr: String,
    pub token_ttl_secs: i64,
    pub public_departments: bool,
    pub seed_demo: bool,
    pub seed_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_size: DEFAULT_POOL_SIZE,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            public_departments: false,
            seed_demo: true,
            seed_password: DEFAULT_SEED_PASSWORD.into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let pool_size = parse_or(
            "HOSPITAL_DB_POOL_SIZE",
            get("HOSPITAL_DB_POOL_SIZE"),
            defaults.pool_size,
        )?;
        if pool_size == 0 {
            bail!("HOSPITAL_DB_POOL_SIZE must be at least 1");
        }
        let token_ttl_secs = parse_or(
            "HOSPITAL_TOKEN_TTL_SECS",
            get("HOSPITAL_TOKEN_TTL_SECS"),
            defaults.token_ttl_secs,
        )?;
        if !(0..=MAX_TOKEN_TTL_SECS).contains(&token_ttl_secs) {
            bail!("HOSPITAL_TOKEN_TTL_SECS must be between 0 and {MAX_TOKEN_TTL_SECS}");
        }

        Ok(Self {
            database_url: get("HOSPITAL_DATABASE_URL"),
            pool_size,
            bind_addr: get("HOSPITAL_BIND_ADDR").unwrap_or(defaults.bind_addr),
            token_ttl_secs,
            public_departments: parse_flag(
                "HOSPITAL_PUBLIC_DEPARTMENTS",
                get("HOSPITAL_PUBLIC_DEPARTMENTS"),
                defaults.public_departments,
            )?,
            seed_demo: parse_flag(
                "HOSPITAL_SEED_DEMO",
                get("HOSPITAL_SEED_DEMO"),
                defaults.seed_demo,
            )?,
            seed_password: get("HOSPITAL_SEED_PASSWORD").unwrap_or(defaults.seed_password),
        })
    }

    pub fn service_settings(&self) -> Result<ServiceSettings> {
        let token_ttl = chrono::Duration::try_seconds(self.token_ttl_secs)
            .filter(|_| (0..=MAX_TOKEN_TTL_SECS).contains(&self.token_ttl_secs))
            .ok_or_else(|| anyhow!("token lifetime out of range: {}s", self.token_ttl_secs))?;
        Ok(ServiceSettings {
            token_ttl,
            public_departments: self.public_departments,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {value:?}")),
        None => Ok(default),
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("invalid boolean for {key}: {value:?}")),
    }
}
