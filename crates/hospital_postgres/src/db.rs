//! Connection pooling and schema bootstrap.

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

const SCHEMA_SQL: &str = include_str!("../../../migrations/0001_hospital_schema.sql");

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connection_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}

/// Open the hospital pool. The URL is logged with its password hidden.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let target = mask_database_url(&config.database_url);
    info!(%target, max_connections = config.max_connections, "opening hospital pool");
    let pool = config
        .pool_options()
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            warn!(%target, error = %e, "hospital pool unavailable");
            e
        })?;
    info!(%target, "hospital pool ready");
    Ok(pool)
}

/// Apply the embedded schema. Every statement is `IF NOT EXISTS` /
/// `ON CONFLICT DO NOTHING`, so this runs on each startup.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Applying hospital schema");
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}

/// The URL with any password replaced by `***`.
pub fn mask_database_url(url: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(url) else {
        return "<unparseable database url>".into();
    };
    if parsed.password().is_some() && parsed.set_password(Some("***")).is_err() {
        return "<unparseable database url>".into();
    }
    parsed.into()
}
