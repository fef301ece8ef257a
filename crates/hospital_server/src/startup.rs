//! Service assembly: pick a store backend, bootstrap it, seed demo accounts.

use std::sync::Arc;

use anyhow::{Context, Result};
use hospital_core::memory::MemoryStore;
use hospital_core::ports::{DepartmentStore, IdentityStore, RecordStore, TokenStore};
use hospital_core::seeds::{demo_accounts, seed_accounts};
use hospital_core::{HospitalService, HospitalServiceImpl};
use hospital_postgres::{apply_schema, connect, DatabaseConfig, PgStores};

use crate::config::ServerConfig;

/// Build the service described by `config`.
///
/// With a database URL this connects, applies the schema and wires the
/// Postgres adapters; without one everything lives in a `MemoryStore`.
pub async fn build_service(config: &ServerConfig) -> Result<Arc<dyn HospitalService>> {
    let settings = config.service_settings()?;
    let service = match &config.database_url {
        Some(url) => {
            let db_config =
                DatabaseConfig::new(url.clone()).with_max_connections(config.pool_size);
            let pool = connect(&db_config)
                .await
                .context("failed to connect to database")?;
            apply_schema(&pool)
                .await
                .context("failed to apply schema")?;
            let stores = PgStores::new(pool);
            HospitalServiceImpl::new(
                Arc::new(stores.identities),
                Arc::new(stores.departments),
                Arc::new(stores.records),
                Arc::new(stores.tokens),
            )
        }
        None => {
            tracing::warn!(
                "HOSPITAL_DATABASE_URL not set, using in-memory store; data is lost on exit"
            );
            memory_service()
        }
    }
    .with_settings(settings);

    if config.seed_demo {
        let report = seed_accounts(
            service.identities.as_ref(),
            &demo_accounts(),
            &config.seed_password,
        )
        .await
        .context("failed to seed demo accounts")?;
        tracing::info!(
            created = report.created,
            existing = report.existing,
            "demo accounts seeded"
        );
    }

    Ok(Arc::new(service))
}

/// A service over one shared `MemoryStore`.
pub fn memory_service() -> HospitalServiceImpl {
    let store = Arc::new(MemoryStore::new());
    let identities: Arc<dyn IdentityStore> = store.clone();
    let departments: Arc<dyn DepartmentStore> = store.clone();
    let records: Arc<dyn RecordStore> = store.clone();
    let tokens: Arc<dyn TokenStore> = store;
    HospitalServiceImpl::new(identities, departments, records, tokens)
}
