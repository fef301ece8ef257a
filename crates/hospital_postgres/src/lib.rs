//! PostgreSQL adapter for hospital_core.

pub mod db;
pub mod store;
mod sqlx_types;

pub use db::{apply_schema, connect, mask_database_url, DatabaseConfig};
pub use store::{PgDepartmentStore, PgIdentityStore, PgRecordStore, PgStores, PgTokenStore};
