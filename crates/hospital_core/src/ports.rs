//! Storage port traits.
//! Implemented by hospital_postgres and by `memory::MemoryStore`; the
//! service depends only on these traits.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::HospitalError;
use crate::policy::RecordScope;
use crate::types::*;

pub type Result<T> = std::result::Result<T, HospitalError>;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create an identity and its group membership atomically.
    /// Returns `Conflict` when the username is taken.
    async fn create_identity(&self, new: NewIdentity) -> Result<Identity>;

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>>;

    async fn username_exists(&self, username: &str) -> Result<bool>;

    /// Identity plus password hash, for login only.
    async fn find_credential(&self, username: &str) -> Result<Option<StoredCredential>>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>>;

    /// Apply a partial update. Returns `None` if the identity is gone,
    /// `Conflict` on a username collision.
    async fn update_identity(&self, id: UserId, update: IdentityUpdate)
        -> Result<Option<Identity>>;

    /// Delete an identity, cascading to its records, tokens and memberships.
    async fn delete_identity(&self, id: UserId) -> Result<bool>;
}

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn list_departments(&self) -> Result<Vec<Department>>;

    async fn create_department(&self, new: NewDepartment) -> Result<Department>;

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>>;

    /// Departments a doctor is a member of.
    async fn departments_of_doctor(&self, doctor_id: UserId) -> Result<BTreeSet<DepartmentId>>;

    async fn doctors_of_department(&self, id: DepartmentId) -> Result<Vec<Identity>>;

    /// Distinct owners of records held by the department.
    async fn patients_of_department(&self, id: DepartmentId) -> Result<Vec<Identity>>;

    /// Replace the department's doctor membership.
    async fn set_department_doctors(&self, id: DepartmentId, doctors: &[UserId]) -> Result<()>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_records(&self, scope: &RecordScope) -> Result<Vec<PatientRecord>>;

    async fn get_record(&self, id: RecordId) -> Result<Option<PatientRecord>>;

    /// Insert a record; the store stamps `created_date`.
    async fn create_record(&self, new: NewPatientRecord) -> Result<PatientRecord>;

    async fn update_record(&self, id: RecordId, patch: &RecordPatch)
        -> Result<Option<PatientRecord>>;

    async fn delete_record(&self, id: RecordId) -> Result<bool>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_token(&self, token: &AuthToken) -> Result<()>;

    /// Token by key, only if still active at `now`.
    async fn find_active(&self, key: &str, now: DateTime<Utc>) -> Result<Option<AuthToken>>;

    /// Expire an active token at `now`. Returns false when the key is
    /// unknown or already expired.
    async fn expire_token(&self, key: &str, now: DateTime<Utc>) -> Result<bool>;
}
