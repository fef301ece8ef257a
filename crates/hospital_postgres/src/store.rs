//! Postgres adapters for the hospital_core ports.
//!
//! One newtype over `PgPool` per port. Queries are built at runtime, so the
//! crate compiles without a live database.

use std::collections::BTreeSet;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use hospital_core::error::HospitalError;
use hospital_core::policy::RecordScope;
use hospital_core::ports::{DepartmentStore, IdentityStore, RecordStore, Result, TokenStore};
use hospital_core::types::*;

use crate::sqlx_types::{PgDepartmentRow, PgIdentityRow, PgRecordRow, PgTokenRow};

/// Identity columns plus the aggregated group names. Callers append a
/// `WHERE` clause; `GROUP BY` / `ORDER BY` are added by [`identity_query`].
const IDENTITY_SELECT: &str = r#"
    SELECT u.id, u.username, u.date_joined, u.password_hash,
           COALESCE(
               array_agg(g.name::text) FILTER (WHERE g.name IS NOT NULL),
               ARRAY[]::text[]
           ) AS groups
    FROM users u
    LEFT JOIN user_groups ug ON ug.user_id = u.id
    LEFT JOIN groups g ON g.id = ug.group_id
"#;

const RECORD_COLUMNS: &str = "record_id, patient_id, created_date, diagnostics, observations, \
                              treatments, department_id, misc";

fn identity_query(filter: &str) -> String {
    format!("{IDENTITY_SELECT} WHERE {filter} GROUP BY u.id ORDER BY u.id")
}

fn username_conflict(e: sqlx::Error) -> HospitalError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            HospitalError::Conflict("Username already taken.".into())
        }
        _ => HospitalError::Internal(anyhow!(e)),
    }
}

/// All four adapters over one pool.
pub struct PgStores {
    pub identities: PgIdentityStore,
    pub departments: PgDepartmentStore,
    pub records: PgRecordStore,
    pub tokens: PgTokenStore,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            identities: PgIdentityStore::new(pool.clone()),
            departments: PgDepartmentStore::new(pool.clone()),
            records: PgRecordStore::new(pool.clone()),
            tokens: PgTokenStore::new(pool),
        }
    }
}

// ── PgIdentityStore ───────────────────────────────────────────

pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_identity(&self, id: UserId) -> Result<Option<PgIdentityRow>> {
        let row = sqlx::query_as::<_, PgIdentityRow>(&identity_query("u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(row)
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create_identity(&self, new: NewIdentity) -> Result<Identity> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        let (id, date_joined) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, date_joined
            "#,
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(username_conflict)?;

        let assigned = sqlx::query(
            r#"
            INSERT INTO user_groups (user_id, group_id)
            SELECT $1, id FROM groups WHERE name = $2
            "#,
        )
        .bind(id)
        .bind(new.role.group_name())
        .execute(&mut *tx)
        .await
        .map_err(|e| anyhow!(e))?;

        if assigned.rows_affected() == 0 {
            return Err(HospitalError::Internal(anyhow!(
                "group {} is not seeded",
                new.role.group_name()
            )));
        }

        tx.commit().await.map_err(|e| anyhow!(e))?;

        Ok(Identity {
            id,
            username: new.username,
            roles: BTreeSet::from([new.role]),
            date_joined,
        })
    }

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>> {
        Ok(self.fetch_identity(id).await?.map(Identity::from))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(exists)
    }

    async fn find_credential(&self, username: &str) -> Result<Option<StoredCredential>> {
        let row = sqlx::query_as::<_, PgIdentityRow>(&identity_query("u.username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(row.map(PgIdentityRow::into_credential))
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>> {
        let rows = sqlx::query_as::<_, PgIdentityRow>(&identity_query(
            r#"EXISTS (
                SELECT 1 FROM user_groups ug2
                JOIN groups g2 ON g2.id = ug2.group_id
                WHERE ug2.user_id = u.id AND g2.name = $1
            )"#,
        ))
        .bind(role.group_name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(Identity::from).collect())
    }

    async fn update_identity(
        &self,
        id: UserId,
        update: IdentityUpdate,
    ) -> Result<Option<Identity>> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.username)
        .bind(update.password_hash)
        .execute(&self.pool)
        .await
        .map_err(username_conflict)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_identity(id).await
    }

    async fn delete_identity(&self, id: UserId) -> Result<bool> {
        // Records, tokens, group and department memberships cascade.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ── PgDepartmentStore ─────────────────────────────────────────

pub struct PgDepartmentStore {
    pool: PgPool,
}

impl PgDepartmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartmentStore for PgDepartmentStore {
    async fn list_departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, PgDepartmentRow>(
            "SELECT id, name, diagnostics, location, specialization FROM departments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    async fn create_department(&self, new: NewDepartment) -> Result<Department> {
        let row = sqlx::query_as::<_, PgDepartmentRow>(
            r#"
            INSERT INTO departments (name, diagnostics, location, specialization)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, diagnostics, location, specialization
            "#,
        )
        .bind(&new.name)
        .bind(&new.diagnostics)
        .bind(&new.location)
        .bind(&new.specialization)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.into())
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, PgDepartmentRow>(
            "SELECT id, name, diagnostics, location, specialization FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(Department::from))
    }

    async fn departments_of_doctor(&self, doctor_id: UserId) -> Result<BTreeSet<DepartmentId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT department_id FROM department_doctors WHERE doctor_id = $1",
        )
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(ids.into_iter().collect())
    }

    async fn doctors_of_department(&self, id: DepartmentId) -> Result<Vec<Identity>> {
        let rows = sqlx::query_as::<_, PgIdentityRow>(&identity_query(
            "u.id IN (SELECT doctor_id FROM department_doctors WHERE department_id = $1)",
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(Identity::from).collect())
    }

    async fn patients_of_department(&self, id: DepartmentId) -> Result<Vec<Identity>> {
        let rows = sqlx::query_as::<_, PgIdentityRow>(&identity_query(
            "u.id IN (SELECT patient_id FROM patient_records WHERE department_id = $1)",
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(Identity::from).collect())
    }

    async fn set_department_doctors(&self, id: DepartmentId, doctors: &[UserId]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;

        sqlx::query("DELETE FROM department_doctors WHERE department_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| anyhow!(e))?;

        sqlx::query(
            r#"
            INSERT INTO department_doctors (department_id, doctor_id)
            SELECT $1, unnest($2::bigint[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(doctors)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                HospitalError::InvalidInput("Invalid department or doctor.".into())
            }
            _ => HospitalError::Internal(anyhow!(e)),
        })?;

        tx.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }
}

// ── PgRecordStore ─────────────────────────────────────────────

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_records(&self, scope: &RecordScope) -> Result<Vec<PatientRecord>> {
        let rows = match scope {
            RecordScope::OwnedBy(patient_id) => {
                sqlx::query_as::<_, PgRecordRow>(&format!(
                    "SELECT {RECORD_COLUMNS} FROM patient_records \
                     WHERE patient_id = $1 ORDER BY record_id"
                ))
                .bind(*patient_id)
                .fetch_all(&self.pool)
                .await
            }
            RecordScope::Departments(departments) => {
                let departments: Vec<i64> = departments.iter().copied().collect();
                sqlx::query_as::<_, PgRecordRow>(&format!(
                    r#"
                    SELECT {RECORD_COLUMNS} FROM patient_records r
                    WHERE r.department_id = ANY($1)
                      AND EXISTS (
                          SELECT 1 FROM user_groups ug
                          JOIN groups g ON g.id = ug.group_id
                          WHERE ug.user_id = r.patient_id AND g.name = $2
                      )
                    ORDER BY r.record_id
                    "#
                ))
                .bind(departments)
                .bind(Role::Patient.group_name())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(PatientRecord::from).collect())
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<PatientRecord>> {
        let row = sqlx::query_as::<_, PgRecordRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM patient_records WHERE record_id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(PatientRecord::from))
    }

    async fn create_record(&self, new: NewPatientRecord) -> Result<PatientRecord> {
        let row = sqlx::query_as::<_, PgRecordRow>(&format!(
            r#"
            INSERT INTO patient_records
                (patient_id, department_id, diagnostics, observations, treatments, misc)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(new.patient_id)
        .bind(new.department_id)
        .bind(&new.diagnostics)
        .bind(&new.observations)
        .bind(&new.treatments)
        .bind(&new.misc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                HospitalError::InvalidInput("Invalid patient or department.".into())
            }
            _ => HospitalError::Internal(anyhow!(e)),
        })?;
        Ok(row.into())
    }

    async fn update_record(
        &self,
        id: RecordId,
        patch: &RecordPatch,
    ) -> Result<Option<PatientRecord>> {
        let row = sqlx::query_as::<_, PgRecordRow>(&format!(
            r#"
            UPDATE patient_records
            SET diagnostics = COALESCE($2, diagnostics),
                observations = COALESCE($3, observations),
                treatments = COALESCE($4, treatments)
            WHERE record_id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.diagnostics.as_deref())
        .bind(patch.observations.as_deref())
        .bind(patch.treatments.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(PatientRecord::from))
    }

    async fn delete_record(&self, id: RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM patient_records WHERE record_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ── PgTokenStore ──────────────────────────────────────────────

pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn insert_token(&self, token: &AuthToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (key, user_id, created, expires)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.key)
        .bind(token.user_id)
        .bind(token.created)
        .bind(token.expires)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn find_active(&self, key: &str, now: DateTime<Utc>) -> Result<Option<AuthToken>> {
        let row = sqlx::query_as::<_, PgTokenRow>(
            r#"
            SELECT key, user_id, created, expires
            FROM auth_tokens
            WHERE key = $1 AND expires > $2
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(AuthToken::from))
    }

    async fn expire_token(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        // LEAST keeps the expiry inside the issued grant.
        let result = sqlx::query(
            r#"
            UPDATE auth_tokens
            SET expires = LEAST(expires, $2)
            WHERE key = $1 AND expires > $2
            "#,
        )
        .bind(key)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected() > 0)
    }
}
