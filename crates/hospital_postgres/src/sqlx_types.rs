//! Row types decoded by sqlx and their conversions into core types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use hospital_core::types::*;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgIdentityRow {
    pub id: i64,
    pub username: String,
    pub date_joined: DateTime<Utc>,
    pub password_hash: String,
    /// Group names; unknown names are dropped on conversion.
    pub groups: Vec<String>,
}

impl PgIdentityRow {
    fn roles(&self) -> BTreeSet<Role> {
        self.groups
            .iter()
            .filter_map(|name| Role::from_group_name(name))
            .collect()
    }

    pub fn into_credential(self) -> StoredCredential {
        let roles = self.roles();
        StoredCredential {
            identity: Identity {
                id: self.id,
                username: self.username,
                roles,
                date_joined: self.date_joined,
            },
            password_hash: self.password_hash,
        }
    }
}

impl From<PgIdentityRow> for Identity {
    fn from(row: PgIdentityRow) -> Self {
        row.into_credential().identity
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgDepartmentRow {
    pub id: i64,
    pub name: String,
    pub diagnostics: String,
    pub location: String,
    pub specialization: String,
}

impl From<PgDepartmentRow> for Department {
    fn from(row: PgDepartmentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            diagnostics: row.diagnostics,
            location: row.location,
            specialization: row.specialization,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgRecordRow {
    pub record_id: i64,
    pub patient_id: i64,
    pub created_date: DateTime<Utc>,
    pub diagnostics: String,
    pub observations: String,
    pub treatments: String,
    pub department_id: i64,
    pub misc: String,
}

impl From<PgRecordRow> for PatientRecord {
    fn from(row: PgRecordRow) -> Self {
        Self {
            record_id: row.record_id,
            patient_id: row.patient_id,
            created_date: row.created_date,
            diagnostics: row.diagnostics,
            observations: row.observations,
            treatments: row.treatments,
            department_id: row.department_id,
            misc: row.misc,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PgTokenRow {
    pub key: String,
    pub user_id: i64,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl From<PgTokenRow> for AuthToken {
    fn from(row: PgTokenRow) -> Self {
        Self {
            key: row.key,
            user_id: row.user_id,
            created: row.created,
            expires: row.expires,
        }
    }
}
