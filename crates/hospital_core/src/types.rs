//! Core domain types for the hospital records service.
//! Pure value types. No sqlx, no DB dependencies.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type DepartmentId = i64;
pub type RecordId = i64;

// ── Roles ─────────────────────────────────────────────────────

/// Fixed group membership. Groups are seeded with the schema and never
/// created or destroyed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Patient,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Doctor, Role::Patient];

    /// Name of the backing group row.
    pub fn group_name(&self) -> &'static str {
        match self {
            Self::Doctor => "Doctors",
            Self::Patient => "Patients",
        }
    }

    pub fn from_group_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.group_name() == name)
    }

    /// Parse the role name a client supplies at registration.
    /// Accepts "doctor" or "patient" (case-insensitive).
    pub fn parse(requested: &str) -> Option<Self> {
        match requested.trim().to_ascii_lowercase().as_str() {
            "doctor" => Some(Self::Doctor),
            "patient" => Some(Self::Patient),
            _ => None,
        }
    }

    /// Noun used in client-facing messages ("Doctor not found").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Doctor => "Doctor",
            Self::Patient => "Patient",
        }
    }
}

// ── Identities ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub roles: BTreeSet<Role>,
    pub date_joined: DateTime<Utc>,
}

impl Identity {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Identity together with its password hash. Only the login path reads this.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub identity: Identity,
    pub password_hash: String,
}

/// `{id, username}`, the shape every identity listing returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial identity update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct IdentityUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

// ── Departments ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub diagnostics: String,
    pub location: String,
    pub specialization: String,
}

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub name: String,
    pub diagnostics: String,
    pub location: String,
    pub specialization: String,
}

// ── Patient records ───────────────────────────────────────────

/// A stored patient record. Serialises with raw foreign keys, the shape
/// used by record listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub record_id: RecordId,
    pub patient_id: UserId,
    pub created_date: DateTime<Utc>,
    pub diagnostics: String,
    pub observations: String,
    pub treatments: String,
    pub department_id: DepartmentId,
    pub misc: String,
}

#[derive(Debug, Clone)]
pub struct NewPatientRecord {
    pub patient_id: UserId,
    pub department_id: DepartmentId,
    pub diagnostics: String,
    pub observations: String,
    pub treatments: String,
    pub misc: String,
}

/// Partial clinical update. Only these three fields are writable after
/// creation; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordPatch {
    pub diagnostics: Option<String>,
    pub observations: Option<String>,
    pub treatments: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_none() && self.observations.is_none() && self.treatments.is_none()
    }

    pub fn apply_to(&self, record: &mut PatientRecord) {
        if let Some(v) = &self.diagnostics {
            record.diagnostics = v.clone();
        }
        if let Some(v) = &self.observations {
            record.observations = v.clone();
        }
        if let Some(v) = &self.treatments {
            record.treatments = v.clone();
        }
    }
}

/// Single-record view with the patient and department resolved to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDetail {
    pub record_id: RecordId,
    pub patient: String,
    pub diagnostics: String,
    pub observations: String,
    pub treatments: String,
    pub department: String,
    pub created_date: DateTime<Utc>,
}

impl RecordDetail {
    pub fn new(record: PatientRecord, patient: &Identity, department: &Department) -> Self {
        Self {
            record_id: record.record_id,
            patient: patient.username.clone(),
            diagnostics: record.diagnostics,
            observations: record.observations,
            treatments: record.treatments,
            department: department.name.clone(),
            created_date: record.created_date,
        }
    }
}

// ── Tokens ────────────────────────────────────────────────────

/// Opaque bearer token. Revocation moves `expires` to the revocation
/// instant; it never moves later than the issued grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub key: String,
    pub user_id: UserId,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl AuthToken {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }

    /// Expire at `now` unless already expired earlier.
    pub fn revoke(&mut self, now: DateTime<Utc>) {
        self.expires = self.expires.min(now);
    }
}
