//! Access policy engine.
//!
//! Pure decision functions: given a principal, the target resource and the
//! requested operation, return allow/deny or the visible record scope. No
//! I/O happens here; the service loads whatever the decision needs
//! (target identity, record, the caller's departments) and calls in.
//!
//! Every decision is evaluated before any mutation, so a denial never leaves
//! partial state behind.

use std::collections::BTreeSet;

use crate::error::HospitalError;
use crate::principal::Principal;
use crate::types::{DepartmentId, Identity, PatientRecord, Role, UserId};

pub type Result<T> = std::result::Result<T, HospitalError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Update,
    Delete,
}

/// Access level a principal holds on a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAccess {
    Denied,
    ReadOnly,
    ReadWrite,
}

impl RecordAccess {
    pub fn permits(self, op: Operation) -> bool {
        match self {
            Self::Denied => false,
            Self::ReadOnly => op == Operation::Read,
            Self::ReadWrite => true,
        }
    }
}

/// The subset of records a list request may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordScope {
    /// Records owned by this patient identity.
    OwnedBy(UserId),
    /// Records in any of these departments whose patient is in `Patients`.
    Departments(BTreeSet<DepartmentId>),
}

impl RecordScope {
    /// Whether `record` falls inside the scope. `patient_is_patient` is the
    /// record owner's membership in `Patients`.
    pub fn admits(&self, record: &PatientRecord, patient_is_patient: bool) -> bool {
        match self {
            Self::OwnedBy(user_id) => record.patient_id == *user_id,
            Self::Departments(departments) => {
                patient_is_patient && departments.contains(&record.department_id)
            }
        }
    }
}

// ── Identity listings and detail ──────────────────────────────

/// Doctor and patient listings, and staff account creation.
pub fn manage_staff(principal: &Principal) -> Result<()> {
    principal.require_doctor()
}

/// Detail access on a doctor or patient identity.
///
/// The target must carry `role`, else it reads as not found. Doctor detail
/// is self-only; patient detail is open to the patient and to any doctor.
pub fn identity_detail(principal: &Principal, role: Role, target: &Identity) -> Result<()> {
    if !target.has_role(role) {
        return Err(HospitalError::NotFound(format!("{} not found", role.label())));
    }
    let allowed = match role {
        Role::Doctor => principal.is(target.id),
        Role::Patient => principal.is(target.id) || principal.is_doctor(),
    };
    if allowed {
        Ok(())
    } else {
        Err(HospitalError::not_authorized())
    }
}

// ── Patient records ───────────────────────────────────────────

/// Visible record set for a list request. `departments` are the caller's
/// departments and only matter for doctors.
pub fn record_scope(principal: &Principal, departments: &BTreeSet<DepartmentId>) -> RecordScope {
    if principal.is_doctor() {
        RecordScope::Departments(departments.clone())
    } else {
        RecordScope::OwnedBy(principal.user_id)
    }
}

/// Access level on a single record.
///
/// The owning patient branch wins: a principal who owns the record reads it
/// and never gains write access through the doctor branch.
pub fn record_access(
    principal: &Principal,
    record: &PatientRecord,
    departments: &BTreeSet<DepartmentId>,
) -> RecordAccess {
    if principal.is(record.patient_id) {
        RecordAccess::ReadOnly
    } else if principal.is_doctor() && departments.contains(&record.department_id) {
        RecordAccess::ReadWrite
    } else {
        RecordAccess::Denied
    }
}

pub fn authorize_record(
    principal: &Principal,
    record: &PatientRecord,
    departments: &BTreeSet<DepartmentId>,
    op: Operation,
) -> Result<()> {
    if record_access(principal, record, departments).permits(op) {
        Ok(())
    } else {
        Err(HospitalError::not_authorized())
    }
}

pub fn create_record(principal: &Principal) -> Result<()> {
    principal.require_doctor()
}

// ── Departments ───────────────────────────────────────────────

/// Department listing. With `public` set, anonymous callers may read.
pub fn list_departments(principal: Option<&Principal>, public: bool) -> Result<()> {
    if public || principal.is_some() {
        Ok(())
    } else {
        Err(HospitalError::Unauthenticated(
            "Authentication credentials were not provided.".into(),
        ))
    }
}

/// Department creation and the doctor/patient sub-listings.
pub fn manage_department(principal: &Principal) -> Result<()> {
    principal.require_doctor()
}
