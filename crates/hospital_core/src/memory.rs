//! In-memory implementation of every store port.
//!
//! Backs the server when no database URL is configured, and the test
//! suites. All tables sit behind one `RwLock`, so each port call is atomic
//! with respect to the others, which also makes the cascades below
//! consistent.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::HospitalError;
use crate::policy::RecordScope;
use crate::ports::{DepartmentStore, IdentityStore, RecordStore, Result, TokenStore};
use crate::types::*;

#[derive(Debug, Clone)]
struct UserRow {
    identity: Identity,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Tables {
    next_user_id: UserId,
    next_department_id: DepartmentId,
    next_record_id: RecordId,
    users: BTreeMap<UserId, UserRow>,
    departments: BTreeMap<DepartmentId, Department>,
    /// (department, doctor)
    memberships: BTreeSet<(DepartmentId, UserId)>,
    records: BTreeMap<RecordId, PatientRecord>,
    tokens: HashMap<String, AuthToken>,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|row| row.identity.username == username && Some(row.identity.id) != except)
    }

    fn is_patient(&self, user_id: UserId) -> bool {
        self.users
            .get(&user_id)
            .is_some_and(|row| row.identity.has_role(Role::Patient))
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_identity(&self, new: NewIdentity) -> Result<Identity> {
        let mut t = self.tables.write().await;
        if t.username_taken(&new.username, None) {
            return Err(HospitalError::Conflict("Username already taken.".into()));
        }
        let identity = Identity {
            id: next_id(&mut t.next_user_id),
            username: new.username,
            roles: BTreeSet::from([new.role]),
            date_joined: Utc::now(),
        };
        t.users.insert(
            identity.id,
            UserRow {
                identity: identity.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(identity)
    }

    async fn get_identity(&self, id: UserId) -> Result<Option<Identity>> {
        let t = self.tables.read().await;
        Ok(t.users.get(&id).map(|row| row.identity.clone()))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.tables.read().await.username_taken(username, None))
    }

    async fn find_credential(&self, username: &str) -> Result<Option<StoredCredential>> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .values()
            .find(|row| row.identity.username == username)
            .map(|row| StoredCredential {
                identity: row.identity.clone(),
                password_hash: row.password_hash.clone(),
            }))
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .values()
            .filter(|row| row.identity.has_role(role))
            .map(|row| row.identity.clone())
            .collect())
    }

    async fn update_identity(
        &self,
        id: UserId,
        update: IdentityUpdate,
    ) -> Result<Option<Identity>> {
        let mut t = self.tables.write().await;
        if let Some(username) = &update.username {
            if t.username_taken(username, Some(id)) {
                return Err(HospitalError::Conflict("Username already taken.".into()));
            }
        }
        let Some(row) = t.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = update.username {
            row.identity.username = username;
        }
        if let Some(hash) = update.password_hash {
            row.password_hash = hash;
        }
        Ok(Some(row.identity.clone()))
    }

    async fn delete_identity(&self, id: UserId) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.records.retain(|_, r| r.patient_id != id);
        t.tokens.retain(|_, token| token.user_id != id);
        t.memberships.retain(|(_, doctor)| *doctor != id);
        Ok(true)
    }
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn list_departments(&self) -> Result<Vec<Department>> {
        Ok(self.tables.read().await.departments.values().cloned().collect())
    }

    async fn create_department(&self, new: NewDepartment) -> Result<Department> {
        let mut t = self.tables.write().await;
        let department = Department {
            id: next_id(&mut t.next_department_id),
            name: new.name,
            diagnostics: new.diagnostics,
            location: new.location,
            specialization: new.specialization,
        };
        t.departments.insert(department.id, department.clone());
        Ok(department)
    }

    async fn get_department(&self, id: DepartmentId) -> Result<Option<Department>> {
        Ok(self.tables.read().await.departments.get(&id).cloned())
    }

    async fn departments_of_doctor(&self, doctor_id: UserId) -> Result<BTreeSet<DepartmentId>> {
        let t = self.tables.read().await;
        Ok(t
            .memberships
            .iter()
            .filter(|(_, doctor)| *doctor == doctor_id)
            .map(|(department, _)| *department)
            .collect())
    }

    async fn doctors_of_department(&self, id: DepartmentId) -> Result<Vec<Identity>> {
        let t = self.tables.read().await;
        Ok(t
            .memberships
            .iter()
            .filter(|(department, _)| *department == id)
            .filter_map(|(_, doctor)| t.users.get(doctor))
            .map(|row| row.identity.clone())
            .collect())
    }

    async fn patients_of_department(&self, id: DepartmentId) -> Result<Vec<Identity>> {
        let t = self.tables.read().await;
        let patient_ids: BTreeSet<UserId> = t
            .records
            .values()
            .filter(|r| r.department_id == id)
            .map(|r| r.patient_id)
            .collect();
        Ok(patient_ids
            .iter()
            .filter_map(|pid| t.users.get(pid))
            .map(|row| row.identity.clone())
            .collect())
    }

    async fn set_department_doctors(&self, id: DepartmentId, doctors: &[UserId]) -> Result<()> {
        let mut t = self.tables.write().await;
        if !t.departments.contains_key(&id) {
            return Err(HospitalError::NotFound("Department not found".into()));
        }
        t.memberships.retain(|(department, _)| *department != id);
        for doctor in doctors {
            t.memberships.insert((id, *doctor));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_records(&self, scope: &RecordScope) -> Result<Vec<PatientRecord>> {
        let t = self.tables.read().await;
        Ok(t
            .records
            .values()
            .filter(|r| scope.admits(r, t.is_patient(r.patient_id)))
            .cloned()
            .collect())
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<PatientRecord>> {
        Ok(self.tables.read().await.records.get(&id).cloned())
    }

    async fn create_record(&self, new: NewPatientRecord) -> Result<PatientRecord> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&new.patient_id) {
            return Err(HospitalError::InvalidInput("Invalid patient.".into()));
        }
        if !t.departments.contains_key(&new.department_id) {
            return Err(HospitalError::InvalidInput("Invalid department.".into()));
        }
        let record = PatientRecord {
            record_id: next_id(&mut t.next_record_id),
            patient_id: new.patient_id,
            created_date: Utc::now(),
            diagnostics: new.diagnostics,
            observations: new.observations,
            treatments: new.treatments,
            department_id: new.department_id,
            misc: new.misc,
        };
        t.records.insert(record.record_id, record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        id: RecordId,
        patch: &RecordPatch,
    ) -> Result<Option<PatientRecord>> {
        let mut t = self.tables.write().await;
        Ok(t.records.get_mut(&id).map(|record| {
            patch.apply_to(record);
            record.clone()
        }))
    }

    async fn delete_record(&self, id: RecordId) -> Result<bool> {
        Ok(self.tables.write().await.records.remove(&id).is_some())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, token: &AuthToken) -> Result<()> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&token.user_id) {
            return Err(HospitalError::InvalidInput("Unknown user.".into()));
        }
        t.tokens.insert(token.key.clone(), token.clone());
        Ok(())
    }

    async fn find_active(&self, key: &str, now: DateTime<Utc>) -> Result<Option<AuthToken>> {
        let t = self.tables.read().await;
        Ok(t.tokens.get(key).filter(|token| token.is_active(now)).cloned())
    }

    async fn expire_token(&self, key: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut t = self.tables.write().await;
        match t.tokens.get_mut(key) {
            Some(token) if token.is_active(now) => {
                token.revoke(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
