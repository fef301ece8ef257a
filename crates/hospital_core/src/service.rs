//! HospitalService — the central domain service.
//!
//! Takes port traits via `Arc<dyn PortTrait>` so that the same logic works
//! against Postgres (`hospital_postgres::PgStores`) or the in-memory store.
//! Every operation loads what the policy engine needs, asks it for a
//! decision, and only then touches storage.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{
    credentials,
    error::HospitalError,
    policy::{self, Operation},
    ports::{DepartmentStore, IdentityStore, RecordStore, TokenStore},
    principal::Principal,
    proto::*,
    types::*,
};

pub type Result<T> = std::result::Result<T, HospitalError>;

/// Lifetime of issued tokens when nothing else is configured (10 hours).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 36_000;

/// Column widths of `users.username` and the short `departments` fields.
pub const USERNAME_MAX_CHARS: usize = 150;
pub const DEPARTMENT_FIELD_MAX_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub token_ttl: Duration,
    /// Allow unauthenticated reads of the department list.
    pub public_departments: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            public_departments: false,
        }
    }
}

// ── HospitalService trait ─────────────────────────────────────

/// The service interface the HTTP handlers call.
///
/// All methods that act on behalf of a caller take `&Principal` explicitly:
/// no implicit identity, no thread-local context.
#[async_trait]
pub trait HospitalService: Send + Sync {
    // ── Accounts and tokens ──

    /// Create an identity in the requested group and mint its first token.
    async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse>;

    async fn login(&self, req: LoginRequest) -> Result<LoginResponse>;

    /// Resolve a bearer token to the principal it was issued to.
    async fn authenticate(&self, token_key: &str) -> Result<Principal>;

    /// Expire the token now. `NotFound` if unknown or already expired.
    async fn logout(&self, token_key: &str) -> Result<()>;

    // ── Doctors / patients ──

    async fn list_accounts(&self, principal: &Principal, role: Role)
        -> Result<Vec<IdentitySummary>>;

    async fn create_account(
        &self,
        principal: &Principal,
        role: Role,
        req: AccountRequest,
    ) -> Result<IdentitySummary>;

    async fn get_account(
        &self,
        principal: &Principal,
        role: Role,
        id: UserId,
    ) -> Result<IdentitySummary>;

    async fn update_account(
        &self,
        principal: &Principal,
        role: Role,
        id: UserId,
        req: AccountUpdateRequest,
    ) -> Result<IdentitySummary>;

    async fn delete_account(&self, principal: &Principal, role: Role, id: UserId) -> Result<()>;

    // ── Patient records ──

    async fn list_records(&self, principal: &Principal) -> Result<Vec<PatientRecord>>;

    async fn create_record(
        &self,
        principal: &Principal,
        req: CreateRecordRequest,
    ) -> Result<PatientRecord>;

    async fn get_record(&self, principal: &Principal, id: RecordId) -> Result<RecordDetail>;

    async fn update_record(
        &self,
        principal: &Principal,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<PatientRecord>;

    async fn delete_record(&self, principal: &Principal, id: RecordId) -> Result<()>;

    // ── Departments ──

    async fn list_departments(&self, principal: Option<&Principal>) -> Result<Vec<Department>>;

    async fn create_department(
        &self,
        principal: &Principal,
        req: CreateDepartmentRequest,
    ) -> Result<Department>;

    async fn department_doctors(
        &self,
        principal: &Principal,
        id: DepartmentId,
    ) -> Result<Vec<IdentitySummary>>;

    async fn set_department_doctors(
        &self,
        principal: &Principal,
        id: DepartmentId,
        req: DepartmentDoctorsRequest,
    ) -> Result<()>;

    async fn department_patients(
        &self,
        principal: &Principal,
        id: DepartmentId,
    ) -> Result<Vec<IdentitySummary>>;

    /// Patient membership is derived from records; this only checks access.
    async fn acknowledge_department_patients(
        &self,
        principal: &Principal,
        id: DepartmentId,
    ) -> Result<()>;
}

// ── HospitalServiceImpl ───────────────────────────────────────

/// Concrete implementation holding port trait references.
///
/// Constructed at startup in `hospital_server` from either Postgres stores
/// or a `MemoryStore`.
pub struct HospitalServiceImpl {
    pub identities: Arc<dyn IdentityStore>,
    pub departments: Arc<dyn DepartmentStore>,
    pub records: Arc<dyn RecordStore>,
    pub tokens: Arc<dyn TokenStore>,
    settings: ServiceSettings,
}

impl HospitalServiceImpl {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        departments: Arc<dyn DepartmentStore>,
        records: Arc<dyn RecordStore>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            identities,
            departments,
            records,
            tokens,
            settings: ServiceSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn token_expiry(&self, created: DateTime<Utc>) -> Result<DateTime<Utc>> {
        created
            .checked_add_signed(self.settings.token_ttl)
            .ok_or_else(|| HospitalError::Internal(anyhow!("token lifetime overflows the clock")))
    }

    async fn mint_token(&self, user_id: UserId) -> Result<AuthToken> {
        let created = Utc::now();
        let token = AuthToken {
            key: credentials::generate_token_key(),
            user_id,
            created,
            expires: self.token_expiry(created)?,
        };
        self.tokens.insert_token(&token).await?;
        Ok(token)
    }

    /// The caller's departments. Empty for non-doctors; the policy engine
    /// only consults them on the doctor branch.
    async fn departments_for(&self, principal: &Principal) -> Result<BTreeSet<DepartmentId>> {
        if principal.is_doctor() {
            self.departments
                .departments_of_doctor(principal.user_id)
                .await
        } else {
            Ok(BTreeSet::new())
        }
    }

    /// Load a record and its patient. A record whose owner is not in
    /// `Patients` reads as not found.
    async fn load_record(&self, id: RecordId) -> Result<(PatientRecord, Identity)> {
        let not_found = || HospitalError::NotFound("Record not found".into());
        let record = self.records.get_record(id).await?.ok_or_else(not_found)?;
        let patient = self
            .identities
            .get_identity(record.patient_id)
            .await?
            .filter(|identity| identity.has_role(Role::Patient))
            .ok_or_else(not_found)?;
        Ok((record, patient))
    }

    /// Load a doctor/patient identity and run the detail policy on it.
    async fn load_account(&self, principal: &Principal, role: Role, id: UserId) -> Result<Identity> {
        let target = self
            .identities
            .get_identity(id)
            .await?
            .ok_or_else(|| HospitalError::NotFound(format!("{} not found", role.label())))?;
        policy::identity_detail(principal, role, &target)?;
        Ok(target)
    }

    async fn require_department(&self, id: DepartmentId) -> Result<Department> {
        self.departments
            .get_department(id)
            .await?
            .ok_or_else(|| HospitalError::NotFound("Department not found".into()))
    }

    async fn create_identity(
        &self,
        username: String,
        password: String,
        role: Role,
    ) -> Result<Identity> {
        check_length("Username", &username, USERNAME_MAX_CHARS)?;
        if self.identities.username_exists(&username).await? {
            return Err(HospitalError::Conflict("Username already taken.".into()));
        }
        let password_hash = credentials::hash_password_blocking(password).await?;
        let identity = self
            .identities
            .create_identity(NewIdentity {
                username,
                password_hash,
                role,
            })
            .await?;
        tracing::info!(
            user_id = identity.id,
            group = role.group_name(),
            "identity created"
        );
        Ok(identity)
    }
}

#[async_trait]
impl HospitalService for HospitalServiceImpl {
    async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse> {
        let (Some(username), Some(password), Some(group)) = (
            required(&req.username),
            present(&req.password),
            required(&req.group),
        ) else {
            return Err(HospitalError::InvalidInput(
                "Please provide username, password, and group.".into(),
            ));
        };
        // Validate the group before any write so a bad group leaves no identity.
        let role = Role::parse(&group).ok_or_else(|| {
            HospitalError::InvalidInput(
                "Invalid group. Please choose either Doctor or Patient.".into(),
            )
        })?;

        // A lifetime the clock cannot represent fails here, before any write.
        self.token_expiry(Utc::now())?;
        let identity = self.create_identity(username, password, role).await?;
        let token = match self.mint_token(identity.id).await {
            Ok(token) => token,
            Err(e) => {
                if let Err(cleanup) = self.identities.delete_identity(identity.id).await {
                    tracing::error!(
                        user_id = identity.id,
                        error = %cleanup,
                        "could not remove identity after token issue failed"
                    );
                }
                return Err(e);
            }
        };
        Ok(RegisterResponse {
            token: token.key,
            username: identity.username,
            group,
        })
    }

    async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let (Some(username), Some(password)) = (required(&req.username), present(&req.password))
        else {
            return Err(HospitalError::InvalidInput(
                "Please provide username and password.".into(),
            ));
        };
        let invalid =
            || HospitalError::InvalidInput("Unable to log in with provided credentials.".into());

        let credential = self
            .identities
            .find_credential(&username)
            .await?
            .ok_or_else(|| {
                tracing::debug!(%username, "login for unknown username");
                invalid()
            })?;
        let matches =
            credentials::verify_password_blocking(password, credential.password_hash.clone())
                .await?;
        if !matches {
            tracing::debug!(user_id = credential.identity.id, "login with wrong password");
            return Err(invalid());
        }

        let token = self.mint_token(credential.identity.id).await?;
        tracing::info!(user_id = credential.identity.id, "token issued");
        Ok(LoginResponse {
            token: token.key,
            expires: token.expires,
        })
    }

    async fn authenticate(&self, token_key: &str) -> Result<Principal> {
        let invalid = || HospitalError::Unauthenticated("Invalid token.".into());
        let token = self
            .tokens
            .find_active(token_key, Utc::now())
            .await?
            .ok_or_else(invalid)?;
        let identity = self
            .identities
            .get_identity(token.user_id)
            .await?
            .ok_or_else(invalid)?;
        Ok(Principal::from_identity(&identity, Some(token.key)))
    }

    async fn logout(&self, token_key: &str) -> Result<()> {
        if self.tokens.expire_token(token_key, Utc::now()).await? {
            tracing::info!("token revoked");
            Ok(())
        } else {
            Err(HospitalError::NotFound(
                "Token not found or already expired.".into(),
            ))
        }
    }

    async fn list_accounts(
        &self,
        principal: &Principal,
        role: Role,
    ) -> Result<Vec<IdentitySummary>> {
        policy::manage_staff(principal)?;
        let identities = self.identities.list_by_role(role).await?;
        Ok(identities.iter().map(Identity::summary).collect())
    }

    async fn create_account(
        &self,
        principal: &Principal,
        role: Role,
        req: AccountRequest,
    ) -> Result<IdentitySummary> {
        policy::manage_staff(principal)?;
        let (Some(username), Some(password)) = (required(&req.username), present(&req.password))
        else {
            return Err(HospitalError::InvalidInput(
                "Please provide username and password.".into(),
            ));
        };
        let identity = self.create_identity(username, password, role).await?;
        Ok(identity.summary())
    }

    async fn get_account(
        &self,
        principal: &Principal,
        role: Role,
        id: UserId,
    ) -> Result<IdentitySummary> {
        let target = self.load_account(principal, role, id).await?;
        Ok(target.summary())
    }

    async fn update_account(
        &self,
        principal: &Principal,
        role: Role,
        id: UserId,
        req: AccountUpdateRequest,
    ) -> Result<IdentitySummary> {
        let target = self.load_account(principal, role, id).await?;

        if req.username.is_none() && req.password.is_none() {
            return Err(HospitalError::InvalidInput(
                "Please provide username or password.".into(),
            ));
        }
        let username = match &req.username {
            Some(_) => Some(required(&req.username).ok_or_else(|| {
                HospitalError::InvalidInput("Username may not be blank.".into())
            })?),
            None => None,
        };
        if let Some(name) = &username {
            check_length("Username", name, USERNAME_MAX_CHARS)?;
            if *name != target.username && self.identities.username_exists(name).await? {
                return Err(HospitalError::Conflict("Username already taken.".into()));
            }
        }
        let password_hash = match &req.password {
            Some(_) => {
                let password = present(&req.password).ok_or_else(|| {
                    HospitalError::InvalidInput("Password may not be blank.".into())
                })?;
                Some(credentials::hash_password_blocking(password).await?)
            }
            None => None,
        };

        let updated = self
            .identities
            .update_identity(
                id,
                IdentityUpdate {
                    username,
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| HospitalError::NotFound(format!("{} not found", role.label())))?;
        tracing::info!(user_id = id, actor = principal.user_id, "identity updated");
        Ok(updated.summary())
    }

    async fn delete_account(&self, principal: &Principal, role: Role, id: UserId) -> Result<()> {
        self.load_account(principal, role, id).await?;
        if !self.identities.delete_identity(id).await? {
            return Err(HospitalError::NotFound(format!("{} not found", role.label())));
        }
        tracing::info!(user_id = id, actor = principal.user_id, "identity deleted");
        Ok(())
    }

    async fn list_records(&self, principal: &Principal) -> Result<Vec<PatientRecord>> {
        let departments = self.departments_for(principal).await?;
        let scope = policy::record_scope(principal, &departments);
        self.records.list_records(&scope).await
    }

    async fn create_record(
        &self,
        principal: &Principal,
        req: CreateRecordRequest,
    ) -> Result<PatientRecord> {
        policy::create_record(principal)?;

        let (Some(patient_id), Some(department_id)) = (req.patient, req.department) else {
            return Err(HospitalError::InvalidInput(
                "Please provide patient and department.".into(),
            ));
        };
        let (Some(diagnostics), Some(observations), Some(treatments)) = (
            required(&req.diagnostics),
            required(&req.observations),
            required(&req.treatments),
        ) else {
            return Err(HospitalError::InvalidInput(
                "Please provide diagnostics, observations, and treatments.".into(),
            ));
        };

        let patient_ok = self
            .identities
            .get_identity(patient_id)
            .await?
            .is_some_and(|identity| identity.has_role(Role::Patient));
        if !patient_ok {
            return Err(HospitalError::InvalidInput(
                "Invalid patient. Records can only be created for existing patients.".into(),
            ));
        }
        if self.departments.get_department(department_id).await?.is_none() {
            return Err(HospitalError::InvalidInput("Invalid department.".into()));
        }

        let record = self
            .records
            .create_record(NewPatientRecord {
                patient_id,
                department_id,
                diagnostics,
                observations,
                treatments,
                misc: req.misc.unwrap_or_default(),
            })
            .await?;
        tracing::info!(
            record_id = record.record_id,
            actor = principal.user_id,
            "patient record created"
        );
        Ok(record)
    }

    async fn get_record(&self, principal: &Principal, id: RecordId) -> Result<RecordDetail> {
        let (record, patient) = self.load_record(id).await?;
        let departments = self.departments_for(principal).await?;
        policy::authorize_record(principal, &record, &departments, Operation::Read)?;
        let department = self
            .departments
            .get_department(record.department_id)
            .await?
            .ok_or_else(|| HospitalError::NotFound("Record not found".into()))?;
        Ok(RecordDetail::new(record, &patient, &department))
    }

    async fn update_record(
        &self,
        principal: &Principal,
        id: RecordId,
        patch: RecordPatch,
    ) -> Result<PatientRecord> {
        let (record, _) = self.load_record(id).await?;
        let departments = self.departments_for(principal).await?;
        policy::authorize_record(principal, &record, &departments, Operation::Update)?;
        let updated = self
            .records
            .update_record(id, &patch)
            .await?
            .ok_or_else(|| HospitalError::NotFound("Record not found".into()))?;
        tracing::info!(record_id = id, actor = principal.user_id, "patient record updated");
        Ok(updated)
    }

    async fn delete_record(&self, principal: &Principal, id: RecordId) -> Result<()> {
        let (record, _) = self.load_record(id).await?;
        let departments = self.departments_for(principal).await?;
        policy::authorize_record(principal, &record, &departments, Operation::Delete)?;
        if !self.records.delete_record(id).await? {
            return Err(HospitalError::NotFound("Record not found".into()));
        }
        tracing::info!(record_id = id, actor = principal.user_id, "patient record deleted");
        Ok(())
    }

    async fn list_departments(&self, principal: Option<&Principal>) -> Result<Vec<Department>> {
        policy::list_departments(principal, self.settings.public_departments)?;
        self.departments.list_departments().await
    }

    async fn create_department(
        &self,
        principal: &Principal,
        req: CreateDepartmentRequest,
    ) -> Result<Department> {
        policy::manage_department(principal)?;
        let (Some(name), Some(diagnostics), Some(location), Some(specialization)) = (
            required(&req.name),
            required(&req.diagnostics),
            required(&req.location),
            required(&req.specialization),
        ) else {
            return Err(HospitalError::InvalidInput(
                "Please provide name, diagnostics, location, and specialization.".into(),
            ));
        };
        check_length("Name", &name, DEPARTMENT_FIELD_MAX_CHARS)?;
        check_length("Location", &location, DEPARTMENT_FIELD_MAX_CHARS)?;
        check_length("Specialization", &specialization, DEPARTMENT_FIELD_MAX_CHARS)?;
        let department = self
            .departments
            .create_department(NewDepartment {
                name,
                diagnostics,
                location,
                specialization,
            })
            .await?;
        tracing::info!(department_id = department.id, "department created");
        Ok(department)
    }

    async fn department_doctors(
        &self,
        principal: &Principal,
        id: DepartmentId,
    ) -> Result<Vec<IdentitySummary>> {
        policy::manage_department(principal)?;
        self.require_department(id).await?;
        let doctors = self.departments.doctors_of_department(id).await?;
        Ok(doctors.iter().map(Identity::summary).collect())
    }

    async fn set_department_doctors(
        &self,
        principal: &Principal,
        id: DepartmentId,
        req: DepartmentDoctorsRequest,
    ) -> Result<()> {
        policy::manage_department(principal)?;
        self.require_department(id).await?;
        let requested = req
            .doctors
            .ok_or_else(|| HospitalError::InvalidInput("Please provide doctors.".into()))?;

        let doctors: BTreeSet<UserId> = requested.into_iter().collect();
        for doctor_id in &doctors {
            let is_doctor = self
                .identities
                .get_identity(*doctor_id)
                .await?
                .is_some_and(|identity| identity.has_role(Role::Doctor));
            if !is_doctor {
                return Err(HospitalError::InvalidInput(format!(
                    "User {doctor_id} is not a doctor."
                )));
            }
        }
        let doctors: Vec<UserId> = doctors.into_iter().collect();
        self.departments.set_department_doctors(id, &doctors).await?;
        tracing::info!(
            department_id = id,
            doctors = doctors.len(),
            actor = principal.user_id,
            "department doctors replaced"
        );
        Ok(())
    }

    async fn department_patients(
        &self,
        principal: &Principal,
        id: DepartmentId,
    ) -> Result<Vec<IdentitySummary>> {
        policy::manage_department(principal)?;
        self.require_department(id).await?;
        let patients = self.departments.patients_of_department(id).await?;
        Ok(patients.iter().map(Identity::summary).collect())
    }

    async fn acknowledge_department_patients(
        &self,
        principal: &Principal,
        id: DepartmentId,
    ) -> Result<()> {
        policy::manage_department(principal)?;
        self.require_department(id).await?;
        Ok(())
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(HospitalError::InvalidInput(format!(
            "{field} must have no more than {max} characters."
        )));
    }
    Ok(())
}
