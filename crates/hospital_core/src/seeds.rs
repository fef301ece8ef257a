//! Demo account seeding.
//!
//! Create-if-absent: running it again leaves existing accounts untouched.
//! Groups are static and ship with the schema, so only identities are seeded.

use crate::credentials;
use crate::error::HospitalError;
use crate::ports::IdentityStore;
use crate::types::{NewIdentity, Role};

pub const DEFAULT_SEED_PASSWORD: &str = "admin2001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub username: String,
    pub role: Role,
}

/// The demo doctor and patient.
pub fn demo_accounts() -> Vec<SeedAccount> {
    vec![
        SeedAccount {
            username: "dr_jones".into(),
            role: Role::Doctor,
        },
        SeedAccount {
            username: "john_doe".into(),
            role: Role::Patient,
        },
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: u32,
    pub existing: u32,
}

pub async fn seed_accounts(
    identities: &dyn IdentityStore,
    accounts: &[SeedAccount],
    password: &str,
) -> Result<SeedReport, HospitalError> {
    let mut report = SeedReport::default();
    for account in accounts {
        if identities.username_exists(&account.username).await? {
            report.existing += 1;
            continue;
        }
        let password_hash = credentials::hash_password_blocking(password.to_owned()).await?;
        match identities
            .create_identity(NewIdentity {
                username: account.username.clone(),
                password_hash,
                role: account.role,
            })
            .await
        {
            Ok(identity) => {
                tracing::info!(
                    user_id = identity.id,
                    username = %identity.username,
                    group = account.role.group_name(),
                    "seeded account"
                );
                report.created += 1;
            }
            // Another instance seeded it between the check and the insert.
            Err(HospitalError::Conflict(_)) => report.existing += 1,
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}
