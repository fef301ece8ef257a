use std::collections::BTreeSet;

use crate::error::HospitalError;
use crate::types::{Identity, Role, UserId};

/// The authenticated caller attached to a request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub roles: BTreeSet<Role>,
    /// Token key the request authenticated with, if any.
    pub token: Option<String>,
}

impl Principal {
    /// Construct from an identity resolved through a bearer token.
    /// The auth middleware calls this; handlers never read raw tokens.
    pub fn from_identity(identity: &Identity, token: Option<String>) -> Self {
        Self {
            user_id: identity.id,
            username: identity.username.clone(),
            roles: identity.roles.clone(),
            token,
        }
    }

    /// Construct explicitly for in-process callers and tests.
    pub fn in_process(
        user_id: UserId,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            user_id,
            username: username.into(),
            roles: roles.into_iter().collect(),
            token: None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_doctor(&self) -> bool {
        self.has_role(Role::Doctor)
    }

    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn require_role(&self, role: Role) -> Result<(), HospitalError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(HospitalError::not_authorized())
        }
    }

    pub fn require_doctor(&self) -> Result<(), HospitalError> {
        self.require_role(Role::Doctor)
    }
}
