//! Request and response shapes shared by the service and the HTTP layer.
//!
//! Request fields are `Option` so that missing input surfaces as a
//! validation error with a readable message rather than a decode failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DepartmentId, UserId};

/// `{"detail": "..."}`: every informational and error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

// ── Accounts ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
    pub username: String,
    /// Echoes the group name as the client sent it.
    pub group: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Staff-created account (`POST /doctors/`, `POST /patients/`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Partial account update on the detail endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdateRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

// ── Records ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRecordRequest {
    pub patient: Option<UserId>,
    pub department: Option<DepartmentId>,
    pub diagnostics: Option<String>,
    pub observations: Option<String>,
    pub treatments: Option<String>,
    pub misc: Option<String>,
}

// ── Departments ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: Option<String>,
    pub diagnostics: Option<String>,
    pub location: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentDoctorsRequest {
    pub doctors: Option<Vec<UserId>>,
}

/// Trim a required text field; `None` when absent or blank.
pub fn required(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Like [`required`] but keeps the value verbatim. Used for passwords.
pub fn present(field: &Option<String>) -> Option<String> {
    field.as_ref().filter(|v| !v.is_empty()).cloned()
}
