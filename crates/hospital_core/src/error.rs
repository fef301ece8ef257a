use thiserror::Error;

#[derive(Debug, Error)]
pub enum HospitalError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Authenticated, but the role or ownership check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No credentials, or credentials that do not resolve to a live token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HospitalError {
    pub fn not_authorized() -> Self {
        Self::Unauthorized("Not authorized".into())
    }

    /// Username collisions surface as a client error, not 409.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Unauthorized(_) => 403,
            Self::Unauthenticated(_) => 401,
            Self::Conflict(_) => 400,
            Self::InvalidInput(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Client-facing message for the `{"detail": ...}` body.
    /// Internal causes are never exposed.
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Unauthenticated(msg)
            | Self::Conflict(msg)
            | Self::InvalidInput(msg) => msg.clone(),
            Self::Internal(_) => "Internal server error".into(),
        }
    }
}
