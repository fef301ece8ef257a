//! Bearer-token authentication middleware.
//!
//! Resolves `Authorization: Bearer <key>` (or `Token <key>`) through the
//! service and inserts the resulting `Principal` into request extensions.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use hospital_core::{HospitalError, HospitalService, Principal};

use crate::error::AppError;

const SCHEMES: [&str; 2] = ["Bearer", "Token"];

/// Extract the token key from the `Authorization` header.
///
/// `Ok(None)` when the header is absent; `Err` when present but unusable.
pub fn bearer_key(headers: &HeaderMap) -> Result<Option<String>, HospitalError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let malformed = || HospitalError::Unauthenticated("Invalid token header.".into());
    let value = value.to_str().map_err(|_| malformed())?;
    let (scheme, key) = value.trim().split_once(' ').ok_or_else(malformed)?;
    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Err(malformed());
    }
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(malformed());
    }
    Ok(Some(key.to_string()))
}

fn service_of(req: &Request) -> Result<Arc<dyn HospitalService>, AppError> {
    req.extensions()
        .get::<Arc<dyn HospitalService>>()
        .cloned()
        .ok_or_else(|| {
            AppError(HospitalError::Internal(anyhow::anyhow!(
                "HospitalService extension missing"
            )))
        })
}

fn credentials_missing() -> AppError {
    AppError(HospitalError::Unauthenticated(
        "Authentication credentials were not provided.".into(),
    ))
}

/// Reject the request unless it carries an active token.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, AppError> {
    let key = bearer_key(req.headers())?.ok_or_else(credentials_missing)?;
    let service = service_of(&req)?;
    let principal = service.authenticate(&key).await?;
    tracing::debug!(user_id = principal.user_id, "authenticated");
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Attach `Option<Principal>`: `None` without a header, 401 for a bad one.
pub async fn optional_auth(mut req: Request, next: Next) -> Result<Response, AppError> {
    let principal: Option<Principal> = match bearer_key(req.headers())? {
        Some(key) => Some(service_of(&req)?.authenticate(&key).await?),
        None => None,
    };
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
