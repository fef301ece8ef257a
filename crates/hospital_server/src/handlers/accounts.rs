//! Registration, login and logout.
//!
//! POST /register/ — create a Doctor or Patient identity and mint a token
//! POST /login/    — exchange credentials for a fresh token
//! POST /logout/   — expire the caller's token

use std::sync::Arc;

use axum::{http::HeaderMap, http::StatusCode, Extension, Json};
use hospital_core::{
    proto::{DetailResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    HospitalError, HospitalService,
};

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::middleware::auth::bearer_key;

pub async fn register(
    Extension(service): Extension<Arc<dyn HospitalService>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let resp = service.register(req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

pub async fn login(
    Extension(service): Extension<Arc<dyn HospitalService>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(service.login(req).await?))
}

/// Reads the header itself: an expired token must reach the service and
/// come back as 404, not be turned away as 401 by the auth layer.
pub async fn logout(
    Extension(service): Extension<Arc<dyn HospitalService>>,
    headers: HeaderMap,
) -> Result<Json<DetailResponse>, AppError> {
    let key = bearer_key(&headers)?.ok_or_else(|| {
        HospitalError::Unauthenticated("Authentication credentials were not provided.".into())
    })?;
    service.logout(&key).await?;
    Ok(Json(DetailResponse::new("Successfully logged out.")))
}
