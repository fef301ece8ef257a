//! Doctor and patient account endpoints.
//!
//! GET/POST          /doctors/       /patients/
//! GET/PUT/DELETE    /doctors/:id/   /patients/:id/
//!
//! Both resources share one implementation parameterised by `Role`; the
//! policy engine decides who may see or change which account.

use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use hospital_core::{
    proto::{AccountRequest, AccountUpdateRequest, DetailResponse},
    types::{IdentitySummary, Role, UserId},
    HospitalService, Principal,
};

use crate::error::AppError;
use crate::extract::{IdPath, JsonBody};

type Service = Extension<Arc<dyn HospitalService>>;

async fn list(
    service: &dyn HospitalService,
    principal: &Principal,
    role: Role,
) -> Result<Json<Vec<IdentitySummary>>, AppError> {
    Ok(Json(service.list_accounts(principal, role).await?))
}

async fn create(
    service: &dyn HospitalService,
    principal: &Principal,
    role: Role,
    req: AccountRequest,
) -> Result<(StatusCode, Json<IdentitySummary>), AppError> {
    let created = service.create_account(principal, role, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update(
    service: &dyn HospitalService,
    principal: &Principal,
    role: Role,
    id: UserId,
    req: AccountUpdateRequest,
) -> Result<Json<DetailResponse>, AppError> {
    service.update_account(principal, role, id, req).await?;
    Ok(Json(DetailResponse::new(format!("{} updated", role.label()))))
}

async fn delete(
    service: &dyn HospitalService,
    principal: &Principal,
    role: Role,
    id: UserId,
) -> Result<StatusCode, AppError> {
    service.delete_account(principal, role, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Doctors ──

pub async fn list_doctors(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
) -> Result<Json<Vec<IdentitySummary>>, AppError> {
    list(service.as_ref(), &principal, Role::Doctor).await
}

pub async fn create_doctor(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    JsonBody(req): JsonBody<AccountRequest>,
) -> Result<(StatusCode, Json<IdentitySummary>), AppError> {
    create(service.as_ref(), &principal, Role::Doctor, req).await
}

pub async fn get_doctor(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    IdPath(id): IdPath<UserId>,
) -> Result<Json<IdentitySummary>, AppError> {
    Ok(Json(service.get_account(&principal, Role::Doctor, id).await?))
}

pub async fn update_doctor(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    IdPath(id): IdPath<UserId>,
    JsonBody(req): JsonBody<AccountUpdateRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    update(service.as_ref(), &principal, Role::Doctor, id, req).await
}

pub async fn delete_doctor(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    IdPath(id): IdPath<UserId>,
) -> Result<StatusCode, AppError> {
    delete(service.as_ref(), &principal, Role::Doctor, id).await
}

// ── Patients ──

pub async fn list_patients(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
) -> Result<Json<Vec<IdentitySummary>>, AppError> {
    list(service.as_ref(), &principal, Role::Patient).await
}

pub async fn create_patient(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    JsonBody(req): JsonBody<AccountRequest>,
) -> Result<(StatusCode, Json<IdentitySummary>), AppError> {
    create(service.as_ref(), &principal, Role::Patient, req).await
}

pub async fn get_patient(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    IdPath(id): IdPath<UserId>,
) -> Result<Json<IdentitySummary>, AppError> {
    Ok(Json(service.get_account(&principal, Role::Patient, id).await?))
}

pub async fn update_patient(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    IdPath(id): IdPath<UserId>,
    JsonBody(req): JsonBody<AccountUpdateRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    update(service.as_ref(), &principal, Role::Patient, id, req).await
}

pub async fn delete_patient(
    Extension(principal): Extension<Principal>,
    Extension(service): Service,
    IdPath(id): IdPath<UserId>,
) -> Result<StatusCode, AppError> {
    delete(service.as_ref(), &principal, Role::Patient, id).await
}
