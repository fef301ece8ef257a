//! Department handlers.
//!
//! GET  /departments/                — list (authenticated unless configured public)
//! POST /departments/                — create (Doctors)
//! GET  /department/:id/doctors/     — member doctors
//! PUT  /department/:id/doctors/     — replace doctor membership
//! GET  /department/:id/patients/   — patients holding records here
//! PUT  /department/:id/patients/   — acknowledged, membership follows records

use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use hospital_core::{
    proto::{CreateDepartmentRequest, DepartmentDoctorsRequest, DetailResponse},
    types::{Department, DepartmentId, IdentitySummary},
    HospitalService, Principal,
};

use crate::error::AppError;
use crate::extract::{IdPath, JsonBody};

pub async fn list_departments(
    Extension(principal): Extension<Option<Principal>>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
) -> Result<Json<Vec<Department>>, AppError> {
    Ok(Json(service.list_departments(principal.as_ref()).await?))
}

pub async fn create_department(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    JsonBody(req): JsonBody<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    let department = service.create_department(&principal, req).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn department_doctors(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    IdPath(id): IdPath<DepartmentId>,
) -> Result<Json<Vec<IdentitySummary>>, AppError> {
    Ok(Json(service.department_doctors(&principal, id).await?))
}

pub async fn set_department_doctors(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    IdPath(id): IdPath<DepartmentId>,
    JsonBody(req): JsonBody<DepartmentDoctorsRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    service.set_department_doctors(&principal, id, req).await?;
    Ok(Json(DetailResponse::new("Doctors updated")))
}

pub async fn department_patients(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    IdPath(id): IdPath<DepartmentId>,
) -> Result<Json<Vec<IdentitySummary>>, AppError> {
    Ok(Json(service.department_patients(&principal, id).await?))
}

pub async fn acknowledge_department_patients(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    IdPath(id): IdPath<DepartmentId>,
) -> Result<Json<DetailResponse>, AppError> {
    service.acknowledge_department_patients(&principal, id).await?;
    Ok(Json(DetailResponse::new("Patients updated")))
}
