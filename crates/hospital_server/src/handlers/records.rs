//! Patient record handlers.
//!
//! GET    /patient_records/      — records visible to the caller
//! POST   /patient_records/      — create (Doctors)
//! GET    /patient_records/:id/  — detail with patient and department names
//! PUT    /patient_records/:id/  — partial update of the clinical fields
//! DELETE /patient_records/:id/

use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use hospital_core::{
    proto::{CreateRecordRequest, DetailResponse},
    types::{PatientRecord, RecordDetail, RecordId, RecordPatch},
    HospitalService, Principal,
};

use crate::error::AppError;
use crate::extract::{IdPath, JsonBody};

pub async fn list_records(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
) -> Result<Json<Vec<PatientRecord>>, AppError> {
    Ok(Json(service.list_records(&principal).await?))
}

pub async fn create_record(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    JsonBody(req): JsonBody<CreateRecordRequest>,
) -> Result<(StatusCode, Json<PatientRecord>), AppError> {
    let record = service.create_record(&principal, req).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_record(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    IdPath(id): IdPath<RecordId>,
) -> Result<Json<RecordDetail>, AppError> {
    Ok(Json(service.get_record(&principal, id).await?))
}

pub async fn update_record(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    IdPath(id): IdPath<RecordId>,
    JsonBody(patch): JsonBody<RecordPatch>,
) -> Result<Json<DetailResponse>, AppError> {
    service.update_record(&principal, id, patch).await?;
    Ok(Json(DetailResponse::new("Record updated")))
}

pub async fn delete_record(
    Extension(principal): Extension<Principal>,
    Extension(service): Extension<Arc<dyn HospitalService>>,
    IdPath(id): IdPath<RecordId>,
) -> Result<StatusCode, AppError> {
    service.delete_record(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
