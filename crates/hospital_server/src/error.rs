//! HTTP error mapping: `HospitalError` to `{"detail": ...}` responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hospital_core::{proto::DetailResponse, HospitalError};

/// Wrapper so handlers can return `Result<_, AppError>` and use `?` on
/// service calls.
#[derive(Debug)]
pub struct AppError(pub HospitalError);

impl From<HospitalError> for AppError {
    fn from(err: HospitalError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self(HospitalError::InvalidInput(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "unmatched path parameter");
        Self(HospitalError::NotFound("Not found.".into()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self.0 {
            HospitalError::Internal(cause) => {
                tracing::error!(error = ?cause, "request failed");
            }
            HospitalError::Unauthorized(_) | HospitalError::Unauthenticated(_) => {
                tracing::debug!(%status, detail = %self.0.detail(), "request denied");
            }
            _ => {}
        }

        let mut response = (status, Json(DetailResponse::new(self.0.detail()))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
