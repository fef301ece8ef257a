//! Router construction for the hospital records server.

use std::sync::Arc;

use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Extension, Router,
};
use hospital_core::HospitalService;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::auth::{optional_auth, require_auth};

/// Build the full axum router with all routes and middleware.
pub fn build_router(service: Arc<dyn HospitalService>) -> Router {
    // Routes that require a live bearer token
    let protected = Router::new()
        .route(
            "/doctors/",
            get(handlers::staff::list_doctors).post(handlers::staff::create_doctor),
        )
        .route(
            "/doctors/:id/",
            get(handlers::staff::get_doctor)
                .put(handlers::staff::update_doctor)
                .delete(handlers::staff::delete_doctor),
        )
        .route(
            "/patients/",
            get(handlers::staff::list_patients).post(handlers::staff::create_patient),
        )
        .route(
            "/patients/:id/",
            get(handlers::staff::get_patient)
                .put(handlers::staff::update_patient)
                .delete(handlers::staff::delete_patient),
        )
        .route(
            "/patient_records/",
            get(handlers::records::list_records).post(handlers::records::create_record),
        )
        .route(
            "/patient_records/:id/",
            get(handlers::records::get_record)
                .put(handlers::records::update_record)
                .delete(handlers::records::delete_record),
        )
        .route(
            "/department/:id/doctors/",
            get(handlers::departments::department_doctors)
                .put(handlers::departments::set_department_doctors),
        )
        .route(
            "/department/:id/patients/",
            get(handlers::departments::department_patients)
                .put(handlers::departments::acknowledge_department_patients),
        )
        .layer(axum_mw::from_fn(require_auth));

    // Listing takes an optional token and the service decides; creating
    // authenticates before the body is read
    let departments = Router::new().route(
        "/departments/",
        get(handlers::departments::list_departments)
            .layer(axum_mw::from_fn(optional_auth))
            .merge(
                post(handlers::departments::create_department)
                    .layer(axum_mw::from_fn(require_auth)),
            ),
    );

    // Public routes (no auth)
    let public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/register/", post(handlers::accounts::register))
        .route("/login/", post(handlers::accounts::login))
        .route("/logout/", post(handlers::accounts::logout));

    // Combine and add shared state
    public
        .merge(departments)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(service))
}
