//! Hospital records core — domain types, access policy, storage ports and
//! the service that composes them. Storage-agnostic: Postgres adapters live
//! in `hospital_postgres`, the HTTP surface in `hospital_server`.

pub mod credentials;
pub mod error;
pub mod memory;
pub mod policy;
pub mod ports;
pub mod principal;
pub mod proto;
pub mod seeds;
pub mod service;
pub mod types;

pub use error::HospitalError;
pub use principal::Principal;
pub use service::{HospitalService, HospitalServiceImpl, ServiceSettings};
