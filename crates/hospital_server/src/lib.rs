//! hospital_server — REST surface for the hospital records service.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod startup;
