//! HTTP application wiring (axum router + service wiring).
//!
//! The folder is structured like:
//! - `services.rs`: application state (catalog, open quotes, store, CRM)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: AppConfig) -> Router {
    let services = Arc::new(services::AppServices::from_config(&config));
    routes::router().layer(Extension(services))
}
