use axum::{routing::get, Router};

pub mod crm;
pub mod products;
pub mod quotes;
pub mod system;

/// Full routing tree.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/products", products::router())
        .nest("/quotes", quotes::router())
        .nest("/crm", crm::router())
}
