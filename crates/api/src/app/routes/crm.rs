use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

const DEFAULT_SEARCH_LIMIT: u32 = 10;

pub fn router() -> Router {
    Router::new().route("/persons", get(search_persons))
}

pub async fn search_persons(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::CrmSearchQuery>,
) -> axum::response::Response {
    let Some(crm) = services.crm() else {
        return errors::crm_unconfigured_response();
    };

    let term = query.q.trim();
    if term.is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "q must not be empty");
    }

    match crm
        .search_persons(term, query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
        .await
    {
        Ok(matches) => (StatusCode::OK, Json(serde_json::json!({ "items": matches }))).into_response(),
        Err(e) => errors::crm_error_to_response(e),
    }
}
