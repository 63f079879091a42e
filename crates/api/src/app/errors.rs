use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use quotedesk_core::DomainError;
use quotedesk_crm::CrmError;
use quotedesk_storage::StorageError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Storage(StorageError::NotFound(number)) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("quote {number} is not stored"),
        ),
        ServiceError::Storage(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e.to_string())
        }
        ServiceError::Render(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "render_error", e.to_string())
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn crm_error_to_response(err: CrmError) -> axum::response::Response {
    json_error(StatusCode::BAD_GATEWAY, "crm_error", err.to_string())
}

pub fn crm_unconfigured_response() -> axum::response::Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "crm_unconfigured",
        "PIPEDRIVE_API_TOKEN is not configured",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
