use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Local, Utc};

use quotedesk_core::{LineItemId, Money};
use quotedesk_documents::OrderMeta;
use quotedesk_quoting::{
    AddLineItem, QuoteCommand, QuoteNumber, RemoveLineItem, SelectTax, SetCustomer, SetFees,
    SetFooterNotes, SetFreightNotes, UpdateLineItem, Customer, Fees, TaxRate, TaxSelection,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(open_quote).get(list_quotes))
        .route("/:number", get(get_quote))
        .route("/:number/customer", put(set_customer))
        .route("/:number/customer/from-crm", post(apply_crm_contact))
        .route("/:number/lines", post(add_line))
        .route("/:number/lines/:line_id", put(update_line).delete(remove_line))
        .route("/:number/fees", put(set_fees))
        .route("/:number/tax", put(set_tax))
        .route("/:number/freight-notes", put(set_freight_notes))
        .route("/:number/footer-notes", put(set_footer_notes))
        .route("/:number/totals", get(get_totals))
        .route("/:number/save", post(save_quote))
        .route("/:number/documents/quote", post(quote_document))
        .route("/:number/documents/order", post(order_document))
}

fn parse_number(raw: &str) -> Result<QuoteNumber, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_number", "invalid quote number"))
}

fn parse_line_id(raw: &str) -> Result<LineItemId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid line item id"))
}

pub async fn open_quote(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let number = QuoteNumber::from_datetime(Local::now().naive_local());
    match services.open_quote(number) {
        Ok(quote) => (StatusCode::CREATED, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_quotes(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_quotes() {
        Ok(numbers) => {
            let items = numbers.iter().map(|n| n.to_string()).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    match services.get_quote(&number) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(customer): Json<Customer>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    let cmd = QuoteCommand::SetCustomer(SetCustomer {
        number: number.clone(),
        customer,
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn apply_crm_contact(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(body): Json<dto::ApplyCrmContactRequest>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let Some(crm) = services.crm() else {
        return errors::crm_unconfigured_response();
    };

    let customer = match crm.customer_for_person(body.person_id).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "CRM person not found")
        }
        Err(e) => return errors::crm_error_to_response(e),
    };

    let cmd = QuoteCommand::SetCustomer(SetCustomer {
        number: number.clone(),
        customer,
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(body): Json<dto::AddLineRequest>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    // Catalog lines resolve name and price from the catalog; custom lines
    // bring their own.
    let (sku, name, unit_price) = match body.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(sku) => match services.product(sku) {
            Some(product) => (
                product.sku,
                product.name,
                body.unit_price.map(Money::from_cents).unwrap_or(product.unit_price),
            ),
            None => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "unknown_sku",
                    format!("SKU '{sku}' is not in the catalog"),
                )
            }
        },
        None => (
            String::new(),
            body.name.unwrap_or_default(),
            body.unit_price.map(Money::from_cents).unwrap_or(Money::ZERO),
        ),
    };

    let line_id = LineItemId::new();
    let cmd = QuoteCommand::AddLineItem(AddLineItem {
        number: number.clone(),
        line_id,
        sku,
        name,
        quantity: body.quantity.unwrap_or(1),
        unit_price,
        notes: body.notes.unwrap_or_default(),
        occurred_at: Utc::now(),
    });

    match services.dispatch(&number, cmd) {
        Ok(quote) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "line_id": line_id.to_string(),
                "quote": dto::quote_to_json(&quote),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path((number, line_id)): Path<(String, String)>,
    Json(body): Json<dto::UpdateLineRequest>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let line_id = match parse_line_id(&line_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let cmd = QuoteCommand::UpdateLineItem(UpdateLineItem {
        number: number.clone(),
        line_id,
        quantity: body.quantity,
        unit_price: body.unit_price.map(Money::from_cents),
        notes: body.notes,
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path((number, line_id)): Path<(String, String)>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let line_id = match parse_line_id(&line_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let cmd = QuoteCommand::RemoveLineItem(RemoveLineItem {
        number: number.clone(),
        line_id,
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_fees(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(body): Json<dto::FeesRequest>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    let cmd = QuoteCommand::SetFees(SetFees {
        number: number.clone(),
        fees: Fees {
            drop_ship_fee: Money::from_cents(body.drop_ship_fee),
            freight: Money::from_cents(body.freight),
        },
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(body): Json<dto::TaxRequest>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    let tax = if body.santa_cruz_county {
        TaxSelection::SantaCruzCounty
    } else {
        let percent = body.percent.unwrap_or(0.0);
        match TaxRate::from_percent(percent) {
            Ok(rate) => TaxSelection::Manual(rate),
            Err(e) => return errors::domain_error_to_response(e),
        }
    };

    let cmd = QuoteCommand::SelectTax(SelectTax {
        number: number.clone(),
        tax,
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_freight_notes(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(body): Json<dto::NotesRequest>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    let cmd = QuoteCommand::SetFreightNotes(SetFreightNotes {
        number: number.clone(),
        notes: body.notes,
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_footer_notes(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(body): Json<dto::NotesRequest>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    let cmd = QuoteCommand::SetFooterNotes(SetFooterNotes {
        number: number.clone(),
        notes: body.notes,
        occurred_at: Utc::now(),
    });
    match services.dispatch(&number, cmd) {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_totals(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    match services.get_quote(&number) {
        Ok(quote) => (StatusCode::OK, Json(dto::totals_to_json(&quote.totals()))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn save_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    match services.save_quote(&number) {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "number": snapshot.quote_no.to_string(),
                "saved_at": snapshot.date,
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn quote_document(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    match services.quote_document(&number) {
        Ok((filename, bytes)) => pdf_response(&filename, bytes),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn order_document(
    Extension(services): Extension<Arc<AppServices>>,
    Path(number): Path<String>,
    Json(mut meta): Json<OrderMeta>,
) -> axum::response::Response {
    let number = match parse_number(&number) {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    if meta.date_received.trim().is_empty() {
        meta.date_received = Local::now().format("%m/%d/%y").to_string();
    }

    match services.order_document(&number, &meta) {
        Ok((filename, bytes)) => pdf_response(&filename, bytes),
        Err(e) => errors::service_error_to_response(e),
    }
}

fn pdf_response(filename: &str, bytes: Vec<u8>) -> axum::response::Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
