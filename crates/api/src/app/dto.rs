use serde::Deserialize;
use serde_json::json;

use quotedesk_catalog::Product;
use quotedesk_quoting::{LineItem, Quote, QuoteTotals, TaxSelection};

// -------------------------
// Request DTOs
// -------------------------

/// New line: either a catalog SKU (name/price resolved from the catalog,
/// price overridable) or a custom line (name required).
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<u32>,
    /// Cents; defaults to the catalog price for SKU lines, $0.00 for custom.
    pub unit_price: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub quantity: Option<u32>,
    /// Cents.
    pub unit_price: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeesRequest {
    /// Cents.
    #[serde(default)]
    pub drop_ship_fee: i64,
    /// Cents.
    #[serde(default)]
    pub freight: i64,
}

/// Tax choice: the county preset wins over a manual percentage.
#[derive(Debug, Deserialize)]
pub struct TaxRequest {
    #[serde(default)]
    pub santa_cruz_county: bool,
    /// Percentage, e.g. `9.75`.
    pub percent: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCrmContactRequest {
    pub person_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CrmSearchQuery {
    pub q: String,
    pub limit: Option<u32>,
}

// -------------------------
// Response JSON mapping
// -------------------------

pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "sku": product.sku,
        "name": product.name,
        "unit_price": product.unit_price.cents(),
        "unit_price_display": product.unit_price.to_string(),
    })
}

pub fn line_to_json(line: &LineItem) -> serde_json::Value {
    json!({
        "id": line.id.to_string(),
        "sku": line.sku,
        "name": line.name,
        "quantity": line.quantity,
        "unit_price": line.unit_price.cents(),
        "total": line.total().cents(),
        "notes": line.notes,
    })
}

pub fn totals_to_json(totals: &QuoteTotals) -> serde_json::Value {
    json!({
        "subtotal": totals.subtotal.cents(),
        "drop_ship_fee": totals.drop_ship_fee.cents(),
        "freight": totals.freight.cents(),
        "tax_rate_percent": totals.tax_rate.percent(),
        "sales_tax": totals.sales_tax.cents(),
        "grand_total": totals.grand_total.cents(),
        "grand_total_display": totals.grand_total.to_string(),
    })
}

pub fn tax_to_json(tax: TaxSelection) -> serde_json::Value {
    match tax {
        TaxSelection::Manual(rate) => json!({
            "kind": "manual",
            "percent": rate.percent(),
        }),
        TaxSelection::SantaCruzCounty => json!({
            "kind": "santa_cruz_county",
            "percent": TaxSelection::SantaCruzCounty.rate().percent(),
        }),
    }
}

pub fn quote_to_json(quote: &Quote) -> serde_json::Value {
    let lines = quote
        .lines_with_discount()
        .iter()
        .map(line_to_json)
        .collect::<Vec<_>>();

    json!({
        "number": quote.number().to_string(),
        "customer": quote.customer(),
        "line_items": lines,
        "fees": {
            "drop_ship_fee": quote.fees().drop_ship_fee.cents(),
            "freight": quote.fees().freight.cents(),
        },
        "tax": tax_to_json(quote.tax()),
        "totals": totals_to_json(&quote.totals()),
        "freight_notes": quote.freight_notes(),
        "footer_notes": quote.footer_notes(),
    })
}
