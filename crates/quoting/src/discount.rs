//! Course-discount rules.
//!
//! Orders with enough qualifying Mach 5 / Mach 7 / Mach X baskets earn a
//! flat per-basket credit. The discount is derived from the current line
//! items, never stored: it appears in snapshots, documents and totals as a
//! synthetic line with the reserved `CD` SKU.

use uuid::Uuid;

use quotedesk_core::{LineItemId, Money};

use crate::quote::LineItem;

/// Reserved SKU of the derived discount line.
pub const COURSE_DISCOUNT_SKU: &str = "CD";

/// Qualifying-basket count at which the discount kicks in.
pub const COURSE_DISCOUNT_THRESHOLD: u32 = 9;

/// Credit per qualifying basket.
pub const COURSE_DISCOUNT_PER_BASKET: Money = Money::from_cents(-10_000);

const COURSE_PACKAGE_SKUS: [&str; 3] = ["M5CO", "M7CO", "MXCO"];
const DISQUALIFYING_SKU_TERMS: [&str; 4] = ["COLLAR", "CHAIN", "HOLDER", "WRAP"];

/// Whether a line counts toward the course discount.
///
/// Accepts the explicit course-package SKUs, basket-shaped names
/// ("Mach 5/7/X" plus "Standard"/"Portable"/"No Frills"), and bare
/// M5/M7/MX SKUs that are not accessories.
pub fn is_qualifying_basket(sku: &str, name: &str) -> bool {
    let sku = sku.trim().to_uppercase();
    let name = name.to_lowercase();

    if COURSE_PACKAGE_SKUS.contains(&sku.as_str()) {
        return true;
    }

    let model = ["mach 5", "mach 7", "mach x"].iter().any(|m| name.contains(m));
    let variant = ["standard", "portable", "no frills"].iter().any(|v| name.contains(v));
    if model && variant {
        return true;
    }

    if ["M5", "M7", "MX"].iter().any(|p| sku.starts_with(p)) && !sku.ends_with("CO") {
        return !DISQUALIFYING_SKU_TERMS.iter().any(|t| sku.contains(t));
    }

    false
}

/// Total quantity across all qualifying lines.
pub fn qualifying_quantity(lines: &[LineItem]) -> u32 {
    lines
        .iter()
        .filter(|l| is_qualifying_basket(&l.sku, &l.name))
        .map(|l| l.quantity)
        .sum()
}

/// The derived discount line, present only at or above the threshold.
pub fn derived_discount_line(lines: &[LineItem]) -> Option<LineItem> {
    let quantity = qualifying_quantity(lines);
    if quantity < COURSE_DISCOUNT_THRESHOLD {
        return None;
    }

    Some(LineItem {
        id: discount_line_id(),
        sku: COURSE_DISCOUNT_SKU.to_string(),
        name: "Course Discount (-$100 per qualifying basket)".to_string(),
        quantity,
        unit_price: COURSE_DISCOUNT_PER_BASKET,
        notes: format!("Auto-applied for {COURSE_DISCOUNT_THRESHOLD}+ Mach 5/7/X baskets"),
    })
}

/// Whether a SKU/name pair collides with the derived discount line.
pub fn is_reserved(sku: &str, name: &str) -> bool {
    sku.trim().eq_ignore_ascii_case(COURSE_DISCOUNT_SKU)
        || name.trim().to_lowercase() == "course discount"
}

/// Fixed identifier so repeated derivations stay deterministic.
fn discount_line_id() -> LineItemId {
    LineItemId::from_uuid(Uuid::nil())
}
