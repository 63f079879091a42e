//! The internal Order / PO document.

use serde::{Deserialize, Serialize};

use quotedesk_quoting::QuoteSnapshot;

use crate::company::CompanyInfo;
use crate::layout::{
    customer_lines, draw_boxed_table, draw_line_items, draw_text_block, fmt_percent, BoxedRow,
    BOTTOM, TOP,
};
use crate::writer::{wrap_text, Font, Ink, PdfWriter, CONTENT_WIDTH, MARGIN};
use crate::RenderError;

/// Back-office details stamped on the order document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMeta {
    #[serde(default)]
    pub po_number: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default = "default_terms")]
    pub terms: String,
    #[serde(default)]
    pub commission_to: String,
    #[serde(default)]
    pub check_number: String,
    #[serde(default)]
    pub date_received: String,
}

fn default_operator() -> String {
    "CZ".to_string()
}

fn default_terms() -> String {
    "NET 30".to_string()
}

impl Default for OrderMeta {
    fn default() -> Self {
        Self {
            po_number: String::new(),
            operator: default_operator(),
            terms: default_terms(),
            commission_to: String::new(),
            check_number: String::new(),
            date_received: String::new(),
        }
    }
}

/// Render the Order / PO PDF.
pub fn render_order(
    snapshot: &QuoteSnapshot,
    company: &CompanyInfo,
    meta: &OrderMeta,
) -> Result<Vec<u8>, RenderError> {
    let mut w = PdfWriter::new();
    let right = MARGIN + CONTENT_WIDTH;
    let mut y = TOP;

    w.text(MARGIN, y - 12.0, 12.0, Font::Bold, Ink::Black, &company.name);
    w.text(MARGIN, y - 26.0, 10.0, Font::Regular, Ink::Black, &company.addr1);
    w.text(MARGIN, y - 38.0, 10.0, Font::Regular, Ink::Black, &company.city_line());
    w.text(MARGIN, y - 50.0, 10.0, Font::Regular, Ink::Black, &format!("Phone: {}", company.phone));
    y -= 70.0;

    w.text(MARGIN, y, 14.0, Font::Bold, Ink::Black, &format!("ORDER: {}", snapshot.quote_no));
    y -= 20.0;

    w.text(MARGIN, y, 10.0, Font::Regular, Ink::Black, &format!("Date: {}", snapshot.date.format("%m/%d/%y")));
    w.text(MARGIN, y - 12.0, 10.0, Font::Regular, Ink::Black, &format!("Operator: {}", meta.operator));
    w.text(MARGIN, y - 24.0, 10.0, Font::Regular, Ink::Black, &format!("Commission to: {}", meta.commission_to));
    y -= 42.0;

    let mut ship_lines = customer_lines(&snapshot.customer, &snapshot.customer.shipping);
    ship_lines.push(String::new());
    let ship_height = draw_text_block(&mut w, MARGIN, y, "Shipping Address", &ship_lines);

    // PO & payment details continue under the shipping block.
    let po_y = y - ship_height - 12.0;
    let po_lines = vec![
        format!("P.O. Number: {}", meta.po_number),
        format!("Terms: {}", meta.terms),
        format!("Check Number: {}", meta.check_number),
        format!("Date Received: {}", meta.date_received),
    ];
    let po_height = draw_text_block(&mut w, MARGIN, po_y, "Purchase Order & Check Info:", &po_lines);

    let bill_height = draw_text_block(
        &mut w,
        MARGIN + CONTENT_WIDTH / 2.0,
        y,
        "Billing Address",
        &customer_lines(&snapshot.customer, &snapshot.customer.billing),
    );

    y -= (ship_height + 12.0 + po_height).max(bill_height) + 14.0;

    let col_widths = [50.4, 370.8, 59.4, 59.4];
    y = draw_line_items(&mut w, y, &col_widths, &snapshot.line_items);
    y -= 10.0;

    let freight_notes = snapshot.freight_notes.trim();
    if !freight_notes.is_empty() {
        w.text(MARGIN, y, 8.0, Font::Bold, Ink::Black, "Freight Notes:");
        for line in wrap_text(freight_notes, 8.0, CONTENT_WIDTH - 70.0) {
            w.text(MARGIN + 64.0, y, 8.0, Font::Regular, Ink::Black, &line);
            y -= 10.0;
        }
        y -= 6.0;
    }

    // Stacked totals boxes at the right edge.
    let totals = &snapshot.totals;
    let sub_rows = vec![
        BoxedRow::entry("Subtotal:", totals.subtotal.to_string()),
        BoxedRow::entry("Drop-Ship Fee:", totals.drop_ship_fee.to_string()),
        BoxedRow::entry(
            format!("Sales Tax ({}):", fmt_percent(totals.tax_rate)),
            totals.sales_tax.to_string(),
        ),
    ];
    let grand_rows = vec![
        BoxedRow::entry("Freight:", totals.freight.to_string()),
        BoxedRow::strong("GRAND TOTAL:", totals.grand_total.to_string()),
    ];

    let box_width = 180.0;
    let stacked_height = ((sub_rows.len() + grand_rows.len()) as f32) * 16.0 + 4.0;
    if y - stacked_height < BOTTOM {
        w.new_page();
        y = TOP;
    }

    let sub_height = draw_boxed_table(&mut w, right - box_width, y, box_width, 0.6, 16.0, &sub_rows);
    draw_boxed_table(&mut w, right - box_width, y - sub_height - 4.0, box_width, 0.6, 16.0, &grand_rows);

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lopdf::Document;
    use quotedesk_core::{Aggregate, LineItemId, Money};
    use quotedesk_quoting::{
        AddLineItem, OpenQuote, Quote, QuoteCommand, QuoteNumber, SetFees, Fees, TaxSelection,
    };

    fn sample_snapshot() -> QuoteSnapshot {
        let number: QuoteNumber = "20251002-1359".parse().unwrap();
        let mut quote = Quote::empty(number.clone());
        let events = quote
            .handle(&QuoteCommand::OpenQuote(OpenQuote {
                number: number.clone(),
                tax: TaxSelection::Manual(quotedesk_quoting::TaxRate::from_basis_points(800)),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        let events = quote
            .handle(&QuoteCommand::AddLineItem(AddLineItem {
                number: number.clone(),
                line_id: LineItemId::new(),
                sku: "M7-PT".to_string(),
                name: "Mach 7 Portable Basket".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(39_900),
                notes: String::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        let events = quote
            .handle(&QuoteCommand::SetFees(SetFees {
                number,
                fees: Fees {
                    drop_ship_fee: Money::from_cents(2_500),
                    freight: Money::from_cents(18_000),
                },
                occurred_at: Utc::now(),
            }))
            .unwrap();
        quote.apply(&events[0]);

        quote.snapshot(Utc::now())
    }

    #[test]
    fn renders_a_loadable_order_document() {
        let meta = OrderMeta {
            po_number: "PO-1187".to_string(),
            date_received: "10/02/25".to_string(),
            ..OrderMeta::default()
        };

        let bytes = render_order(
            &sample_snapshot(),
            &CompanyInfo {
                name: "Disc Golf Association, Inc.".to_string(),
                phone: "(831) 722-6037".to_string(),
                addr1: "73 Hangar Way".to_string(),
                city: "Watsonville".to_string(),
                state: "CA".to_string(),
                zip: "95076".to_string(),
                ..CompanyInfo::default()
            },
            &meta,
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn order_meta_deserializes_with_defaults() {
        let meta: OrderMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta.operator, "CZ");
        assert_eq!(meta.terms, "NET 30");
        assert!(meta.po_number.is_empty());
    }
}
