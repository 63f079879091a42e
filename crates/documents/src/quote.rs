//! The customer-facing quotation document.

use quotedesk_core::Money;
use quotedesk_quoting::QuoteSnapshot;

use crate::company::CompanyInfo;
use crate::layout::{
    customer_lines, draw_boxed_table, draw_line_items, draw_text_block, fmt_percent, BoxedRow,
    BOTTOM, TOP,
};
use crate::writer::{wrap_text, Font, Ink, PdfWriter, CONTENT_WIDTH, MARGIN};
use crate::RenderError;

/// Upsell table printed beside the totals box. Per-unit pricing.
const ACCESSORIES: [(&str, i64); 7] = [
    ("Number Plate", 3_500),
    ("Powder Coat Fee - Stock Color", 9_000),
    ("Additional Anchor - Pin Positions", 3_000),
    ("Basic Color Tee Sign", 5_500),
    ("12\"x18\" Color Rules Sign", 6_900),
    ("Pole Extension - New Product", 6_000),
    ("Basket Flag - New Product", 3_000),
];

/// Render the quote PDF.
pub fn render_quote(snapshot: &QuoteSnapshot, company: &CompanyInfo) -> Result<Vec<u8>, RenderError> {
    let mut w = PdfWriter::new();
    let right = MARGIN + CONTENT_WIDTH;
    let mut y = TOP;

    // Letterhead: company at left, document title + contact at right.
    w.text(MARGIN, y - 12.0, 12.0, Font::Bold, Ink::Black, &company.name);
    w.text(MARGIN, y - 26.0, 10.0, Font::Regular, Ink::Black, &company.addr1);
    w.text(MARGIN, y - 38.0, 10.0, Font::Regular, Ink::Black, &company.city_line());

    w.text_right(right, y - 14.0, 14.0, Font::Bold, Ink::Black, "Quotation Form");
    w.text_right(right, y - 28.0, 10.0, Font::Regular, Ink::Black, "Pricing Subject to Change");
    w.text_right(right, y - 58.0, 10.0, Font::Regular, Ink::Black, &format!("Phone: {}", company.phone));
    w.text_right(right, y - 70.0, 10.0, Font::Regular, Ink::Black, &format!("Fax: {}", company.fax));
    w.text_right(right, y - 82.0, 10.0, Font::Regular, Ink::Black, &format!("Web: {}", company.web));
    y -= 100.0;

    w.text(MARGIN, y, 10.0, Font::Regular, Ink::Black, &format!("Date: {}", snapshot.date.format("%Y-%m-%d")));
    w.text(MARGIN, y - 12.0, 10.0, Font::Regular, Ink::Black, &format!("Quote #: {}", snapshot.quote_no));
    y -= 30.0;

    let ship_height = draw_text_block(
        &mut w,
        MARGIN,
        y,
        "Shipping Address",
        &customer_lines(&snapshot.customer, &snapshot.customer.shipping),
    );
    let bill_height = draw_text_block(
        &mut w,
        MARGIN + CONTENT_WIDTH / 2.0,
        y,
        "Billing Address",
        &customer_lines(&snapshot.customer, &snapshot.customer.billing),
    );
    y -= ship_height.max(bill_height) + 14.0;

    let col_widths = [50.4, 309.6, 90.0, 90.0];
    y = draw_line_items(&mut w, y, &col_widths, &snapshot.line_items);
    y -= 14.0;

    let freight_notes = snapshot.freight_notes.trim();
    if !freight_notes.is_empty() {
        w.text(MARGIN, y, 8.0, Font::Bold, Ink::Black, "Freight Notes:");
        for line in wrap_text(freight_notes, 8.0, CONTENT_WIDTH - 70.0) {
            w.text(MARGIN + 64.0, y, 8.0, Font::Regular, Ink::Black, &line);
            y -= 10.0;
        }
        y -= 6.0;
    }

    // Accessories and totals side by side; keep the pair on one page.
    let accessories = accessory_rows();
    let totals = totals_rows(snapshot);
    let pair_height = (accessories.len().max(totals.len()) as f32) * 16.0;
    if y - pair_height < BOTTOM {
        w.new_page();
        y = TOP;
    }

    let accessories_width = 252.0;
    let totals_width = 216.0;
    let accessories_height =
        draw_boxed_table(&mut w, MARGIN, y, accessories_width, 0.7, 14.0, &accessories);
    let totals_height = draw_boxed_table(
        &mut w,
        right - totals_width,
        y,
        totals_width,
        0.65,
        16.0,
        &totals,
    );
    y -= accessories_height.max(totals_height) + 18.0;

    w.text(MARGIN, y, 8.0, Font::Bold, Ink::Grey, "Notes:");
    y -= 10.0;
    for paragraph in snapshot.footer_notes.lines() {
        for line in wrap_text(paragraph, 8.0, CONTENT_WIDTH) {
            if y < BOTTOM {
                w.new_page();
                y = TOP;
            }
            w.text(MARGIN + 6.0, y, 8.0, Font::Regular, Ink::Grey, &line);
            y -= 10.0;
        }
    }

    w.finish()
}

fn accessory_rows() -> Vec<BoxedRow> {
    let mut rows = vec![BoxedRow::span("Additional Course Equipment to Consider*")];
    rows.extend(
        ACCESSORIES
            .iter()
            .map(|(name, cents)| BoxedRow::entry(*name, Money::from_cents(*cents).to_string())),
    );
    rows.push(BoxedRow::span("*Per Unit Pricing"));
    rows
}

fn totals_rows(snapshot: &QuoteSnapshot) -> Vec<BoxedRow> {
    let totals = &snapshot.totals;
    vec![
        BoxedRow::entry("Subtotal:", totals.subtotal.to_string()),
        BoxedRow::entry("Drop-Ship Fee:", totals.drop_ship_fee.to_string()),
        BoxedRow::entry("Freight:", totals.freight.to_string()),
        BoxedRow::entry(
            format!("Sales Tax ({}):", fmt_percent(totals.tax_rate)),
            totals.sales_tax.to_string(),
        ),
        BoxedRow::strong("GRAND TOTAL:", totals.grand_total.to_string()),
    ]
}
