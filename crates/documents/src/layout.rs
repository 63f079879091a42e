//! Shared layout building blocks for the document templates.

use quotedesk_quoting::{Address, Customer, LineItem, TaxRate};

use crate::writer::{wrap_text, Font, Ink, PdfWriter, MARGIN, PAGE_HEIGHT};

/// First baseline offset from the top of the page.
pub(crate) const TOP: f32 = PAGE_HEIGHT - 30.0;
/// Content must not descend below this.
pub(crate) const BOTTOM: f32 = 40.0;

const HEADER_ROW_HEIGHT: f32 = 16.0;
const LINE_FONT_SIZE: f32 = 9.0;
const LINE_LEADING: f32 = 11.0;
const NOTE_FONT_SIZE: f32 = 8.0;
const NOTE_LEADING: f32 = 10.0;

pub(crate) fn fmt_percent(rate: TaxRate) -> String {
    format!("{:.2}%", rate.percent())
}

/// The stacked lines of a shipping/billing block.
pub(crate) fn customer_lines(customer: &Customer, address: &Address) -> Vec<String> {
    vec![
        customer.company.clone(),
        customer.name.clone(),
        address.line1.clone(),
        format!("{}, {} {}", address.city, address.state, address.zip),
        customer.phone.clone(),
        customer.email.clone(),
    ]
}

/// Draw a stacked block of 10 pt lines under a bold title; returns the
/// height consumed.
pub(crate) fn draw_text_block(w: &mut PdfWriter, x: f32, y: f32, title: &str, lines: &[String]) -> f32 {
    let mut cursor = y;
    w.text(x, cursor, 10.0, Font::Bold, Ink::Black, title);
    cursor -= 12.0;
    for line in lines {
        w.text(x, cursor, 10.0, Font::Regular, Ink::Black, line);
        cursor -= 12.0;
    }
    y - cursor
}

/// One row of a ruled two-column box (totals, accessories).
pub(crate) struct BoxedRow {
    pub label: String,
    /// `None` renders the label centered across both columns.
    pub value: Option<String>,
    pub bold: bool,
    pub fill: bool,
}

impl BoxedRow {
    pub fn entry(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: Some(value.into()), bold: false, fill: false }
    }

    pub fn strong(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: Some(value.into()), bold: true, fill: true }
    }

    pub fn span(label: impl Into<String>) -> Self {
        Self { label: label.into(), value: None, bold: true, fill: true }
    }
}

/// Draw a bordered label/value table; returns the height consumed.
pub(crate) fn draw_boxed_table(
    w: &mut PdfWriter,
    x: f32,
    y: f32,
    width: f32,
    label_fraction: f32,
    row_height: f32,
    rows: &[BoxedRow],
) -> f32 {
    let label_width = width * label_fraction;
    let mut cursor = y;

    for row in rows {
        let top = cursor;
        let bottom = top - row_height;
        if row.fill {
            w.fill_rect(x, bottom, width, row_height, 0.85);
        }

        let font = if row.bold { Font::Bold } else { Font::Regular };
        let baseline = bottom + row_height / 2.0 - 3.0;
        match &row.value {
            Some(value) => {
                w.stroke_rect(x, bottom, label_width, row_height);
                w.stroke_rect(x + label_width, bottom, width - label_width, row_height);
                w.text(x + 6.0, baseline, 9.0, font, Ink::Black, &row.label);
                w.text_right(x + width - 6.0, baseline, 9.0, font, Ink::Black, value);
            }
            None => {
                w.stroke_rect(x, bottom, width, row_height);
                w.text_centered(x + width / 2.0, baseline, 9.0, font, Ink::Black, &row.label);
            }
        }
        cursor = bottom;
    }

    y - cursor
}

/// Draw the line-item table starting at `y`; handles page breaks and
/// returns the y position just below the table.
///
/// Zero-quantity lines are skipped: they are edit-in-progress rows, not
/// quoted product.
pub(crate) fn draw_line_items(
    w: &mut PdfWriter,
    mut y: f32,
    col_widths: &[f32; 4],
    lines: &[LineItem],
) -> f32 {
    let xs = column_positions(col_widths);

    y = draw_table_header(w, y, col_widths, &xs);

    for line in lines {
        if line.quantity == 0 {
            continue;
        }

        let desc_lines = wrap_text(&line.name, LINE_FONT_SIZE, col_widths[1] - 8.0);
        let row_height = (desc_lines.len() as f32 * LINE_LEADING + 5.0).max(HEADER_ROW_HEIGHT);

        if y - row_height < BOTTOM {
            w.new_page();
            y = draw_table_header(w, TOP, col_widths, &xs);
        }

        let bottom = y - row_height;
        for (i, width) in col_widths.iter().enumerate() {
            w.stroke_rect(xs[i], bottom, *width, row_height);
        }

        let first_baseline = y - LINE_LEADING;
        w.text_centered(
            xs[0] + col_widths[0] / 2.0,
            first_baseline,
            LINE_FONT_SIZE,
            Font::Regular,
            Ink::Black,
            &line.quantity.to_string(),
        );
        for (i, desc) in desc_lines.iter().enumerate() {
            w.text(
                xs[1] + 4.0,
                first_baseline - i as f32 * LINE_LEADING,
                LINE_FONT_SIZE,
                Font::Regular,
                Ink::Black,
                desc,
            );
        }
        w.text_right(
            xs[2] + col_widths[2] - 4.0,
            first_baseline,
            LINE_FONT_SIZE,
            Font::Regular,
            Ink::Black,
            &line.unit_price.to_string(),
        );
        w.text_right(
            xs[3] + col_widths[3] - 4.0,
            first_baseline,
            LINE_FONT_SIZE,
            Font::Regular,
            Ink::Black,
            &line.total().to_string(),
        );
        y = bottom;

        let notes = line.notes.trim();
        if !notes.is_empty() {
            let note_lines = wrap_text(notes, NOTE_FONT_SIZE, col_widths[1] - 14.0);
            let note_height = note_lines.len() as f32 * NOTE_LEADING + 4.0;

            if y - note_height < BOTTOM {
                w.new_page();
                y = draw_table_header(w, TOP, col_widths, &xs);
            }

            let note_bottom = y - note_height;
            for (i, width) in col_widths.iter().enumerate() {
                w.stroke_rect(xs[i], note_bottom, *width, note_height);
            }
            for (i, note) in note_lines.iter().enumerate() {
                w.text(
                    xs[1] + 10.0,
                    y - NOTE_LEADING - i as f32 * NOTE_LEADING + 2.0,
                    NOTE_FONT_SIZE,
                    Font::Regular,
                    Ink::Grey,
                    note,
                );
            }
            y = note_bottom;
        }
    }

    y
}

fn column_positions(col_widths: &[f32; 4]) -> [f32; 4] {
    let mut xs = [0.0; 4];
    let mut x = MARGIN;
    for (i, width) in col_widths.iter().enumerate() {
        xs[i] = x;
        x += width;
    }
    xs
}

fn draw_table_header(w: &mut PdfWriter, y: f32, col_widths: &[f32; 4], xs: &[f32; 4]) -> f32 {
    let bottom = y - HEADER_ROW_HEIGHT;
    let total_width: f32 = col_widths.iter().sum();
    w.fill_rect(MARGIN, bottom, total_width, HEADER_ROW_HEIGHT, 0.85);
    for (i, width) in col_widths.iter().enumerate() {
        w.stroke_rect(xs[i], bottom, *width, HEADER_ROW_HEIGHT);
    }

    let baseline = bottom + 5.0;
    w.text_centered(xs[0] + col_widths[0] / 2.0, baseline, LINE_FONT_SIZE, Font::Bold, Ink::Black, "Qty");
    w.text(xs[1] + 4.0, baseline, LINE_FONT_SIZE, Font::Bold, Ink::Black, "Product Description");
    w.text_right(xs[2] + col_widths[2] - 4.0, baseline, LINE_FONT_SIZE, Font::Bold, Ink::Black, "Unit Price");
    w.text_right(xs[3] + col_widths[3] - 4.0, baseline, LINE_FONT_SIZE, Font::Bold, Ink::Black, "Total");
    bottom
}
