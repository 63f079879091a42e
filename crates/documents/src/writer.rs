//! Minimal PDF content-stream writer.
//!
//! Only what the document templates need: Helvetica regular/bold text,
//! strokes and fills, multiple pages. Glyph widths are approximated from a
//! coarse Helvetica metric table; alignment tolerances at table scale are
//! well under a point.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::RenderError;

pub(crate) const PAGE_WIDTH: f32 = 612.0;
pub(crate) const PAGE_HEIGHT: f32 = 792.0;
pub(crate) const MARGIN: f32 = 36.0;
pub(crate) const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Ink {
    Black,
    Grey,
}

impl Ink {
    fn rgb(self) -> (f32, f32, f32) {
        match self {
            Ink::Black => (0.0, 0.0, 0.0),
            Ink::Grey => (0.45, 0.45, 0.45),
        }
    }
}

/// Accumulates operations page by page and assembles the final document.
pub(crate) struct PdfWriter {
    finished_pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            finished_pages: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, ink: Ink, text: &str) {
        let (r, g, b) = ink.rgb();
        self.ops.push(Operation::new("BT", vec![]));
        self.ops
            .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        self.ops.push(Operation::new(
            "Tf",
            vec![font.resource().into(), size.into()],
        ));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops
            .push(Operation::new("Tj", vec![Object::string_literal(text)]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    pub fn text_right(&mut self, right: f32, y: f32, size: f32, font: Font, ink: Ink, text: &str) {
        let x = right - text_width(text, size);
        self.text(x, y, size, font, ink, text);
    }

    pub fn text_centered(&mut self, center: f32, y: f32, size: f32, font: Font, ink: Ink, text: &str) {
        let x = center - text_width(text, size) / 2.0;
        self.text(x, y, size, font, ink, text);
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.ops.push(Operation::new("w", vec![0.5.into()]));
        self.ops
            .push(Operation::new("RG", vec![0.0.into(), 0.0.into(), 0.0.into()]));
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new("S", vec![]));
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, grey: f32) {
        self.ops.push(Operation::new(
            "rg",
            vec![grey.into(), grey.into(), grey.into()],
        ));
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.ops.push(Operation::new("w", vec![0.5.into()]));
        self.ops
            .push(Operation::new("RG", vec![0.0.into(), 0.0.into(), 0.0.into()]));
        self.ops.push(Operation::new("m", vec![x1.into(), y1.into()]));
        self.ops.push(Operation::new("l", vec![x2.into(), y2.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    pub fn new_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.finished_pages.push(ops);
    }

    pub fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        self.new_page();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let font_bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_regular,
                "F2" => font_bold,
            },
        });

        let page_count = self.finished_pages.len() as i64;
        let mut kids: Vec<Object> = Vec::new();
        for operations in self.finished_pages {
            let content = Content { operations };
            let stream = Stream::new(dictionary! {}, content.encode()?);
            let content_id = doc.add_object(stream);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// Approximate rendered width of `text` in points.
pub(crate) fn text_width(text: &str, size: f32) -> f32 {
    let units: f32 = text
        .chars()
        .map(|c| match c {
            ' ' | '.' | ',' | ';' | ':' | '\'' | '|' => 278.0,
            'i' | 'l' | 'j' | 'I' => 222.0,
            't' | 'f' | 'r' => 333.0,
            'm' | 'M' | 'W' => 889.0,
            'w' => 722.0,
            '$' | '0'..='9' => 556.0,
            '-' | '(' | ')' | '"' => 333.0,
            'A'..='Z' => 667.0,
            _ => 500.0,
        })
        .sum();
    units / 1000.0 * size
}

/// Greedy word wrap within `max_width` points at the given size.
pub(crate) fn wrap_text(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
