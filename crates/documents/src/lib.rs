//! `quotedesk-documents` — printable quote and order documents.
//!
//! Letter-size PDFs built directly from content streams: Helvetica text,
//! ruled tables, page breaks when a quote outgrows a page. The input is a
//! [`quotedesk_quoting::QuoteSnapshot`], so rendering never recomputes
//! business state.

pub mod company;
mod layout;
pub mod order;
pub mod quote;
mod writer;

use thiserror::Error;

pub use company::CompanyInfo;
pub use order::{render_order, OrderMeta};
pub use quote::render_quote;

/// Errors raised while producing a PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build PDF document: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("failed to serialize PDF document: {0}")]
    Io(#[from] std::io::Error),
}
