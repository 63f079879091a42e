//! `quotedesk-quoting` — the Quote aggregate and its pricing rules.
//!
//! A quote is an event-sourced aggregate: commands decide, events evolve
//! state, and the event log is what gets persisted. Derived views (the
//! course-discount line, totals, snapshots) are computed from state rather
//! than stored.

pub mod customer;
pub mod discount;
pub mod number;
pub mod quote;
pub mod snapshot;
pub mod totals;

pub use customer::{Address, Customer};
pub use number::QuoteNumber;
pub use quote::{
    AddLineItem, Fees, LineItem, OpenQuote, Quote, QuoteCommand, QuoteEvent, RemoveLineItem,
    SelectTax, SetCustomer, SetFees, SetFooterNotes, SetFreightNotes, UpdateLineItem,
    DEFAULT_FOOTER_NOTES,
};
pub use snapshot::QuoteSnapshot;
pub use totals::{QuoteTotals, TaxRate, TaxSelection};
