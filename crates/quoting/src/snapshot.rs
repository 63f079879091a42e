//! Human-readable quote snapshots.
//!
//! The event log is the source of truth; the snapshot is the derived,
//! operator-facing artifact written next to it (and the input to document
//! rendering).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::customer::Customer;
use crate::number::QuoteNumber;
use crate::quote::{Fees, LineItem};
use crate::totals::{QuoteTotals, TaxSelection};

/// Full state of a quote plus derived views at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub quote_no: QuoteNumber,
    pub date: DateTime<Utc>,
    pub customer: Customer,
    /// Line items in display order, including the derived discount line.
    pub line_items: Vec<LineItem>,
    pub fees: Fees,
    pub tax: TaxSelection,
    pub totals: QuoteTotals,
    pub freight_notes: String,
    pub footer_notes: String,
}
