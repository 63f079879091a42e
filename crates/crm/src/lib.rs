//! `quotedesk-crm` — Pipedrive lookup for the customer block.
//!
//! Person records take precedence over their organization; free-form
//! addresses are parsed into components only when the structured fields are
//! missing. The HTTP client is a thin typed wrapper over the Pipedrive v1
//! REST API.

pub mod address;
pub mod client;
pub mod mapping;

pub use address::{ParsedAddress, parse_us_address};
pub use client::{CrmError, PersonMatch, PipedriveClient, DEFAULT_BASE_URL};
pub use mapping::person_to_customer;
