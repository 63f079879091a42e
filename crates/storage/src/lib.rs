//! `quotedesk-storage` — quote persistence.
//!
//! Each quote owns a directory named after its number. The event log is the
//! source of truth for retrieval; the JSON snapshot and any generated PDFs
//! sit next to it for operators to inspect and share.

pub mod store;

pub use store::{FsQuoteStore, InMemoryQuoteStore, QuoteStore, StorageError};
