//! Application state shared by all handlers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use thiserror::Error;

use quotedesk_catalog::{Catalog, Product};
use quotedesk_core::{Aggregate, DomainError};
use quotedesk_crm::PipedriveClient;
use quotedesk_documents::{render_order, render_quote, CompanyInfo, OrderMeta, RenderError};
use quotedesk_quoting::{
    OpenQuote, Quote, QuoteCommand, QuoteEvent, QuoteNumber, QuoteSnapshot, TaxSelection,
};
use quotedesk_storage::{FsQuoteStore, QuoteStore, StorageError};

use crate::config::AppConfig;

/// Errors surfaced by the service layer to the HTTP mapping.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// An open quote plus the event log that produced it.
#[derive(Debug, Clone)]
struct QuoteSession {
    quote: Quote,
    events: Vec<QuoteEvent>,
}

/// Catalog, open quotes, persistence and CRM access behind one `Arc`.
pub struct AppServices {
    catalog: RwLock<Catalog>,
    catalog_path: PathBuf,
    open_quotes: RwLock<HashMap<QuoteNumber, QuoteSession>>,
    store: Arc<dyn QuoteStore>,
    crm: Option<PipedriveClient>,
    company: CompanyInfo,
    default_tax: TaxSelection,
}

impl AppServices {
    pub fn from_config(config: &AppConfig) -> Self {
        let catalog = quotedesk_catalog::load_or_placeholder(&config.catalog_path);
        tracing::info!(
            path = %config.catalog_path.display(),
            products = catalog.len(),
            "catalog loaded"
        );

        let crm = config.pipedrive.as_ref().and_then(|pd| {
            match PipedriveClient::new(&pd.base_url, &pd.api_token) {
                Ok(client) => Some(client),
                Err(err) => {
                    tracing::warn!(error = %err, "could not construct CRM client; lookup disabled");
                    None
                }
            }
        });
        if crm.is_none() {
            tracing::warn!("Pipedrive API token not configured; CRM lookup disabled");
        }

        Self {
            catalog: RwLock::new(catalog),
            catalog_path: config.catalog_path.clone(),
            open_quotes: RwLock::new(HashMap::new()),
            store: Arc::new(FsQuoteStore::new(&config.quotes_dir)),
            crm,
            company: config.company.clone(),
            default_tax: config.default_tax,
        }
    }

    pub fn company(&self) -> &CompanyInfo {
        &self.company
    }

    pub fn crm(&self) -> Option<&PipedriveClient> {
        self.crm.as_ref()
    }

    // ---- catalog ----

    pub fn catalog(&self) -> Catalog {
        self.catalog.read().expect("catalog lock poisoned").clone()
    }

    pub fn product(&self, sku: &str) -> Option<Product> {
        self.catalog
            .read()
            .expect("catalog lock poisoned")
            .get(sku)
            .cloned()
    }

    /// Re-read the catalog file; returns the new product count.
    pub fn reload_catalog(&self) -> usize {
        let catalog = quotedesk_catalog::load_or_placeholder(&self.catalog_path);
        let count = catalog.len();
        *self.catalog.write().expect("catalog lock poisoned") = catalog;
        count
    }

    // ---- quotes ----

    /// Open a new quote numbered from the current wall clock.
    pub fn open_quote(&self, number: QuoteNumber) -> Result<Quote, ServiceError> {
        let mut sessions = self.open_quotes.write().expect("quotes lock poisoned");
        if sessions.contains_key(&number) {
            return Err(DomainError::conflict(format!(
                "quote {number} is already open; numbers have minute resolution"
            ))
            .into());
        }

        let mut quote = Quote::empty(number.clone());
        let events = quote.handle(&QuoteCommand::OpenQuote(OpenQuote {
            number: number.clone(),
            tax: self.default_tax,
            occurred_at: Utc::now(),
        }))?;
        for event in &events {
            quote.apply(event);
        }

        sessions.insert(number, QuoteSession { quote: quote.clone(), events });
        Ok(quote)
    }

    /// Current state of a quote, loading it from the store when it is not in
    /// memory.
    pub fn get_quote(&self, number: &QuoteNumber) -> Result<Quote, ServiceError> {
        let mut sessions = self.open_quotes.write().expect("quotes lock poisoned");
        let session = Self::session(&self.store, &mut sessions, number)?;
        Ok(session.quote.clone())
    }

    /// Run one command against a quote and return the updated state.
    pub fn dispatch(
        &self,
        number: &QuoteNumber,
        command: QuoteCommand,
    ) -> Result<Quote, ServiceError> {
        let mut sessions = self.open_quotes.write().expect("quotes lock poisoned");
        let session = Self::session(&self.store, &mut sessions, number)?;

        let events = session.quote.handle(&command)?;
        for event in &events {
            session.quote.apply(event);
        }
        session.events.extend(events);
        Ok(session.quote.clone())
    }

    /// Persist the quote's event log and snapshot.
    pub fn save_quote(&self, number: &QuoteNumber) -> Result<QuoteSnapshot, ServiceError> {
        let mut sessions = self.open_quotes.write().expect("quotes lock poisoned");
        let session = Self::session(&self.store, &mut sessions, number)?;

        let snapshot = session.quote.snapshot(Utc::now());
        self.store.save(&snapshot, &session.events)?;
        Ok(snapshot)
    }

    /// Render the quote document, persist it, and hand back the bytes.
    pub fn quote_document(&self, number: &QuoteNumber) -> Result<(String, Vec<u8>), ServiceError> {
        let snapshot = self.save_quote(number)?;
        let bytes = render_quote(&snapshot, &self.company)?;
        let filename = format!("{number}_Quote.pdf");
        self.store.save_document(number, &filename, &bytes)?;
        Ok((filename, bytes))
    }

    /// Render the order/PO document, persist it, and hand back the bytes.
    pub fn order_document(
        &self,
        number: &QuoteNumber,
        meta: &OrderMeta,
    ) -> Result<(String, Vec<u8>), ServiceError> {
        let snapshot = self.save_quote(number)?;
        let bytes = render_order(&snapshot, &self.company, meta)?;
        let filename = format!("{number}_Order.pdf");
        self.store.save_document(number, &filename, &bytes)?;
        Ok((filename, bytes))
    }

    /// Numbers of all quotes: open in memory plus stored on disk.
    pub fn list_quotes(&self) -> Result<Vec<QuoteNumber>, ServiceError> {
        let mut numbers = self.store.list()?;
        let sessions = self.open_quotes.read().expect("quotes lock poisoned");
        for number in sessions.keys() {
            if !numbers.contains(number) {
                numbers.push(number.clone());
            }
        }
        numbers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(numbers)
    }

    fn session<'a>(
        store: &Arc<dyn QuoteStore>,
        sessions: &'a mut HashMap<QuoteNumber, QuoteSession>,
        number: &QuoteNumber,
    ) -> Result<&'a mut QuoteSession, ServiceError> {
        if !sessions.contains_key(number) {
            let events = match store.load_events(number) {
                Ok(events) => events,
                Err(StorageError::NotFound(_)) => return Err(DomainError::not_found().into()),
                Err(err) => return Err(err.into()),
            };
            let quote = Quote::replay(number.clone(), &events);
            sessions.insert(number.clone(), QuoteSession { quote, events });
        }
        Ok(sessions
            .get_mut(number)
            .expect("session inserted above"))
    }
}
