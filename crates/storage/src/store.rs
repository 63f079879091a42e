use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

use quotedesk_quoting::{QuoteEvent, QuoteNumber, QuoteSnapshot};

const EVENTS_FILE: &str = "events.json";
const SNAPSHOT_FILE: &str = "quote.json";

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored quote data is malformed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("quote {0} is not stored")]
    NotFound(QuoteNumber),
}

/// Persistence seam for quotes.
///
/// `save` always writes the full event log plus the current snapshot;
/// partial appends are not worth the complexity at single-operator scale.
pub trait QuoteStore: Send + Sync {
    fn save(&self, snapshot: &QuoteSnapshot, events: &[QuoteEvent]) -> Result<(), StorageError>;

    /// The stored event log for a quote.
    fn load_events(&self, number: &QuoteNumber) -> Result<Vec<QuoteEvent>, StorageError>;

    /// Numbers of every stored quote.
    fn list(&self) -> Result<Vec<QuoteNumber>, StorageError>;

    /// Store a generated document (PDF bytes) next to the quote.
    fn save_document(
        &self,
        number: &QuoteNumber,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError>;
}

/// Filesystem store: one directory per quote under `root`.
#[derive(Debug, Clone)]
pub struct FsQuoteStore {
    root: PathBuf,
}

impl FsQuoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn quote_dir(&self, number: &QuoteNumber) -> PathBuf {
        self.root.join(number.as_str())
    }
}

impl QuoteStore for FsQuoteStore {
    fn save(&self, snapshot: &QuoteSnapshot, events: &[QuoteEvent]) -> Result<(), StorageError> {
        let dir = self.quote_dir(&snapshot.quote_no);
        std::fs::create_dir_all(&dir)?;

        let events_json = serde_json::to_vec_pretty(events)?;
        std::fs::write(dir.join(EVENTS_FILE), events_json)?;

        let snapshot_json = serde_json::to_vec_pretty(snapshot)?;
        std::fs::write(dir.join(SNAPSHOT_FILE), snapshot_json)?;

        tracing::info!(quote = %snapshot.quote_no, dir = %dir.display(), "quote saved");
        Ok(())
    }

    fn load_events(&self, number: &QuoteNumber) -> Result<Vec<QuoteEvent>, StorageError> {
        let path = self.quote_dir(number).join(EVENTS_FILE);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(number.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn list(&self) -> Result<Vec<QuoteNumber>, StorageError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut numbers = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            // Foreign directories (backups, scratch files) are simply skipped.
            if let Ok(number) = entry.file_name().to_string_lossy().parse::<QuoteNumber>() {
                numbers.push(number);
            }
        }
        numbers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(numbers)
    }

    fn save_document(
        &self,
        number: &QuoteNumber,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let dir = self.quote_dir(number);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(filename), bytes)?;
        Ok(())
    }
}

/// In-memory store for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryQuoteStore {
    inner: RwLock<HashMap<QuoteNumber, (QuoteSnapshot, Vec<QuoteEvent>)>>,
    documents: RwLock<HashMap<(QuoteNumber, String), Vec<u8>>>,
}

impl InMemoryQuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, number: &QuoteNumber, filename: &str) -> Option<Vec<u8>> {
        self.documents
            .read()
            .ok()?
            .get(&(number.clone(), filename.to_string()))
            .cloned()
    }
}

impl QuoteStore for InMemoryQuoteStore {
    fn save(&self, snapshot: &QuoteSnapshot, events: &[QuoteEvent]) -> Result<(), StorageError> {
        if let Ok(mut map) = self.inner.write() {
            map.insert(snapshot.quote_no.clone(), (snapshot.clone(), events.to_vec()));
        }
        Ok(())
    }

    fn load_events(&self, number: &QuoteNumber) -> Result<Vec<QuoteEvent>, StorageError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StorageError::NotFound(number.clone()))?;
        map.get(number)
            .map(|(_, events)| events.clone())
            .ok_or_else(|| StorageError::NotFound(number.clone()))
    }

    fn list(&self) -> Result<Vec<QuoteNumber>, StorageError> {
        let map = match self.inner.read() {
            Ok(map) => map,
            Err(_) => return Ok(Vec::new()),
        };
        let mut numbers: Vec<QuoteNumber> = map.keys().cloned().collect();
        numbers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(numbers)
    }

    fn save_document(
        &self,
        number: &QuoteNumber,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        if let Ok(mut map) = self.documents.write() {
            map.insert((number.clone(), filename.to_string()), bytes.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quotedesk_core::{Aggregate, LineItemId, Money};
    use quotedesk_quoting::{
        AddLineItem, OpenQuote, Quote, QuoteCommand, TaxSelection,
    };

    fn build_quote(number: &QuoteNumber) -> (Quote, Vec<QuoteEvent>) {
        let mut quote = Quote::empty(number.clone());
        let mut log = Vec::new();

        for cmd in [
            QuoteCommand::OpenQuote(OpenQuote {
                number: number.clone(),
                tax: TaxSelection::SantaCruzCounty,
                occurred_at: Utc::now(),
            }),
            QuoteCommand::AddLineItem(AddLineItem {
                number: number.clone(),
                line_id: LineItemId::new(),
                sku: "M5-ST".to_string(),
                name: "Mach 5 Standard Basket".to_string(),
                quantity: 9,
                unit_price: Money::from_cents(49_900),
                notes: String::new(),
                occurred_at: Utc::now(),
            }),
        ] {
            let events = quote.handle(&cmd).unwrap();
            for event in &events {
                quote.apply(event);
            }
            log.extend(events);
        }

        (quote, log)
    }

    #[test]
    fn fs_store_round_trips_the_event_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsQuoteStore::new(dir.path());

        let number: QuoteNumber = "20251002-1359".parse().unwrap();
        let (quote, events) = build_quote(&number);
        store.save(&quote.snapshot(Utc::now()), &events).unwrap();

        let loaded = store.load_events(&number).unwrap();
        let replayed = Quote::replay(number.clone(), &loaded);
        assert_eq!(replayed, quote);

        // The snapshot artifact sits next to the log.
        assert!(dir.path().join(number.as_str()).join("quote.json").exists());
    }

    #[test]
    fn fs_store_lists_only_valid_quote_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsQuoteStore::new(dir.path());

        let number: QuoteNumber = "20251002-1359".parse().unwrap();
        let (quote, events) = build_quote(&number);
        store.save(&quote.snapshot(Utc::now()), &events).unwrap();

        std::fs::create_dir(dir.path().join("not-a-quote")).unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"x").unwrap();

        assert_eq!(store.list().unwrap(), vec![number]);
    }

    #[test]
    fn fs_store_load_of_missing_quote_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsQuoteStore::new(dir.path());
        let number: QuoteNumber = "20251002-1359".parse().unwrap();

        match store.load_events(&number) {
            Err(StorageError::NotFound(n)) => assert_eq!(n, number),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn fs_store_writes_documents_into_the_quote_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsQuoteStore::new(dir.path());
        let number: QuoteNumber = "20251002-1359".parse().unwrap();

        store.save_document(&number, "20251002-1359_Quote.pdf", b"%PDF-").unwrap();
        let path = dir.path().join("20251002-1359").join("20251002-1359_Quote.pdf");
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-");
    }

    #[test]
    fn in_memory_store_round_trips() {
        let store = InMemoryQuoteStore::new();
        let number: QuoteNumber = "20251002-1359".parse().unwrap();
        let (quote, events) = build_quote(&number);

        store.save(&quote.snapshot(Utc::now()), &events).unwrap();
        let replayed = Quote::replay(number.clone(), &store.load_events(&number).unwrap());
        assert_eq!(replayed, quote);
        assert_eq!(store.list().unwrap(), vec![number]);
    }
}
