//! CSV catalog loading.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use thiserror::Error;

use quotedesk_core::Money;

use crate::product::{Catalog, Product};

/// Errors raised while loading the catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog file: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog file is missing required columns: SKU, Name, UnitPrice (or 'Unit Price')")]
    MissingColumns,
}

/// Load the catalog from `path`.
///
/// Accepts either a `UnitPrice` or `Unit Price` header. Prices tolerate
/// currency formatting; unparseable prices coerce to $0.00, matching how
/// operators actually maintain these files.
pub fn load(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let content = read_with_encoding_fallback(path.as_ref())?;

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |wanted: &[&str]| {
        headers
            .iter()
            .position(|h| wanted.iter().any(|w| h.trim().eq_ignore_ascii_case(w)))
    };

    let sku_col = column(&["SKU"]).ok_or(CatalogError::MissingColumns)?;
    let name_col = column(&["Name"]).ok_or(CatalogError::MissingColumns)?;
    let price_col = column(&["UnitPrice", "Unit Price"]).ok_or(CatalogError::MissingColumns)?;

    let mut products = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

        let unit_price = Money::parse_lenient(&field(price_col)).unwrap_or(Money::ZERO);
        products.push(Product {
            sku: field(sku_col),
            name: field(name_col),
            unit_price,
        });
    }

    Ok(Catalog::new(products))
}

/// Load the catalog, falling back to the placeholder catalog on failure.
///
/// This mirrors the operator-facing contract: a broken `products.csv` must
/// never take the quoting form down.
pub fn load_or_placeholder(path: impl AsRef<Path>) -> Catalog {
    let path = path.as_ref();
    match load(path) {
        Ok(catalog) => {
            warn_if_unpriced(path, &catalog);
            catalog
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "could not load product catalog; using placeholder data"
            );
            Catalog::placeholder()
        }
    }
}

/// An all-zero catalog almost always means a formatting/encoding problem in
/// the price column, not four hundred free baskets.
fn warn_if_unpriced(path: &Path, catalog: &Catalog) {
    let priced = catalog
        .products()
        .iter()
        .filter(|p| p.sku != "CD")
        .collect::<Vec<_>>();

    if !priced.is_empty() && priced.iter().all(|p| p.unit_price.is_zero()) {
        tracing::warn!(
            path = %path.display(),
            "every catalog price parsed as $0.00; check the UnitPrice column formatting"
        );
    }
}

/// Read the file as UTF-8, decoding legacy single-byte exports when needed.
fn read_with_encoding_fallback(path: &Path) -> Result<String, std::io::Error> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(content),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}
