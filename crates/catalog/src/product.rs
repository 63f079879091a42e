use serde::{Deserialize, Serialize};

use quotedesk_core::Money;

/// A single sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
}

/// The loaded product catalog, indexed by SKU.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Minimal built-in catalog used when the CSV file cannot be loaded.
    pub fn placeholder() -> Self {
        let product = |sku: &str, name: &str, cents: i64| Product {
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price: Money::from_cents(cents),
        };

        Self::new(vec![
            product("M5-ST", "Mach 5 Standard Basket", 49_900),
            product("M7-PT", "Mach 7 Portable Basket", 39_900),
            product("M14-CO", "Mach 14 Chain Collar", 3_500),
            product("TS-BASIC", "Basic Color Tee Sign", 5_500),
        ])
    }

    /// Look a product up by its (trimmed) SKU.
    pub fn get(&self, sku: &str) -> Option<&Product> {
        let sku = sku.trim();
        self.products.iter().find(|p| p.sku == sku)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_catalog_has_priced_products() {
        let catalog = Catalog::placeholder();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.products().iter().all(|p| p.unit_price > Money::ZERO));
    }

    #[test]
    fn lookup_trims_the_requested_sku() {
        let catalog = Catalog::placeholder();
        let product = catalog.get("  M5-ST ").unwrap();
        assert_eq!(product.name, "Mach 5 Standard Basket");
        assert!(catalog.get("NOPE").is_none());
    }
}
