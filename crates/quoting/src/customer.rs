//! Customer and address value objects.

use serde::{Deserialize, Serialize};

/// A postal address (US-shaped: street line, city, state, zip).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.line1.is_empty() && self.city.is_empty() && self.state.is_empty() && self.zip.is_empty()
    }
}

/// The customer block on a quote.
///
/// Shipping and billing are kept separate; CRM lookups initialize billing
/// from shipping and the operator adjusts from there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub shipping: Address,
    #[serde(default)]
    pub billing: Address,
}
