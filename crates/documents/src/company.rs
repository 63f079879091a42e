//! Company identity printed on documents.

use serde::{Deserialize, Serialize};

/// The selling company's letterhead details.
///
/// Values come from configuration; rendering treats them as opaque strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub tagline: String,
    pub phone: String,
    pub fax: String,
    pub web: String,
    pub addr1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl CompanyInfo {
    /// `City, ST zip` line for address blocks.
    pub fn city_line(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.zip)
    }
}
