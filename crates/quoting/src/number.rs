//! Quote numbers.

use core::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use quotedesk_core::DomainError;

const QUOTE_NUMBER_FORMAT: &str = "%Y%m%d-%H%M";

/// A quote number in `YYYYMMDD-HHMM` form.
///
/// Doubles as the aggregate identifier and the persistence key, so it is
/// validated on every parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuoteNumber(String);

impl QuoteNumber {
    /// Derive a fresh quote number from a wall-clock timestamp.
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.format(QUOTE_NUMBER_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for QuoteNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QuoteNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, QUOTE_NUMBER_FORMAT)
            .map_err(|_| DomainError::invalid_id(format!("quote number must be YYYYMMDD-HHMM, got '{s}'")))?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for QuoteNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuoteNumber> for String {
    fn from(value: QuoteNumber) -> Self {
        value.0
    }
}
