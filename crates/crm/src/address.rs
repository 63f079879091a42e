//! Best-effort parsing of free-form US addresses.

use once_cell::sync::Lazy;
use regex::Regex;

static COUNTRY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),\s*(USA|US|United States)$").unwrap());

static STATE_ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]{2})\s*(\d{5}(?:-\d{4})?)$").unwrap());

/// Components recovered from a formatted address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Split a formatted address like `73 Hangar Way, Watsonville, CA 95076`
/// into components.
///
/// Handles a trailing country (`USA`/`US`/`United States`), ZIP+4, and
/// degraded inputs: with fewer than three comma-separated parts the first
/// part becomes the street and the rest the city.
pub fn parse_us_address(addr: &str) -> ParsedAddress {
    let mut parsed = ParsedAddress::default();

    let addr = addr.trim();
    if addr.is_empty() {
        return parsed;
    }
    let addr = COUNTRY_SUFFIX.replace(addr, "");

    let parts: Vec<&str> = addr
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return parsed;
    }

    if parts.len() >= 3 {
        let tail = parts[parts.len() - 1];
        if let Some(caps) = STATE_ZIP.captures(tail) {
            let full = caps.get(0).unwrap();
            parsed.state = caps[1].to_string();
            parsed.zip = caps[2].to_string();

            let city_part = tail[..full.start()].trim().trim_end_matches(',').trim();
            if city_part.is_empty() {
                parsed.city = parts[parts.len() - 2].to_string();
                parsed.street = parts[..parts.len() - 2].join(", ");
            } else {
                parsed.city = city_part.to_string();
                parsed.street = parts[..parts.len() - 1].join(", ");
            }
            return parsed;
        }
    }

    parsed.street = parts[0].to_string();
    if parts.len() > 1 {
        parsed.city = parts[1..].join(", ");
    }
    parsed
}
