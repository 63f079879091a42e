//! Mapping Pipedrive person/organization records onto the quote's customer.

use serde_json::Value;

use quotedesk_quoting::{Address, Customer};

use crate::address::parse_us_address;

/// Normalize a raw field: trim, and treat placeholder dashes as empty.
fn clean(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return String::new(),
        other => other.to_string(),
    };
    if s == "-" || s == "\u{2014}" {
        String::new()
    } else {
        s
    }
}

/// Contact fields arrive as lists of `{ value, primary }` objects (or bare
/// strings on older records); take the first entry.
fn nested_field(record: &Value, key: &str) -> String {
    match record.get(key) {
        Some(Value::Array(items)) => match items.first() {
            Some(Value::Object(obj)) => clean(obj.get("value")),
            Some(Value::String(s)) => clean(Some(&Value::String(s.clone()))),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

/// Unwrap Pipedrive's relation envelopes (`{ value, id, name }`) to a scalar.
fn scalar(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::Object(obj) => ["value", "id", "name"]
            .iter()
            .find_map(|k| obj.get(*k).filter(|v| !v.is_null())),
        other => Some(other),
    }
}

/// The organization id attached to a person record, if any.
pub fn org_id_of(person: &Value) -> Option<i64> {
    scalar(person.get("org_id")?)?.as_i64()
}

/// Street line assembled from structured components.
fn compose_street(record: &Value) -> String {
    let street = clean(record.get("address_street"));
    let mut base = if street.is_empty() {
        let number = clean(record.get("address_street_number"));
        let route = clean(record.get("address_route"));
        [number, route]
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        street
    };

    let subpremise = clean(record.get("address_subpremise"));
    if !subpremise.is_empty() {
        if base.is_empty() {
            base = subpremise;
        } else {
            base = format!("{base}, {subpremise}");
        }
    }
    base
}

/// Address for a record: structured components first, then gaps filled from
/// the formatted address string.
fn address_of(record: &Value) -> Address {
    let mut address = Address {
        line1: compose_street(record),
        city: first_non_empty(record, &["address_locality", "address_city"]),
        state: first_non_empty(record, &["address_admin_area_level_1", "address_state"]),
        zip: first_non_empty(record, &["address_postal_code", "address_zip"]),
    };

    let formatted = first_non_empty(record, &["address_formatted_address", "address"]);
    let complete = !address.line1.is_empty()
        && !address.city.is_empty()
        && !address.state.is_empty()
        && !address.zip.is_empty();
    if !formatted.is_empty() && !complete {
        let parsed = parse_us_address(&formatted);
        if address.line1.is_empty() {
            address.line1 = parsed.street;
        }
        if address.city.is_empty() {
            address.city = parsed.city;
        }
        if address.state.is_empty() {
            address.state = parsed.state;
        }
        if address.zip.is_empty() {
            address.zip = parsed.zip;
        }
    }
    address
}

fn first_non_empty(record: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| clean(record.get(*k)))
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

/// Build the customer block from a person record, with the organization
/// filling whatever the person leaves blank. Billing starts as a copy of
/// shipping.
pub fn person_to_customer(person: &Value, org: Option<&Value>) -> Customer {
    let empty = Value::Null;
    let org = org.unwrap_or(&empty);

    let person_addr = address_of(person);
    let org_addr = address_of(org);

    let pick = |a: String, b: String| if a.is_empty() { b } else { a };
    let shipping = Address {
        line1: pick(person_addr.line1, org_addr.line1),
        city: pick(person_addr.city, org_addr.city),
        state: pick(person_addr.state, org_addr.state),
        zip: pick(person_addr.zip, org_addr.zip),
    };

    Customer {
        company: clean(org.get("name")),
        name: clean(person.get("name")),
        email: nested_field(person, "email"),
        phone: nested_field(person, "phone"),
        billing: shipping.clone(),
        shipping,
    }
}
