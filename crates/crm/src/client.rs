//! Pipedrive REST client.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use quotedesk_quoting::Customer;

use crate::mapping;

/// Production Pipedrive API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.pipedrive.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors talking to the CRM.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("CRM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CRM API returned status {status}: {body}")]
    Api { status: u16, body: String },
}

/// A person search hit, reduced to what the quoting form needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonMatch {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Thin client over the Pipedrive v1 API.
///
/// Authentication is the `api_token` query parameter, per the v1 API.
pub struct PipedriveClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl PipedriveClient {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self, CrmError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }

    /// Search persons by name or email.
    pub async fn search_persons(&self, term: &str, limit: u32) -> Result<Vec<PersonMatch>, CrmError> {
        let data = self
            .get(
                "persons/search",
                &[
                    ("term", term.trim().to_string()),
                    ("fields", "name,email".to_string()),
                    ("exact_match", "false".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(parse_person_matches(&data))
    }

    /// Fetch a full person record.
    pub async fn person(&self, id: i64) -> Result<Option<Value>, CrmError> {
        let data = self.get(&format!("persons/{id}"), &[]).await?;
        Ok(non_null(data))
    }

    /// Fetch a full organization record.
    pub async fn organization(&self, id: i64) -> Result<Option<Value>, CrmError> {
        let data = self.get(&format!("organizations/{id}"), &[]).await?;
        Ok(non_null(data))
    }

    /// Resolve a person (and their organization, when linked) into a
    /// ready-to-apply customer block.
    pub async fn customer_for_person(&self, person_id: i64) -> Result<Option<Customer>, CrmError> {
        let Some(person) = self.person(person_id).await? else {
            return Ok(None);
        };

        let org = match mapping::org_id_of(&person) {
            Some(org_id) => self.organization(org_id).await?,
            None => None,
        };

        Ok(Some(mapping::person_to_customer(&person, org.as_ref())))
    }

    /// GET `path`, returning the `data` member of the response envelope.
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, CrmError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("api_token", self.api_token.clone()));

        let response = self.http.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "CRM request rejected");
            return Err(CrmError::Api {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let envelope: Value = response.json().await?;
        Ok(envelope.get("data").cloned().unwrap_or(Value::Null))
    }
}

fn non_null(value: Value) -> Option<Value> {
    if value.is_null() { None } else { Some(value) }
}

/// Pull `{ id, name, email }` out of the search response items.
fn parse_person_matches(data: &Value) -> Vec<PersonMatch> {
    let Some(items) = data.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|entry| {
            let person = entry.get("item")?;
            let id = person.get("id")?.as_i64()?;
            let name = person
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let email = match person.get("email") {
                Some(Value::Array(values)) => match values.first() {
                    Some(Value::Object(obj)) => obj
                        .get("value")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    Some(Value::String(s)) => s.clone(),
                    _ => String::new(),
                },
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            Some(PersonMatch { id, name, email })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_search_items() {
        let data = json!({
            "items": [
                {"item": {"id": 7, "name": "Jane Smith", "email": [{"value": "jane@city.gov"}]}},
                {"item": {"id": 9, "name": "John Doe", "email": "john@example.com"}},
                {"item": {"name": "No Id"}},
            ]
        });

        let matches = parse_person_matches(&data);
        assert_eq!(
            matches,
            vec![
                PersonMatch { id: 7, name: "Jane Smith".to_string(), email: "jane@city.gov".to_string() },
                PersonMatch { id: 9, name: "John Doe".to_string(), email: "john@example.com".to_string() },
            ]
        );
    }

    #[test]
    fn missing_items_yield_no_matches() {
        assert!(parse_person_matches(&json!({})).is_empty());
        assert!(parse_person_matches(&json!(null)).is_empty());
    }
}
