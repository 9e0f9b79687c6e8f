//! HTTP client for the address lookup route.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{AddressLookup, AddressSuggestion, is_searchable};
use crate::error::LookupError;

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    suggestions: Vec<AddressSuggestion>,
}

#[derive(Debug, Deserialize)]
struct LookupFailure {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Calls `GET {base_url}/api/address-lookup?query=...`.
pub struct HttpAddressLookup {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAddressLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn lookup_url(&self) -> String {
        format!("{}/api/address-lookup", self.base_url)
    }
}

#[async_trait]
impl AddressLookup for HttpAddressLookup {
    async fn lookup(&self, query: &str) -> Result<Vec<AddressSuggestion>, LookupError> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }

        let resp = self
            .client
            .get(self.lookup_url())
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| LookupError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<LookupFailure>(&body)
                .ok()
                .and_then(|f| f.message.or(f.error))
                .unwrap_or(body);
            return Err(LookupError::BadStatus {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: LookupResponse = resp
            .json()
            .await
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))?;
        debug!(query, count = parsed.suggestions.len(), "Address lookup response");
        Ok(parsed.suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpAddressLookup::new("http://localhost:8080/");
        assert_eq!(client.lookup_url(), "http://localhost:8080/api/address-lookup");
    }

    #[tokio::test]
    async fn short_query_is_not_dispatched() {
        // Nothing listens on port 9; a dispatched request would fail.
        let client = HttpAddressLookup::new("http://127.0.0.1:9");
        assert!(client.lookup("ab").await.unwrap().is_empty());
    }
}
