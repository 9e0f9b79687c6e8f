//! Static address book standing in for a real geocoding provider.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{AddressLookup, AddressSuggestion, is_searchable};
use crate::error::LookupError;

const ADDRESSES: [(&str, &str, &str, &str); 5] = [
    ("910 Veterans Drive", "Florence", "AL", "35630"),
    ("123 Main Street", "Birmingham", "AL", "35203"),
    ("456 Oak Avenue", "Montgomery", "AL", "36104"),
    ("789 Pine Road", "Mobile", "AL", "36602"),
    ("321 Elm Street", "Huntsville", "AL", "35801"),
];

pub struct MockAddressBook {
    entries: Vec<AddressSuggestion>,
    latency: Duration,
}

impl MockAddressBook {
    pub fn new(latency: Duration) -> Self {
        let entries = ADDRESSES
            .iter()
            .map(|&(street, city, state, zip)| AddressSuggestion {
                street_address: street.to_string(),
                city: city.to_string(),
                state: state.to_string(),
                zip_code: zip.to_string(),
                full_address: format!("{street}, {city}, {state} {zip}"),
            })
            .collect();
        Self { entries, latency }
    }

    /// Case-insensitive substring match on the full address.
    fn search(&self, query: &str) -> Vec<AddressSuggestion> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|a| a.full_address.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

impl Default for MockAddressBook {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

#[async_trait]
impl AddressLookup for MockAddressBook {
    async fn lookup(&self, query: &str) -> Result<Vec<AddressSuggestion>, LookupError> {
        if !is_searchable(query) {
            return Ok(Vec::new());
        }
        let matches = self.search(query);
        tokio::time::sleep(self.latency).await;
        debug!(query, count = matches.len(), "Mock address lookup");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_are_case_insensitive() {
        let book = MockAddressBook::new(Duration::ZERO);
        let found = book.lookup("main st").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_address, "123 Main Street, Birmingham, AL 35203");
        assert_eq!(found[0].zip_code, "35203");
    }

    #[tokio::test]
    async fn state_code_matches_every_entry() {
        let book = MockAddressBook::new(Duration::ZERO);
        assert_eq!(book.lookup(", AL").await.unwrap().len(), 5);
        assert!(book.lookup("Seattle").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_skips_latency() {
        let book = MockAddressBook::new(Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        assert!(book.lookup("12").await.unwrap().is_empty());
        assert_eq!(started.elapsed(), Duration::ZERO);

        book.lookup("Oak").await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
