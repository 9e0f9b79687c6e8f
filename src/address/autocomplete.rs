//! Debounced address autocomplete.
//!
//! Each keystroke replaces the pending lookup: the previous task is aborted
//! and a new one waits out the quiet period before dispatching. Results are
//! only applied if they belong to the most recently issued query.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{AddressLookup, AddressSuggestion, is_searchable};
use crate::application::model::ContactInfo;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteState {
    pub query: String,
    pub suggestions: Vec<AddressSuggestion>,
    pub is_loading: bool,
    /// Non-fatal; the user can keep typing the address by hand.
    pub error: Option<String>,
}

#[derive(Default)]
struct Inner {
    state: AutocompleteState,
    /// Bumped on every query change; stale tasks compare against it.
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl Inner {
    fn supersede(&mut self) -> u64 {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.state.is_loading = false;
        self.generation
    }
}

pub struct AddressAutocomplete {
    lookup: Arc<dyn AddressLookup>,
    debounce: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl AddressAutocomplete {
    pub fn new(lookup: Arc<dyn AddressLookup>, debounce: Duration) -> Self {
        Self {
            lookup,
            debounce,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub async fn state(&self) -> AutocompleteState {
        self.inner.lock().await.state.clone()
    }

    /// Record a keystroke and schedule a lookup after the quiet period.
    pub async fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut inner = self.inner.lock().await;
        let generation = inner.supersede();
        inner.state.query = query.clone();

        if !is_searchable(&query) {
            inner.state.suggestions.clear();
            inner.state.error = None;
            return;
        }

        let lookup = Arc::clone(&self.lookup);
        let shared = Arc::clone(&self.inner);
        let debounce = self.debounce;
        inner.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            {
                let mut inner = shared.lock().await;
                if inner.generation != generation {
                    return;
                }
                inner.state.is_loading = true;
                inner.state.error = None;
            }

            let result = lookup.lookup(&query).await;

            let mut inner = shared.lock().await;
            if inner.generation != generation {
                debug!(query = %query, "Discarding stale address suggestions");
                return;
            }
            inner.state.is_loading = false;
            inner.pending = None;
            match result {
                Ok(suggestions) => inner.state.suggestions = suggestions,
                Err(e) => {
                    warn!(query = %query, "Address autocomplete error: {}", e);
                    inner.state.error = Some(e.to_string());
                    inner.state.suggestions.clear();
                }
            }
        }));
    }

    /// Accept a suggestion: the query becomes its street address and the
    /// returned update fills the contact step's address fields.
    pub async fn select(&self, suggestion: &AddressSuggestion) -> ContactInfo {
        let mut inner = self.inner.lock().await;
        inner.supersede();
        inner.state.query = suggestion.street_address.clone();
        inner.state.suggestions.clear();
        inner.state.error = None;
        suggestion.to_contact_update()
    }

    pub async fn clear_suggestions(&self) {
        self.inner.lock().await.state.suggestions.clear();
    }

    /// Abort any pending lookup.
    pub async fn cancel(&self) {
        self.inner.lock().await.supersede();
    }
}

impl Drop for AddressAutocomplete {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            if let Some(handle) = inner.pending.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use super::*;
    use crate::address::MockAddressBook;
    use crate::error::LookupError;

    /// Mock address book that records every dispatched query.
    struct Recording {
        book: MockAddressBook,
        calls: StdMutex<Vec<String>>,
        fail: bool,
    }

    impl Recording {
        fn new(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                book: MockAddressBook::new(latency),
                calls: StdMutex::new(Vec::new()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                book: MockAddressBook::new(Duration::ZERO),
                calls: StdMutex::new(Vec::new()),
                fail: true,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AddressLookup for Recording {
        async fn lookup(&self, query: &str) -> Result<Vec<AddressSuggestion>, LookupError> {
            self.calls.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(LookupError::BadStatus {
                    status: 500,
                    message: "Address lookup failed".into(),
                });
            }
            self.book.lookup(query).await
        }
    }

    const DEBOUNCE: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_quiet_period_dispatch_once() {
        let lookup = Recording::new(Duration::from_millis(300));
        let ac = AddressAutocomplete::new(lookup.clone(), DEBOUNCE);

        ac.set_query("Mai").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        ac.set_query("Main").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        ac.set_query("Main S").await;
        assert!(lookup.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(lookup.calls(), vec!["Main S".to_string()]);
        assert!(ac.state().await.is_loading);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let state = ac.state().await;
        assert!(!state.is_loading);
        assert_eq!(state.suggestions.len(), 1);
        assert_eq!(state.suggestions[0].city, "Birmingham");
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_never_dispatches() {
        let lookup = Recording::new(Duration::ZERO);
        let ac = AddressAutocomplete::new(lookup.clone(), DEBOUNCE);

        ac.set_query("12").await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(lookup.calls().is_empty());
        assert!(ac.state().await.suggestions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_query_wins_over_in_flight_lookup() {
        let lookup = Recording::new(Duration::from_secs(2));
        let ac = AddressAutocomplete::new(lookup.clone(), DEBOUNCE);

        ac.set_query("Oak").await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(lookup.calls(), vec!["Oak".to_string()]);

        // "Oak" is still in flight when the user keeps typing.
        ac.set_query("Pine").await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let state = ac.state().await;
        assert_eq!(state.query, "Pine");
        assert_eq!(state.suggestions.len(), 1);
        assert_eq!(state.suggestions[0].city, "Mobile");
        assert_eq!(lookup.calls(), vec!["Oak".to_string(), "Pine".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_failure_is_recorded_and_clears_suggestions() {
        let lookup = Recording::failing();
        let ac = AddressAutocomplete::new(lookup, DEBOUNCE);

        ac.set_query("Main").await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        let state = ac.state().await;
        assert!(state.error.as_deref().is_some_and(|e| e.contains("Address lookup failed")));
        assert!(state.suggestions.is_empty());
        assert!(!state.is_loading);

        // Shortening the query below the minimum drops the old failure.
        ac.set_query("Ma").await;
        let state = ac.state().await;
        assert!(state.error.is_none());
        assert!(state.suggestions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn select_clears_previous_error() {
        let ac = AddressAutocomplete::new(Recording::failing(), DEBOUNCE);
        ac.set_query("Main").await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(ac.state().await.error.is_some());

        let suggestion = MockAddressBook::default().lookup("Main").await.unwrap()[0].clone();
        ac.select(&suggestion).await;
        let state = ac.state().await;
        assert!(state.error.is_none());
        assert_eq!(state.query, "123 Main Street");
    }

    #[tokio::test(start_paused = true)]
    async fn select_fills_contact_fields() {
        let lookup = Recording::new(Duration::ZERO);
        let ac = AddressAutocomplete::new(lookup, DEBOUNCE);

        ac.set_query("Elm").await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        let suggestion = ac.state().await.suggestions[0].clone();

        let update = ac.select(&suggestion).await;
        assert_eq!(update.street_address.as_deref(), Some("321 Elm Street"));
        assert_eq!(update.city.as_deref(), Some("Huntsville"));
        assert_eq!(update.state.as_deref(), Some("AL"));
        assert_eq!(update.zip_code.as_deref(), Some("35801"));
        assert!(update.email.is_none());

        let state = ac.state().await;
        assert_eq!(state.query, "321 Elm Street");
        assert!(state.suggestions.is_empty());
    }
}
