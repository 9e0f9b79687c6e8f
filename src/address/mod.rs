//! Address suggestions for the contact step.
//!
//! [`AddressLookup`] is the seam the wizard depends on. [`MockAddressBook`]
//! serves a fixed list, [`HttpAddressLookup`] calls the lookup route over
//! HTTP, and [`AddressAutocomplete`] debounces keystrokes in front of either.

pub mod autocomplete;
pub mod client;
pub mod mock;
pub mod routes;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::model::ContactInfo;
use crate::error::LookupError;

pub use autocomplete::{AddressAutocomplete, AutocompleteState};
pub use client::HttpAddressLookup;
pub use mock::MockAddressBook;
pub use routes::address_routes;

/// Queries shorter than this return no suggestions and are never dispatched.
pub const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSuggestion {
    pub street_address: String,
    pub city: String,
    /// Two-letter state code.
    pub state: String,
    pub zip_code: String,
    pub full_address: String,
}

impl AddressSuggestion {
    /// Contact-step update that fills the four address fields.
    pub fn to_contact_update(&self) -> ContactInfo {
        ContactInfo {
            street_address: Some(self.street_address.clone()),
            city: Some(self.city.clone()),
            state: Some(self.state.clone()),
            zip_code: Some(self.zip_code.clone()),
            ..Default::default()
        }
    }
}

/// Whether `query` is long enough to look up.
pub fn is_searchable(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_LEN
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Suggestions matching `query`. Short queries yield an empty list.
    async fn lookup(&self, query: &str) -> Result<Vec<AddressSuggestion>, LookupError>;
}
