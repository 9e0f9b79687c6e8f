//! `GET /api/address-lookup`: address suggestions over HTTP.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use super::{AddressLookup, is_searchable};

#[derive(Clone)]
pub struct AddressRouteState {
    pub lookup: Arc<dyn AddressLookup>,
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    #[serde(default)]
    query: Option<String>,
}

pub fn address_routes(lookup: Arc<dyn AddressLookup>) -> Router {
    Router::new()
        .route("/api/address-lookup", get(address_lookup))
        .with_state(AddressRouteState { lookup })
}

async fn address_lookup(
    State(state): State<AddressRouteState>,
    Query(params): Query<LookupParams>,
) -> (StatusCode, Json<Value>) {
    let query = params.query.unwrap_or_default();
    if !is_searchable(&query) {
        return (
            StatusCode::OK,
            Json(json!({
                "suggestions": [],
                "message": "Query must be at least 3 characters",
            })),
        );
    }

    match state.lookup.lookup(&query).await {
        Ok(suggestions) => {
            let count = suggestions.len();
            (
                StatusCode::OK,
                Json(json!({"suggestions": suggestions, "count": count})),
            )
        }
        Err(e) => {
            error!(query = %query, "Address lookup error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch address suggestions",
                    "message": e.to_string(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::address::{AddressSuggestion, MockAddressBook};
    use crate::error::LookupError;

    struct Unavailable;

    #[async_trait]
    impl AddressLookup for Unavailable {
        async fn lookup(&self, _query: &str) -> Result<Vec<AddressSuggestion>, LookupError> {
            Err(LookupError::RequestFailed("provider down".into()))
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn mock_app() -> Router {
        address_routes(Arc::new(MockAddressBook::new(Duration::ZERO)))
    }

    #[tokio::test]
    async fn returns_matches_with_count() {
        let (status, body) = get_json(mock_app(), "/api/address-lookup?query=Veterans").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["suggestions"][0]["city"], "Florence");
        assert_eq!(body["suggestions"][0]["fullAddress"], "910 Veterans Drive, Florence, AL 35630");
    }

    #[tokio::test]
    async fn short_or_missing_query_gets_message() {
        for uri in ["/api/address-lookup?query=12", "/api/address-lookup"] {
            let (status, body) = get_json(mock_app(), uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["suggestions"], json!([]));
            assert_eq!(body["message"], "Query must be at least 3 characters");
            assert!(body.get("count").is_none());
        }
    }

    #[tokio::test]
    async fn provider_failure_is_500() {
        let (status, body) = get_json(
            address_routes(Arc::new(Unavailable)),
            "/api/address-lookup?query=Main",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch address suggestions");
        assert!(body["message"].as_str().unwrap().contains("provider down"));
    }
}
