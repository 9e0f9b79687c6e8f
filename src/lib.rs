//! NewBridge onboarding: insurance application wizard core.

pub mod address;
pub mod application;
pub mod config;
pub mod error;
pub mod store;
pub mod wizard;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use address::{AddressLookup, address_routes};
use wizard::{OnboardingRouteState, WizardShell, onboarding_routes};

/// Full HTTP surface: health, address lookup, and the onboarding wizard.
pub fn app_router(shell: Arc<WizardShell>, lookup: Arc<dyn AddressLookup>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(address_routes(lookup))
        .merge(onboarding_routes(OnboardingRouteState { shell }))
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "newbridge-onboarding"
    }))
}
