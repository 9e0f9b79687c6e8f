//! REST endpoints for driving the onboarding wizard.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use super::shell::{ProceedOutcome, WizardShell};
use crate::application::model::{
    Beneficiary, BeneficiaryUpdate, ContactInfo, LicenseInfo, PersonalInfo, PhysicalInfo,
    Relationship, us_date,
};
use crate::application::validation::ValidationReport;
use crate::error::{DraftError, Error, SubmissionError};

type ApiResponse = (StatusCode, Json<Value>);

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub shell: Arc<WizardShell>,
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/api/onboarding/status", get(get_status))
        .route("/api/onboarding/draft", get(get_draft))
        .route("/api/onboarding/summary", get(get_summary))
        .route("/api/onboarding/personal", put(update_personal))
        .route("/api/onboarding/contact", put(update_contact))
        .route("/api/onboarding/physical", put(update_physical))
        .route("/api/onboarding/license", put(update_license))
        .route("/api/onboarding/beneficiaries", post(add_beneficiary))
        .route(
            "/api/onboarding/beneficiaries/{id}",
            patch(update_beneficiary).delete(remove_beneficiary),
        )
        .route("/api/onboarding/next", post(next_step))
        .route("/api/onboarding/back", post(prev_step))
        .route("/api/onboarding/steps/{n}", post(go_to_step))
        .route("/api/onboarding/submit", post(submit))
        .route("/api/onboarding/reset", post(reset))
        .with_state(state)
}

fn error_response(err: Error) -> ApiResponse {
    let status = match &err {
        Error::Submission(SubmissionError::Incomplete(report)) => return invalid(report),
        Error::Submission(SubmissionError::InProgress) => StatusCode::CONFLICT,
        Error::Submission(SubmissionError::Intake(_)) => StatusCode::BAD_GATEWAY,
        Error::Draft(DraftError::DuplicateBeneficiary(_)) => StatusCode::CONFLICT,
        Error::Draft(DraftError::BeneficiaryNotFound(_)) => StatusCode::NOT_FOUND,
        Error::Draft(DraftError::StepOutOfRange(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!("Onboarding request failed: {}", err);
    }
    (status, Json(json!({"error": err.to_string()})))
}

fn invalid(report: &ValidationReport) -> ApiResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"error": "Validation failed", "errors": report.errors})),
    )
}

fn parse_id(id: &str) -> Result<Uuid, ApiResponse> {
    Uuid::parse_str(id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid beneficiary ID"})),
        )
    })
}

// ── Reads ───────────────────────────────────────────────────────────────

async fn get_status(State(state): State<OnboardingRouteState>) -> ApiResponse {
    (StatusCode::OK, Json(json!(state.shell.view().await)))
}

async fn get_draft(State(state): State<OnboardingRouteState>) -> ApiResponse {
    (StatusCode::OK, Json(json!(state.shell.store().draft().await)))
}

async fn get_summary(State(state): State<OnboardingRouteState>) -> ApiResponse {
    match state.shell.summary().await {
        Some(summary) => (StatusCode::OK, Json(json!(summary))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Application has not been submitted"})),
        ),
    }
}

// ── Section updates ─────────────────────────────────────────────────────

async fn update_personal(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<PersonalInfo>,
) -> ApiResponse {
    let store = state.shell.store();
    match store.update_personal_info(body).await {
        Ok(()) => (StatusCode::OK, Json(json!(store.draft().await.personal_info))),
        Err(e) => error_response(e),
    }
}

async fn update_contact(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<ContactInfo>,
) -> ApiResponse {
    let store = state.shell.store();
    match store.update_contact_info(body).await {
        Ok(()) => {
            let draft = store.draft().await;
            (
                StatusCode::OK,
                Json(json!({
                    "contactInfo": draft.contact_info,
                    "licenseInfo": draft.license_info,
                })),
            )
        }
        Err(e) => error_response(e),
    }
}

async fn update_physical(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<PhysicalInfo>,
) -> ApiResponse {
    let store = state.shell.store();
    match store.update_physical_info(body).await {
        Ok(()) => (StatusCode::OK, Json(json!(store.draft().await.physical_info))),
        Err(e) => error_response(e),
    }
}

async fn update_license(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<LicenseInfo>,
) -> ApiResponse {
    let store = state.shell.store();
    match store.update_license_info(body).await {
        Ok(()) => (StatusCode::OK, Json(json!(store.draft().await.license_info))),
        Err(e) => error_response(e),
    }
}

// ── Beneficiaries ───────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewBeneficiaryRequest {
    first_name: String,
    last_name: String,
    relationship: Relationship,
    #[serde(with = "us_date")]
    date_of_birth: NaiveDate,
    share_percent: u8,
}

async fn add_beneficiary(
    State(state): State<OnboardingRouteState>,
    Json(body): Json<NewBeneficiaryRequest>,
) -> ApiResponse {
    let beneficiary = Beneficiary::new(
        body.first_name,
        body.last_name,
        body.relationship,
        body.date_of_birth,
        body.share_percent,
    );
    let created = beneficiary.clone();

    match state.shell.store().add_beneficiary(beneficiary).await {
        Ok(report) if report.is_valid() => {
            info!(id = %created.id, "Beneficiary added");
            (StatusCode::CREATED, Json(json!(created)))
        }
        Ok(report) => invalid(&report),
        Err(e) => error_response(e),
    }
}

async fn update_beneficiary(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<String>,
    Json(body): Json<BeneficiaryUpdate>,
) -> ApiResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let store = state.shell.store();
    match store.update_beneficiary(id, body).await {
        Ok(report) if report.is_valid() => {
            let draft = store.draft().await;
            (StatusCode::OK, Json(json!(draft.beneficiary(id))))
        }
        Ok(report) => invalid(&report),
        Err(e) => error_response(e),
    }
}

async fn remove_beneficiary(
    State(state): State<OnboardingRouteState>,
    Path(id): Path<String>,
) -> ApiResponse {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.shell.store().remove_beneficiary(id).await {
        Ok(true) => (StatusCode::OK, Json(json!({"status": "removed"}))),
        Ok(false) => error_response(DraftError::BeneficiaryNotFound(id).into()),
        Err(e) => error_response(e),
    }
}

// ── Navigation ──────────────────────────────────────────────────────────

async fn next_step(State(state): State<OnboardingRouteState>) -> ApiResponse {
    match state.shell.proceed().await {
        Ok(ProceedOutcome::Blocked { report }) => invalid(&report),
        Ok(outcome) => (StatusCode::OK, Json(json!(outcome))),
        Err(e) => error_response(e),
    }
}

async fn prev_step(State(state): State<OnboardingRouteState>) -> ApiResponse {
    match state.shell.back().await {
        Ok(step) => (StatusCode::OK, Json(json!({"currentStep": step}))),
        Err(e) => error_response(e),
    }
}

async fn go_to_step(State(state): State<OnboardingRouteState>, Path(n): Path<u8>) -> ApiResponse {
    match state.shell.jump(n).await {
        Ok(step) => (StatusCode::OK, Json(json!({"currentStep": step}))),
        Err(e) => error_response(e),
    }
}

// ── Submission ──────────────────────────────────────────────────────────

async fn submit(State(state): State<OnboardingRouteState>) -> ApiResponse {
    match state.shell.store().submit().await {
        Ok(outcome) => (StatusCode::OK, Json(json!(outcome))),
        Err(e) => error_response(e),
    }
}

async fn reset(State(state): State<OnboardingRouteState>) -> ApiResponse {
    match state.shell.store().reset().await {
        Ok(()) => (StatusCode::OK, Json(json!(state.shell.view().await))),
        Err(e) => error_response(e),
    }
}
