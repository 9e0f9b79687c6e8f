//! FormStore: single source of truth for the application draft and the
//! step sequencer.
//!
//! Every mutation is applied in memory and then written through to durable
//! storage as a [`DraftSnapshot`]. The store is constructed explicitly with
//! [`FormStore::init`] (which rehydrates the last snapshot) and torn down
//! with [`FormStore::dispose`].

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::sequencer::{CompletedSteps, Sequencer, Step};
use super::snapshot::DraftSnapshot;
use super::submission::{ApplicationIntake, IntakeReceipt};
use crate::application::format::{format_phone, format_tax_id, format_zip_code};
use crate::application::model::{
    ApplicationDraft, Beneficiary, BeneficiaryUpdate, ContactInfo, LicenseInfo, PersonalInfo,
    PhysicalInfo,
};
use crate::application::validation::{
    ValidationReport, validate_beneficiary, validate_draft, validate_step,
};
use crate::config::{PersistFailurePolicy, StoreOptions};
use crate::error::{DatabaseError, DraftError, Result, SubmissionError};
use crate::store::Database;

/// In-memory wizard state. Only the draft and sequencer are persisted; the
/// submission flags and the license override flag live for the session.
#[derive(Debug, Clone, Default)]
struct FormState {
    draft: ApplicationDraft,
    sequencer: Sequencer,
    is_submitting: bool,
    is_submitted: bool,
    submission_error: Option<String>,
    receipt: Option<IntakeReceipt>,
    /// Set once the user picks a license state different from the contact state.
    license_state_overridden: bool,
}

impl FormState {
    fn rehydrated(snapshot: DraftSnapshot) -> Self {
        let (draft, sequencer) = snapshot.into_parts();
        Self {
            draft,
            sequencer,
            ..Default::default()
        }
    }

    fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot::capture(&self.draft, &self.sequencer)
    }
}

/// Result of asking the wizard to move forward.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The active step changed.
    Moved { step: Step },
    /// The current step's fields failed validation; nothing changed.
    Blocked { report: ValidationReport },
    /// Nothing to do (already on the first step when going back).
    Unchanged { step: Step },
    /// The final step is valid; the caller should submit.
    ReadyToSubmit,
}

/// Result of a submission attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Submitted { receipt: IntakeReceipt },
    /// A previous submission already succeeded; call `reset` to start over.
    AlreadySubmitted,
}

/// Snapshot of store status for display and the REST surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStatus {
    pub current_step: Step,
    pub completed_steps: CompletedSteps,
    pub is_submitting: bool,
    pub is_submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<IntakeReceipt>,
    pub total_share: u32,
}

pub struct FormStore {
    db: Arc<dyn Database>,
    intake: Arc<dyn ApplicationIntake>,
    options: StoreOptions,
    state: RwLock<FormState>,
}

impl FormStore {
    /// Create the store and rehydrate the last persisted snapshot, if any.
    ///
    /// A malformed snapshot is logged and replaced with a fresh draft. A
    /// storage read failure follows the configured persist-failure policy.
    pub async fn init(
        db: Arc<dyn Database>,
        intake: Arc<dyn ApplicationIntake>,
        options: StoreOptions,
    ) -> Result<Self> {
        let state = match db.load_snapshot(&options.user_id, &options.storage_key).await {
            Ok(Some(stored)) => match DraftSnapshot::from_value(stored.payload) {
                Ok(snapshot) => {
                    info!(
                        step = snapshot.current_step.number(),
                        completed = ?snapshot.completed_steps.encode(),
                        revision = stored.revision,
                        saved_at = %stored.saved_at,
                        "Rehydrated onboarding draft"
                    );
                    FormState::rehydrated(snapshot)
                }
                Err(e) => {
                    warn!(revision = stored.revision, "Discarding unreadable onboarding snapshot: {}", e);
                    FormState::default()
                }
            },
            Ok(None) => {
                debug!("No saved onboarding draft, starting fresh");
                FormState::default()
            }
            Err(e) => match options.persist_failures {
                PersistFailurePolicy::Log => {
                    warn!("Failed to load onboarding snapshot: {}", e);
                    FormState::default()
                }
                PersistFailurePolicy::Report => return Err(e.into()),
            },
        };

        Ok(Self {
            db,
            intake,
            options,
            state: RwLock::new(state),
        })
    }

    /// Write a final snapshot and release the store.
    pub async fn dispose(self) -> Result<()> {
        let state = self.state.read().await;
        self.persist(state.snapshot()).await?;
        drop(state);
        info!("Onboarding store disposed");
        Ok(())
    }

    fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    /// Apply `f` and persist the resulting snapshot, both under the write
    /// lock, so stored snapshots land in the same order as in-memory edits.
    ///
    /// The draft is frozen while a submission is in flight.
    async fn mutate<R>(&self, f: impl FnOnce(&mut FormState) -> R) -> Result<R> {
        let mut state = self.state.write().await;
        if state.is_submitting {
            debug!("Draft change rejected, submission in progress");
            return Err(SubmissionError::InProgress.into());
        }
        let out = f(&mut state);
        self.persist(state.snapshot()).await?;
        Ok(out)
    }

    async fn persist(&self, snapshot: DraftSnapshot) -> Result<()> {
        let result = match snapshot.to_value() {
            Ok(value) => self
                .db
                .save_snapshot(&self.options.user_id, &self.options.storage_key, &value)
                .await
                .map(drop),
            Err(e) => Err(DatabaseError::Serialization(e.to_string())),
        };
        self.settle(result)
    }

    /// Apply the persist-failure policy to a storage result.
    fn settle(&self, result: std::result::Result<(), DatabaseError>) -> Result<()> {
        match (result, self.options.persist_failures) {
            (Ok(()), _) => Ok(()),
            (Err(e), PersistFailurePolicy::Log) => {
                warn!("Failed to persist onboarding draft: {}", e);
                Ok(())
            }
            (Err(e), PersistFailurePolicy::Report) => Err(e.into()),
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub async fn draft(&self) -> ApplicationDraft {
        self.state.read().await.draft.clone()
    }

    pub async fn current_step(&self) -> Step {
        self.state.read().await.sequencer.current()
    }

    pub async fn completed_steps(&self) -> CompletedSteps {
        self.state.read().await.sequencer.completed()
    }

    pub async fn is_submitted(&self) -> bool {
        self.state.read().await.is_submitted
    }

    pub async fn submission_error(&self) -> Option<String> {
        self.state.read().await.submission_error.clone()
    }

    pub async fn license_state_overridden(&self) -> bool {
        self.state.read().await.license_state_overridden
    }

    pub async fn status(&self) -> FormStatus {
        let state = self.state.read().await;
        FormStatus {
            current_step: state.sequencer.current(),
            completed_steps: state.sequencer.completed(),
            is_submitting: state.is_submitting,
            is_submitted: state.is_submitted,
            submission_error: state.submission_error.clone(),
            receipt: state.receipt.clone(),
            total_share: state.draft.total_share(),
        }
    }

    /// Validate the active step against the current draft without moving.
    pub async fn validate_current_step(&self) -> ValidationReport {
        let state = self.state.read().await;
        validate_step(state.sequencer.current(), &state.draft, Self::today())
    }

    // ── Section updates ─────────────────────────────────────────────

    /// Merge personal fields. The tax id is reformatted as `XXX-XX-XXXX`.
    pub async fn update_personal_info(&self, mut update: PersonalInfo) -> Result<()> {
        if let Some(tax_id) = update.tax_id.as_mut() {
            *tax_id = format_tax_id(tax_id);
        }
        self.mutate(|s| s.draft.personal_info.merge_from(update)).await
    }

    /// Merge contact fields, reformatting phone and ZIP. A new `state` is
    /// copied into the license state unless the user has already chosen a
    /// different license state.
    pub async fn update_contact_info(&self, mut update: ContactInfo) -> Result<()> {
        if let Some(phone) = update.phone.as_mut() {
            *phone = format_phone(phone);
        }
        if let Some(zip) = update.zip_code.as_mut() {
            *zip = format_zip_code(zip);
        }
        self.mutate(|s| {
            let new_state = update.state.clone().filter(|code| !code.is_empty());
            s.draft.contact_info.merge_from(update);
            if let Some(code) = new_state {
                if s.license_state_overridden {
                    debug!(state = %code, "License state overridden by user, not auto-filling");
                } else {
                    debug!(state = %code, "Auto-filling license state from contact state");
                    s.draft.license_info.license_state = Some(code);
                }
            }
        })
        .await
    }

    pub async fn update_physical_info(&self, update: PhysicalInfo) -> Result<()> {
        self.mutate(|s| s.draft.physical_info.merge_from(update))
            .await
    }

    pub async fn update_license_info(&self, update: LicenseInfo) -> Result<()> {
        self.mutate(|s| {
            if let Some(chosen) = update.license_state.as_deref() {
                let matches_contact = s.draft.contact_info.state.as_deref() == Some(chosen);
                s.license_state_overridden = !chosen.is_empty() && !matches_contact;
            }
            s.draft.license_info.merge_from(update);
        })
        .await
    }

    // ── Beneficiaries ───────────────────────────────────────────────

    /// Add a beneficiary. Returns the entry's validation report; the entry is
    /// only added when the report is clean. The 100% total is not checked here.
    pub async fn add_beneficiary(&self, beneficiary: Beneficiary) -> Result<ValidationReport> {
        let report = validate_beneficiary(&beneficiary, Self::today());
        if !report.is_valid() {
            return Ok(report);
        }

        let added = self
            .mutate(|s| {
                if s.draft.beneficiary(beneficiary.id).is_some() {
                    return Err(DraftError::DuplicateBeneficiary(beneficiary.id));
                }
                debug!(id = %beneficiary.id, share = beneficiary.share_percent, "Adding beneficiary");
                s.draft.beneficiaries.push(beneficiary);
                Ok(())
            })
            .await?;
        added?;
        Ok(report)
    }

    /// Edit a beneficiary in place. Returns the validation report of the
    /// edited entry; the edit is only kept when the report is clean.
    pub async fn update_beneficiary(
        &self,
        id: Uuid,
        update: BeneficiaryUpdate,
    ) -> Result<ValidationReport> {
        let today = Self::today();
        let outcome = self
            .mutate(|s| {
                let Some(existing) = s.draft.beneficiaries.iter_mut().find(|b| b.id == id) else {
                    return Err(DraftError::BeneficiaryNotFound(id));
                };
                let mut edited = existing.clone();
                edited.apply(update);
                let report = validate_beneficiary(&edited, today);
                if report.is_valid() {
                    *existing = edited;
                }
                Ok(report)
            })
            .await?;
        Ok(outcome?)
    }

    /// Remove a beneficiary. Returns whether it existed.
    pub async fn remove_beneficiary(&self, id: Uuid) -> Result<bool> {
        self.mutate(|s| {
            let before = s.draft.beneficiaries.len();
            s.draft.beneficiaries.retain(|b| b.id != id);
            before != s.draft.beneficiaries.len()
        })
        .await
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Validate the current step and move forward if it passes.
    ///
    /// On the last step a valid draft yields [`StepOutcome::ReadyToSubmit`]
    /// instead of moving; there is no step after Beneficiary.
    pub async fn next_step(&self) -> Result<StepOutcome> {
        let today = Self::today();
        self.mutate(|s| {
            let current = s.sequencer.current();
            let report = validate_step(current, &s.draft, today);
            if !report.is_valid() {
                debug!(step = current.number(), errors = report.errors.len(), "Step blocked");
                return StepOutcome::Blocked { report };
            }
            match s.sequencer.advance() {
                Some(step) => StepOutcome::Moved { step },
                None => StepOutcome::ReadyToSubmit,
            }
        })
        .await
    }

    pub async fn prev_step(&self) -> Result<StepOutcome> {
        self.mutate(|s| match s.sequencer.retreat() {
            Some(step) => StepOutcome::Moved { step },
            None => StepOutcome::Unchanged {
                step: s.sequencer.current(),
            },
        })
        .await
    }

    /// Jump to step `n` (1-5) without validation or completion changes.
    pub async fn go_to_step(&self, n: u8) -> Result<Step> {
        let step = self.mutate(|s| s.sequencer.jump_to(n)).await?;
        step.ok_or_else(|| DraftError::StepOutOfRange(n).into())
    }

    pub async fn mark_step_complete(&self, step: Step) -> Result<()> {
        self.mutate(|s| {
            s.sequencer.mark_complete(step);
        })
        .await
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Validate the whole draft and hand it to the intake.
    ///
    /// Repeated calls after a successful submission are no-ops until
    /// [`reset`](Self::reset). Failures leave the draft untouched and record
    /// a `submission_error` the user can retry from.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let draft = {
            let mut state = self.state.write().await;
            if state.is_submitted {
                debug!("Application already submitted, ignoring");
                return Ok(SubmitOutcome::AlreadySubmitted);
            }
            if state.is_submitting {
                return Err(SubmissionError::InProgress.into());
            }

            let report = validate_draft(&state.draft, Self::today());
            if !report.is_valid() {
                let message = report
                    .message_for("beneficiaries")
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        format!(
                            "Please complete all required fields ({} need attention)",
                            report.errors.len()
                        )
                    });
                warn!(errors = report.errors.len(), "Submission blocked: {}", message);
                state.submission_error = Some(message);
                return Err(SubmissionError::Incomplete(report).into());
            }

            state.is_submitting = true;
            state.submission_error = None;
            state.draft.clone()
        };

        let result = self.intake.submit(&draft).await;

        let mut state = self.state.write().await;
        state.is_submitting = false;
        match result {
            Ok(receipt) => {
                info!(reference = %receipt.reference, "Onboarding application submitted");
                state.is_submitted = true;
                state.receipt = Some(receipt.clone());
                Ok(SubmitOutcome::Submitted { receipt })
            }
            Err(e) => {
                warn!("Onboarding submission failed: {}", e);
                state.submission_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn set_submission_error(&self, error: Option<String>) {
        self.state.write().await.submission_error = error;
    }

    /// Discard the draft and start over with smart defaults. The stored
    /// snapshot is deleted; the next mutation writes a fresh one.
    ///
    /// Not allowed while a submission is in flight.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_submitting {
            return Err(SubmissionError::InProgress.into());
        }
        info!("Resetting onboarding draft");
        *state = FormState::default();
        let result = self
            .db
            .delete_snapshot(&self.options.user_id, &self.options.storage_key)
            .await
            .map(drop);
        self.settle(result)
    }
}
