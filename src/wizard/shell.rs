//! Wizard shell: a presentation-free view of the active step and the
//! progress indicator, plus the three user intents (proceed, back, jump).
//! All data mutation goes through the [`FormStore`].

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::form_store::{FormStatus, FormStore, StepOutcome, SubmitOutcome};
use super::sequencer::{CompletedSteps, Step};
use super::submission::{ApplicationSummary, IntakeReceipt};
use crate::application::validation::ValidationReport;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    Completed,
    Current,
    Upcoming,
}

/// One entry of the progress indicator. Every entry is clickable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressItem {
    pub step: Step,
    pub title: &'static str,
    pub description: &'static str,
    pub state: ProgressState,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub current_step: Step,
    pub total_steps: u8,
    pub title: &'static str,
    pub description: &'static str,
    pub progress: Vec<ProgressItem>,
    /// Progress bar fill, 20..=100.
    pub percent: u8,
    pub can_go_back: bool,
    pub is_final_step: bool,
    pub is_submitting: bool,
    pub is_submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<IntakeReceipt>,
}

impl WizardView {
    pub fn from_status(status: &FormStatus) -> Self {
        let current = status.current_step;
        let progress = Step::ALL
            .iter()
            .map(|&step| ProgressItem {
                step,
                title: step.title(),
                description: step.description(),
                state: progress_state(step, current, &status.completed_steps),
            })
            .collect();

        Self {
            current_step: current,
            total_steps: Step::ALL.len() as u8,
            title: current.title(),
            description: current.description(),
            progress,
            percent: progress_percent(&status.completed_steps),
            can_go_back: current != Step::FIRST,
            is_final_step: current == Step::LAST,
            is_submitting: status.is_submitting,
            is_submitted: status.is_submitted,
            submission_error: status.submission_error.clone(),
            receipt: status.receipt.clone(),
        }
    }
}

fn progress_state(step: Step, current: Step, completed: &CompletedSteps) -> ProgressState {
    if step == current {
        ProgressState::Current
    } else if completed.contains(step) {
        ProgressState::Completed
    } else {
        ProgressState::Upcoming
    }
}

/// One step past the furthest completed step, as a share of all steps.
fn progress_percent(completed: &CompletedSteps) -> u8 {
    let furthest = completed.iter().map(|s| s.number()).max().unwrap_or(0) as u32;
    let total = Step::ALL.len() as u32;
    ((furthest + 1) * 100 / total).min(100) as u8
}

/// What happened when the user pressed the primary button.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProceedOutcome {
    Moved { step: Step },
    Blocked { report: ValidationReport },
    Submitted { receipt: IntakeReceipt },
    AlreadySubmitted,
}

pub struct WizardShell {
    store: Arc<FormStore>,
}

impl WizardShell {
    pub fn new(store: Arc<FormStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<FormStore> {
        &self.store
    }

    pub async fn view(&self) -> WizardView {
        WizardView::from_status(&self.store.status().await)
    }

    /// Validate and advance; on the final step, submit the application.
    pub async fn proceed(&self) -> Result<ProceedOutcome> {
        match self.store.next_step().await? {
            StepOutcome::Moved { step } | StepOutcome::Unchanged { step } => {
                Ok(ProceedOutcome::Moved { step })
            }
            StepOutcome::Blocked { report } => Ok(ProceedOutcome::Blocked { report }),
            StepOutcome::ReadyToSubmit => {
                debug!("Final step valid, submitting application");
                Ok(match self.store.submit().await? {
                    SubmitOutcome::Submitted { receipt } => ProceedOutcome::Submitted { receipt },
                    SubmitOutcome::AlreadySubmitted => ProceedOutcome::AlreadySubmitted,
                })
            }
        }
    }

    pub async fn back(&self) -> Result<Step> {
        match self.store.prev_step().await? {
            StepOutcome::Moved { step } | StepOutcome::Unchanged { step } => Ok(step),
            _ => Ok(self.store.current_step().await),
        }
    }

    /// Progress-indicator click.
    pub async fn jump(&self, n: u8) -> Result<Step> {
        self.store.go_to_step(n).await
    }

    /// Summary of the submitted application, once submission succeeded.
    pub async fn summary(&self) -> Option<ApplicationSummary> {
        if !self.store.is_submitted().await {
            return None;
        }
        Some(ApplicationSummary::from_draft(&self.store.draft().await))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::application::model::{
        Beneficiary, ContactInfo, Gender, LicenseInfo, PersonalInfo, Relationship,
    };
    use crate::config::StoreOptions;
    use crate::store::LibSqlBackend;
    use crate::wizard::submission::StubIntake;

    async fn shell() -> WizardShell {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let store = FormStore::init(
            db,
            Arc::new(StubIntake::new(Duration::ZERO)),
            StoreOptions::default(),
        )
        .await
        .unwrap();
        WizardShell::new(Arc::new(store))
    }

    fn status(current: Step, completed: &[u8]) -> FormStatus {
        FormStatus {
            current_step: current,
            completed_steps: CompletedSteps::decode(completed),
            is_submitting: false,
            is_submitted: false,
            submission_error: None,
            receipt: None,
            total_share: 0,
        }
    }

    #[test]
    fn progress_states_follow_current_and_completed() {
        let view = WizardView::from_status(&status(Step::Contact, &[1, 2, 3]));
        let states: Vec<_> = view.progress.iter().map(|p| p.state).collect();
        assert_eq!(
            states,
            vec![
                ProgressState::Completed,
                ProgressState::Current,
                ProgressState::Completed,
                ProgressState::Upcoming,
                ProgressState::Upcoming,
            ]
        );
        assert_eq!(view.title, "Contact");
        assert!(view.can_go_back);
        assert!(!view.is_final_step);
    }

    #[test]
    fn percent_tracks_furthest_completed_step() {
        assert_eq!(progress_percent(&CompletedSteps::decode(&[])), 20);
        assert_eq!(progress_percent(&CompletedSteps::decode(&[1, 2])), 60);
        assert_eq!(progress_percent(&CompletedSteps::decode(&[1, 2, 3, 4])), 100);
        assert_eq!(progress_percent(&CompletedSteps::decode(&[1, 2, 3, 4, 5])), 100);
    }

    #[tokio::test]
    async fn proceed_walks_to_submission() {
        let shell = shell().await;
        let store = shell.store();

        assert!(matches!(
            shell.proceed().await.unwrap(),
            ProceedOutcome::Blocked { .. }
        ));

        store
            .update_personal_info(PersonalInfo {
                first_name: Some("John".into()),
                last_name: Some("Doe".into()),
                date_of_birth: NaiveDate::from_ymd_opt(1980, 5, 17),
                gender: Some(Gender::Male),
                tax_id: Some("123-45-6789".into()),
            })
            .await
            .unwrap();
        assert_eq!(
            shell.proceed().await.unwrap(),
            ProceedOutcome::Moved { step: Step::Contact }
        );

        store
            .update_contact_info(ContactInfo {
                street_address: Some("123 Main Street".into()),
                city: Some("Birmingham".into()),
                state: Some("AL".into()),
                zip_code: Some("35203".into()),
                email: Some("john@example.com".into()),
                phone: Some("(205) 555-0100".into()),
            })
            .await
            .unwrap();
        shell.proceed().await.unwrap();
        // Physical step passes on smart defaults alone.
        assert_eq!(
            shell.proceed().await.unwrap(),
            ProceedOutcome::Moved { step: Step::License }
        );
        assert_eq!(shell.back().await.unwrap(), Step::Physical);
        shell.proceed().await.unwrap();

        store
            .update_license_info(LicenseInfo {
                license_number: Some("D1234567".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        shell.proceed().await.unwrap();
        assert!(shell.summary().await.is_none());

        store
            .add_beneficiary(Beneficiary::new(
                "Jane",
                "Doe",
                Relationship::Spouse,
                NaiveDate::from_ymd_opt(1982, 3, 3).unwrap(),
                100,
            ))
            .await
            .unwrap();
        assert!(matches!(
            shell.proceed().await.unwrap(),
            ProceedOutcome::Submitted { .. }
        ));

        let view = shell.view().await;
        assert!(view.is_submitted);
        assert!(view.is_final_step);
        assert_eq!(view.percent, 100);
        let summary = shell.summary().await.unwrap();
        assert_eq!(summary.tax_id, "***-**-6789");
        assert_eq!(shell.proceed().await.unwrap(), ProceedOutcome::AlreadySubmitted);
    }

    #[tokio::test]
    async fn jump_does_not_complete_steps() {
        let shell = shell().await;
        assert_eq!(shell.jump(5).await.unwrap(), Step::Beneficiary);
        let view = shell.view().await;
        assert_eq!(view.percent, 20);
        assert!(
            view.progress[..4]
                .iter()
                .all(|p| p.state == ProgressState::Upcoming)
        );
        assert!(shell.jump(0).await.is_err());
    }
}
