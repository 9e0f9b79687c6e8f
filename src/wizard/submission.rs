//! Application intake seam and the submitted-application summary.
//!
//! The intake is the only place a finished draft leaves the wizard. The
//! bundled [`StubIntake`] waits a fixed delay, logs the application, and
//! always succeeds.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::application::format::{BmiCategory, bmi, format_date_display, mask_tax_id};
use crate::application::model::ApplicationDraft;
use crate::application::options::state_name;
use crate::error::SubmissionError;

/// Acknowledgement returned by the intake on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeReceipt {
    pub reference: Uuid,
    pub received_at: DateTime<Utc>,
}

/// Receives completed applications.
#[async_trait]
pub trait ApplicationIntake: Send + Sync {
    async fn submit(&self, application: &ApplicationDraft) -> Result<IntakeReceipt, SubmissionError>;
}

/// Intake that simulates processing time and accepts everything.
pub struct StubIntake {
    delay: Duration,
}

impl StubIntake {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for StubIntake {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl ApplicationIntake for StubIntake {
    async fn submit(&self, application: &ApplicationDraft) -> Result<IntakeReceipt, SubmissionError> {
        let summary = ApplicationSummary::from_draft(application);
        info!(
            applicant = %summary.applicant_name,
            tax_id = %summary.tax_id,
            state = summary.state.as_deref().unwrap_or("-"),
            beneficiaries = summary.beneficiaries.len(),
            "Submitting onboarding application"
        );

        tokio::time::sleep(self.delay).await;

        let receipt = IntakeReceipt {
            reference: Uuid::new_v4(),
            received_at: Utc::now(),
        };
        info!(reference = %receipt.reference, "Application accepted by stub intake");
        Ok(receipt)
    }
}

/// Read-only rendering of a submitted application, with sensitive fields masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub applicant_name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    /// Masked, e.g. `***-**-6789`.
    pub tax_id: String,
    pub street_address: Option<String>,
    pub city: Option<String>,
    /// Full state name when the code is a known state, otherwise the raw code.
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// e.g. `5'9"`.
    pub height: Option<String>,
    pub weight: Option<String>,
    /// e.g. `25.1 (Overweight)`.
    pub bmi: Option<String>,
    pub tobacco_use: &'static str,
    pub license: &'static str,
    pub beneficiaries: Vec<String>,
}

impl ApplicationSummary {
    pub fn from_draft(draft: &ApplicationDraft) -> Self {
        let personal = &draft.personal_info;
        let contact = &draft.contact_info;
        let physical = &draft.physical_info;

        let applicant_name = [personal.first_name.as_deref(), personal.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        let height = match (physical.height_feet, physical.height_inches) {
            (Some(ft), Some(inch)) => Some(format!("{ft}'{inch}\"")),
            _ => None,
        };

        let bmi_label = match (physical.height_feet, physical.height_inches, physical.weight_pounds) {
            (Some(ft), Some(inch), Some(lb)) => bmi(ft, inch, lb)
                .map(|v| format!("{v:.1} ({})", BmiCategory::from_bmi(v).label())),
            _ => None,
        };

        Self {
            applicant_name,
            date_of_birth: personal.date_of_birth.map(format_date_display),
            gender: personal.gender.map(|g| g.to_string()),
            tax_id: mask_tax_id(personal.tax_id.as_deref().unwrap_or_default()),
            street_address: contact.street_address.clone(),
            city: contact.city.clone(),
            state: contact
                .state
                .as_deref()
                .map(|code| state_name(code).unwrap_or(code).to_string()),
            zip_code: contact.zip_code.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            height,
            weight: physical.weight_pounds.map(|w| format!("{w} lbs")),
            bmi: bmi_label,
            tobacco_use: if physical.tobacco_use_last_12_months == Some(true) {
                "Yes"
            } else {
                "No"
            },
            license: if draft.license_info.has_license == Some(true) {
                "Valid"
            } else {
                "None"
            },
            beneficiaries: draft
                .beneficiaries
                .iter()
                .map(|b| format!("{} ({}) {}%", b.full_name(), b.relationship, b.share_percent))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::application::model::{Beneficiary, Gender, Relationship};

    fn draft() -> ApplicationDraft {
        let mut draft = ApplicationDraft::new();
        draft.personal_info.first_name = Some("John".into());
        draft.personal_info.last_name = Some("Doe".into());
        draft.personal_info.date_of_birth = NaiveDate::from_ymd_opt(1980, 1, 2);
        draft.personal_info.gender = Some(Gender::Male);
        draft.personal_info.tax_id = Some("123-45-6789".into());
        draft.contact_info.state = Some("AL".into());
        draft.beneficiaries.push(Beneficiary::new(
            "Jane",
            "Doe",
            Relationship::Spouse,
            NaiveDate::from_ymd_opt(1982, 5, 5).unwrap(),
            100,
        ));
        draft
    }

    #[test]
    fn summary_masks_and_expands() {
        let summary = ApplicationSummary::from_draft(&draft());
        assert_eq!(summary.applicant_name, "John Doe");
        assert_eq!(summary.tax_id, "***-**-6789");
        assert_eq!(summary.state.as_deref(), Some("Alabama"));
        assert_eq!(summary.date_of_birth.as_deref(), Some("January 2, 1980"));
        assert_eq!(summary.height.as_deref(), Some("5'9\""));
        assert_eq!(summary.weight.as_deref(), Some("170 lbs"));
        assert_eq!(summary.bmi.as_deref(), Some("25.1 (Overweight)"));
        assert_eq!(summary.tobacco_use, "No");
        assert_eq!(summary.license, "Valid");
        assert_eq!(summary.beneficiaries, vec!["Jane Doe (Spouse) 100%".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn stub_intake_waits_then_accepts() {
        let intake = StubIntake::new(Duration::from_secs(1));
        let started = tokio::time::Instant::now();
        let receipt = intake.submit(&draft()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(receipt.received_at <= Utc::now());
    }
}
