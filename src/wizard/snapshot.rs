//! Persisted shape of the wizard: draft fields plus sequencer position.
//!
//! Stored as JSON under the store's storage key:
//! `{currentStep, completedSteps: [..], personalInfo, contactInfo,
//! physicalInfo, licenseInfo, beneficiaries: [..]}`.

use serde::{Deserialize, Serialize};

use super::sequencer::{CompletedSteps, Sequencer, Step};
use crate::application::model::{
    ApplicationDraft, Beneficiary, ContactInfo, LicenseInfo, PersonalInfo, PhysicalInfo,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub current_step: Step,
    pub completed_steps: CompletedSteps,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub physical_info: PhysicalInfo,
    #[serde(default)]
    pub license_info: LicenseInfo,
    #[serde(default)]
    pub beneficiaries: Vec<Beneficiary>,
}

impl DraftSnapshot {
    pub fn capture(draft: &ApplicationDraft, sequencer: &Sequencer) -> Self {
        Self {
            current_step: sequencer.current(),
            completed_steps: sequencer.completed(),
            personal_info: draft.personal_info.clone(),
            contact_info: draft.contact_info.clone(),
            physical_info: draft.physical_info.clone(),
            license_info: draft.license_info.clone(),
            beneficiaries: draft.beneficiaries.clone(),
        }
    }

    pub fn into_parts(self) -> (ApplicationDraft, Sequencer) {
        let draft = ApplicationDraft {
            personal_info: self.personal_info,
            contact_info: self.contact_info,
            physical_info: self.physical_info,
            license_info: self.license_info,
            beneficiaries: self.beneficiaries,
        };
        (draft, Sequencer::restore(self.current_step, self.completed_steps))
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::application::model::{Gender, Relationship};

    fn sample() -> (ApplicationDraft, Sequencer) {
        let mut draft = ApplicationDraft::new();
        draft.personal_info = PersonalInfo {
            first_name: Some("Ada".into()),
            last_name: Some("Byron".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1975, 12, 10),
            gender: Some(Gender::Female),
            tax_id: Some("123-45-6789".into()),
        };
        draft.contact_info.state = Some("AL".into());
        draft.license_info.license_state = Some("AL".into());
        draft.beneficiaries.push(Beneficiary::new(
            "Lovelace",
            "Byron",
            Relationship::Child,
            NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            100,
        ));

        let mut seq = Sequencer::new();
        seq.advance();
        seq.advance();
        seq.advance();
        seq.jump_to(2);
        (draft, seq)
    }

    #[test]
    fn persist_then_rehydrate_is_identical() {
        let (draft, seq) = sample();
        let value = DraftSnapshot::capture(&draft, &seq).to_value().unwrap();
        let json = serde_json::to_string(&value).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let (restored_draft, restored_seq) = DraftSnapshot::from_value(parsed).unwrap().into_parts();
        assert_eq!(restored_draft, draft);
        assert_eq!(restored_seq, seq);
        assert!(restored_seq.completed().contains(Step::Physical));
    }

    #[test]
    fn wire_shape_matches_storage_contract() {
        let (draft, seq) = sample();
        let value = DraftSnapshot::capture(&draft, &seq).to_value().unwrap();
        assert_eq!(value["currentStep"], 2);
        assert_eq!(value["completedSteps"], serde_json::json!([1, 2, 3]));
        assert_eq!(value["personalInfo"]["firstName"], "Ada");
        assert_eq!(value["beneficiaries"][0]["sharePercent"], 100);
        assert!(value.get("isSubmitted").is_none());
    }

    #[test]
    fn missing_sections_fall_back_to_empty() {
        let value = serde_json::json!({"currentStep": 1, "completedSteps": []});
        let snapshot = DraftSnapshot::from_value(value).unwrap();
        assert!(snapshot.beneficiaries.is_empty());
        assert!(snapshot.physical_info.height_feet.is_none());
    }

    #[test]
    fn out_of_range_step_is_rejected() {
        let value = serde_json::json!({"currentStep": 7, "completedSteps": [1]});
        assert!(DraftSnapshot::from_value(value).is_err());
    }
}
