//! Application draft data model.
//!
//! Section fields are optional because a draft is filled in one step at a
//! time. The same section types double as partial updates: `merge_from`
//! overwrites only the fields that are set on the incoming value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gender at birth, as captured on the personal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
        }
    }
}

/// Beneficiary relationship to the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    Spouse,
    Child,
    Parent,
    Sibling,
    Other,
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Spouse => "Spouse",
            Self::Child => "Child",
            Self::Parent => "Parent",
            Self::Sibling => "Sibling",
            Self::Other => "Other",
        };
        write!(f, "{s}")
    }
}

/// Step 1: personal details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, with = "us_date::option", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Formatted `XXX-XX-XXXX`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

impl PersonalInfo {
    pub fn merge_from(&mut self, update: PersonalInfo) {
        merge(&mut self.first_name, update.first_name);
        merge(&mut self.last_name, update.last_name);
        merge(&mut self.date_of_birth, update.date_of_birth);
        merge(&mut self.gender, update.gender);
        merge(&mut self.tax_id, update.tax_id);
    }
}

/// Step 2: mailing address and contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Two-letter state code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Formatted `(XXX) XXX-XXXX`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ContactInfo {
    pub fn merge_from(&mut self, update: ContactInfo) {
        merge(&mut self.street_address, update.street_address);
        merge(&mut self.city, update.city);
        merge(&mut self.state, update.state);
        merge(&mut self.zip_code, update.zip_code);
        merge(&mut self.email, update.email);
        merge(&mut self.phone, update.phone);
    }
}

/// Step 3: height, weight, and tobacco use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_feet: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_inches: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_pounds: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tobacco_use_last_12_months: Option<bool>,
}

impl PhysicalInfo {
    pub fn merge_from(&mut self, update: PhysicalInfo) {
        merge(&mut self.height_feet, update.height_feet);
        merge(&mut self.height_inches, update.height_inches);
        merge(&mut self.weight_pounds, update.weight_pounds);
        merge(
            &mut self.tobacco_use_last_12_months,
            update.tobacco_use_last_12_months,
        );
    }
}

/// Step 4: driver's license or state ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_license: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_state: Option<String>,
}

impl LicenseInfo {
    pub fn merge_from(&mut self, update: LicenseInfo) {
        merge(&mut self.has_license, update.has_license);
        merge(&mut self.license_number, update.license_number);
        merge(&mut self.license_state, update.license_state);
    }
}

/// A single designated beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub relationship: Relationship,
    #[serde(with = "us_date")]
    pub date_of_birth: NaiveDate,
    /// Percentage of the benefit, 1-100.
    pub share_percent: u8,
}

impl Beneficiary {
    /// Create a beneficiary with a fresh random id.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        relationship: Relationship,
        date_of_birth: NaiveDate,
        share_percent: u8,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            relationship,
            date_of_birth,
            share_percent,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn apply(&mut self, update: BeneficiaryUpdate) {
        if let Some(v) = update.first_name {
            self.first_name = v;
        }
        if let Some(v) = update.last_name {
            self.last_name = v;
        }
        if let Some(v) = update.relationship {
            self.relationship = v;
        }
        if let Some(v) = update.date_of_birth {
            self.date_of_birth = v;
        }
        if let Some(v) = update.share_percent {
            self.share_percent = v;
        }
    }
}

/// Partial edit of an existing beneficiary. The id is never editable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub relationship: Option<Relationship>,
    #[serde(default, with = "us_date::option")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub share_percent: Option<u8>,
}

/// The in-progress application aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
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

impl ApplicationDraft {
    /// An empty draft with the physical and license smart defaults applied.
    pub fn new() -> Self {
        Self {
            personal_info: PersonalInfo::default(),
            contact_info: ContactInfo::default(),
            physical_info: PhysicalInfo {
                height_feet: Some(smart_defaults::HEIGHT_FEET),
                height_inches: Some(smart_defaults::HEIGHT_INCHES),
                weight_pounds: Some(smart_defaults::WEIGHT_POUNDS),
                tobacco_use_last_12_months: Some(smart_defaults::TOBACCO_USE),
            },
            license_info: LicenseInfo {
                has_license: Some(smart_defaults::HAS_LICENSE),
                license_number: None,
                license_state: None,
            },
            beneficiaries: Vec::new(),
        }
    }

    /// Sum of all beneficiary shares.
    pub fn total_share(&self) -> u32 {
        self.beneficiaries
            .iter()
            .map(|b| u32::from(b.share_percent))
            .sum()
    }

    /// Share left to allocate; zero when fully or over-allocated.
    pub fn remaining_share(&self) -> u32 {
        100u32.saturating_sub(self.total_share())
    }

    pub fn beneficiary(&self, id: Uuid) -> Option<&Beneficiary> {
        self.beneficiaries.iter().find(|b| b.id == id)
    }
}

impl Default for ApplicationDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-filled values that reduce typing for the common case.
pub mod smart_defaults {
    pub const HEIGHT_FEET: u8 = 5;
    pub const HEIGHT_INCHES: u8 = 9;
    pub const WEIGHT_POUNDS: u16 = 170;
    pub const TOBACCO_USE: bool = false;
    pub const HAS_LICENSE: bool = true;
}

fn merge<T>(current: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *current = incoming;
    }
}

/// Serde adapter for `MM/DD/YYYY` calendar dates.
pub mod us_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::application::format::{US_DATE_FORMAT, parse_us_date};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(US_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_us_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid MM/DD/YYYY date: {raw}")))
    }

    /// Same as the parent module for optional fields; empty strings read as unset.
    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(s) if s.is_empty() => Ok(None),
                Some(s) => crate::application::format::parse_us_date(&s).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid MM/DD/YYYY date: {s}"))
                }),
            }
        }
    }
}
