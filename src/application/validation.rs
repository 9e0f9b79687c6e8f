//! Per-step field rules.
//!
//! Every rule is a pure function from a section to a `ValidationReport`.
//! Invalid input is data, not an error: callers inspect the report and show
//! each message next to its field. Rules that depend on the current date
//! take `today` explicitly.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use super::format::calculate_age;
use super::model::{
    ApplicationDraft, Beneficiary, ContactInfo, LicenseInfo, PersonalInfo, PhysicalInfo,
};
use crate::wizard::sequencer::Step;

pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 85;
pub const HEIGHT_FEET_RANGE: std::ops::RangeInclusive<u8> = 4..=8;
pub const HEIGHT_INCHES_RANGE: std::ops::RangeInclusive<u8> = 0..=11;
pub const WEIGHT_POUNDS_RANGE: std::ops::RangeInclusive<u16> = 50..=500;
pub const SHARE_RANGE: std::ops::RangeInclusive<u8> = 1..=100;
pub const REQUIRED_SHARE_TOTAL: u32 = 100;

/// All-zero tax id used as a placeholder; never a real number.
const ZERO_TAX_ID: &str = "000-00-0000";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s'\-]+$").expect("valid name regex"));
static TAX_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-\d{2}-\d{4}$").expect("valid tax id regex"));
static STATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid state regex"));
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("valid zip regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").expect("valid phone regex"));

/// A failed rule for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// JSON path of the field, e.g. `firstName` or `beneficiaries[1].sharePercent`.
    pub field: String,
    pub message: String,
}

/// Outcome of validating a step or the whole draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// First message recorded for `field`.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
    }

    fn prefixed(mut self, prefix: &str) -> Self {
        for error in &mut self.errors {
            error.field = format!("{prefix}.{}", error.field);
        }
        self
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

// ── Field helpers ───────────────────────────────────────────────────

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.as_str()).filter(|s| !s.trim().is_empty())
}

fn check_length(
    report: &mut ValidationReport,
    field: &str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) -> bool {
    let len = value.chars().count();
    if len < min {
        report.push(field, format!("{label} must be at least {min} characters"));
        false
    } else if len > max {
        report.push(field, format!("{label} must be at most {max} characters"));
        false
    } else {
        true
    }
}

fn check_name(report: &mut ValidationReport, field: &str, label: &str, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        report.push(field, format!("{label} is required"));
        return;
    };
    if check_length(report, field, label, value, 2, 50) && !NAME_RE.is_match(value) {
        report.push(
            field,
            format!("{label} can only contain letters, spaces, hyphens, and apostrophes"),
        );
    }
}

fn check_state_code(report: &mut ValidationReport, field: &str, label: &str, value: Option<&str>) {
    match value.filter(|v| !v.is_empty()) {
        None => report.push(field, format!("{label} is required")),
        Some(v) if !STATE_RE.is_match(v) => {
            report.push(field, format!("{label} must be a 2-letter state code"))
        }
        Some(_) => {}
    }
}

// ── Step rules ──────────────────────────────────────────────────────

/// Step 1 rules.
pub fn validate_personal(info: &PersonalInfo, today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_name(&mut report, "firstName", "First name", info.first_name.as_deref());
    check_name(&mut report, "lastName", "Last name", info.last_name.as_deref());

    match info.date_of_birth {
        None => report.push("dateOfBirth", "Date of birth is required"),
        Some(dob) => {
            let age = calculate_age(dob, today);
            if age < MIN_AGE {
                report.push(
                    "dateOfBirth",
                    format!("You must be at least {MIN_AGE} years old to apply"),
                );
            } else if age > MAX_AGE {
                report.push(
                    "dateOfBirth",
                    format!("Applicants must be {MAX_AGE} years old or younger"),
                );
            }
        }
    }

    if info.gender.is_none() {
        report.push("gender", "Gender is required");
    }

    match present(info.tax_id.as_ref()) {
        None => report.push("taxId", "Tax ID is required"),
        Some(id) if !TAX_ID_RE.is_match(id) => {
            report.push("taxId", "Tax ID must be in the format XXX-XX-XXXX")
        }
        Some(ZERO_TAX_ID) => report.push("taxId", "Tax ID is not valid"),
        Some(_) => {}
    }

    report
}

/// Step 2 rules.
pub fn validate_contact(info: &ContactInfo) -> ValidationReport {
    let mut report = ValidationReport::default();

    match present(info.street_address.as_ref()) {
        None => report.push("streetAddress", "Street address is required"),
        Some(v) => {
            check_length(&mut report, "streetAddress", "Street address", v, 5, 100);
        }
    }

    match present(info.city.as_ref()) {
        None => report.push("city", "City is required"),
        Some(v) => {
            check_length(&mut report, "city", "City", v, 2, 50);
        }
    }

    check_state_code(&mut report, "state", "State", info.state.as_deref());

    match present(info.zip_code.as_ref()) {
        None => report.push("zipCode", "ZIP code is required"),
        Some(v) if !ZIP_RE.is_match(v) => {
            report.push("zipCode", "ZIP code must be 5 digits or ZIP+4 (XXXXX-XXXX)")
        }
        Some(_) => {}
    }

    match present(info.email.as_ref()) {
        None => report.push("email", "Email is required"),
        Some(v) if v.chars().count() > 100 => {
            report.push("email", "Email must be at most 100 characters")
        }
        Some(v) if !EMAIL_RE.is_match(v) => report.push("email", "Enter a valid email address"),
        Some(_) => {}
    }

    match present(info.phone.as_ref()) {
        None => report.push("phone", "Phone number is required"),
        Some(v) if !PHONE_RE.is_match(v) => {
            report.push("phone", "Phone number must be in the format (XXX) XXX-XXXX")
        }
        Some(_) => {}
    }

    report
}

/// Step 3 rules.
pub fn validate_physical(info: &PhysicalInfo) -> ValidationReport {
    let mut report = ValidationReport::default();

    match info.height_feet {
        None => report.push("heightFeet", "Height (feet) is required"),
        Some(v) if !HEIGHT_FEET_RANGE.contains(&v) => {
            report.push("heightFeet", "Height must be between 4 and 8 feet")
        }
        Some(_) => {}
    }

    match info.height_inches {
        None => report.push("heightInches", "Height (inches) is required"),
        Some(v) if !HEIGHT_INCHES_RANGE.contains(&v) => {
            report.push("heightInches", "Inches must be between 0 and 11")
        }
        Some(_) => {}
    }

    match info.weight_pounds {
        None => report.push("weightPounds", "Weight is required"),
        Some(v) if !WEIGHT_POUNDS_RANGE.contains(&v) => {
            report.push("weightPounds", "Weight must be between 50 and 500 pounds")
        }
        Some(_) => {}
    }

    if info.tobacco_use_last_12_months.is_none() {
        report.push("tobaccoUseLast12Months", "Please indicate tobacco use");
    }

    report
}

/// Step 4 rules. Number and state are only checked when the applicant has a license.
pub fn validate_license(info: &LicenseInfo) -> ValidationReport {
    let mut report = ValidationReport::default();

    match info.has_license {
        None => report.push("hasLicense", "Please indicate whether you have a license"),
        Some(false) => {}
        Some(true) => {
            match present(info.license_number.as_ref()) {
                None => report.push("licenseNumber", "License number is required"),
                Some(v) if v.trim().chars().count() < 5 => report.push(
                    "licenseNumber",
                    "License number must be at least 5 characters",
                ),
                Some(_) => {}
            }
            check_state_code(
                &mut report,
                "licenseState",
                "License state",
                info.license_state.as_deref(),
            );
        }
    }

    report
}

/// Rules for a single beneficiary entry.
pub fn validate_beneficiary(beneficiary: &Beneficiary, today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::default();

    // Length only: beneficiary names skip the applicant's character rule.
    check_length(&mut report, "firstName", "First name", &beneficiary.first_name, 2, 50);
    check_length(&mut report, "lastName", "Last name", &beneficiary.last_name, 2, 50);

    if beneficiary.date_of_birth > today {
        report.push("dateOfBirth", "Date of birth cannot be in the future");
    }

    if !SHARE_RANGE.contains(&beneficiary.share_percent) {
        report.push("sharePercent", "Share must be between 1% and 100%");
    }

    report
}

/// Step 5 rules: every entry valid and at least one present. The 100% total
/// is checked separately by [`validate_share_total`] at submission.
pub fn validate_beneficiaries(beneficiaries: &[Beneficiary], today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::default();
    if beneficiaries.is_empty() {
        report.push("beneficiaries", "At least one beneficiary is required");
    }
    for (i, b) in beneficiaries.iter().enumerate() {
        report.extend(validate_beneficiary(b, today).prefixed(&format!("beneficiaries[{i}]")));
    }
    report
}

/// Aggregate rule: shares must add up to exactly 100%.
pub fn validate_share_total(beneficiaries: &[Beneficiary]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let total: u32 = beneficiaries
        .iter()
        .map(|b| u32::from(b.share_percent))
        .sum();
    if total != REQUIRED_SHARE_TOTAL {
        report.push(
            "beneficiaries",
            format!("Beneficiary shares must total 100% (currently {total}%)"),
        );
    }
    report
}

/// Rules gating the sequencer's advance past `step`.
pub fn validate_step(step: Step, draft: &ApplicationDraft, today: NaiveDate) -> ValidationReport {
    match step {
        Step::Personal => validate_personal(&draft.personal_info, today),
        Step::Contact => validate_contact(&draft.contact_info),
        Step::Physical => validate_physical(&draft.physical_info),
        Step::License => validate_license(&draft.license_info),
        Step::Beneficiary => validate_beneficiaries(&draft.beneficiaries, today),
    }
}

/// Every step plus the share total; what submission requires.
pub fn validate_draft(draft: &ApplicationDraft, today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.extend(validate_personal(&draft.personal_info, today).prefixed("personalInfo"));
    report.extend(validate_contact(&draft.contact_info).prefixed("contactInfo"));
    report.extend(validate_physical(&draft.physical_info).prefixed("physicalInfo"));
    report.extend(validate_license(&draft.license_info).prefixed("licenseInfo"));
    report.extend(validate_beneficiaries(&draft.beneficiaries, today));
    if !draft.beneficiaries.is_empty() {
        report.extend(validate_share_total(&draft.beneficiaries));
    }
    report
}
