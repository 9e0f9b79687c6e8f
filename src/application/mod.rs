//! Insurance application domain: the draft record, its field rules, and
//! the formatting helpers the wizard steps share.

pub mod format;
pub mod model;
pub mod options;
pub mod validation;

pub use model::{
    ApplicationDraft, Beneficiary, BeneficiaryUpdate, ContactInfo, Gender, LicenseInfo,
    PersonalInfo, PhysicalInfo, Relationship,
};
pub use validation::{FieldError, ValidationReport, validate_draft, validate_step};
