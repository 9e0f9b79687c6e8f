//! Error types for the onboarding service.
//!
//! Field validation never goes through these types: invalid input produces a
//! `ValidationReport`. [`Error`] covers what the form store can fail with;
//! configuration and address lookup have their own error types.

use crate::application::validation::ValidationReport;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Durable storage errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Address suggestion failures. Always non-fatal to the wizard.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Address lookup request failed: {0}")]
    RequestFailed(String),

    #[error("Address lookup returned status {status}: {message}")]
    BadStatus { status: u16, message: String },

    #[error("Invalid address lookup response: {0}")]
    InvalidResponse(String),
}

/// Submission failures. The draft is preserved in every case.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Application is incomplete: {0}")]
    Incomplete(ValidationReport),

    #[error("A submission is already in progress")]
    InProgress,

    #[error("Application intake failed: {0}")]
    Intake(String),
}

/// Rejected draft mutations that are not field validation.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Beneficiary {0} already exists")]
    DuplicateBeneficiary(uuid::Uuid),

    #[error("Beneficiary {0} not found")]
    BeneficiaryNotFound(uuid::Uuid),

    #[error("Step {0} is out of range (expected 1-5)")]
    StepOutOfRange(u8),
}

/// Result type alias for the onboarding service.
pub type Result<T> = std::result::Result<T, Error>;
