//! Durable storage for the draft snapshot.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, StoredSnapshot};

/// Storage keys.
pub mod keys {
    /// Default user id (single-applicant client storage).
    pub const DEFAULT_USER: &str = "default";
    /// Default key for the persisted wizard snapshot.
    pub const ONBOARDING_STORAGE: &str = "newbridge-onboarding-storage";
}
