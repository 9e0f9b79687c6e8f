//! `Database` trait: durable storage for the wizard's draft snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// A snapshot as it sits in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub payload: serde_json::Value,
    /// Starts at 1 and grows by one on every save under the same key.
    pub revision: u64,
    pub saved_at: DateTime<Utc>,
}

/// Snapshot storage keyed by owner and storage key.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    async fn load_snapshot(
        &self,
        owner: &str,
        key: &str,
    ) -> Result<Option<StoredSnapshot>, DatabaseError>;

    /// Insert or replace the snapshot. Returns the new revision.
    async fn save_snapshot(
        &self,
        owner: &str,
        key: &str,
        payload: &serde_json::Value,
    ) -> Result<u64, DatabaseError>;

    /// Returns whether a snapshot existed.
    async fn delete_snapshot(&self, owner: &str, key: &str) -> Result<bool, DatabaseError>;
}
