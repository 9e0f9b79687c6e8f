//! libSQL implementation of [`Database`], file-backed or in-memory.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{Database, StoredSnapshot};

/// One shared connection; `libsql::Connection` is safe to use from many tasks.
pub struct LibSqlBackend {
    _db: libsql::Database,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a database file, creating parent directories, and migrate it.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::Pool(format!("create {}: {e}", parent.display())))?;
        }
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("open {}: {e}", path.display())))?;
        let backend = Self::with_database(db).await?;
        info!(path = %path.display(), "Snapshot database opened");
        Ok(backend)
    }

    /// Throwaway in-memory database.
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("open in-memory database: {e}")))?;
        Self::with_database(db).await
    }

    async fn with_database(db: libsql::Database) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("connect: {e}")))?;
        let backend = Self { _db: db, conn };
        backend.run_migrations().await?;
        Ok(backend)
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(&self.conn).await
    }

    async fn load_snapshot(
        &self,
        owner: &str,
        key: &str,
    ) -> Result<Option<StoredSnapshot>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload, revision, saved_at FROM draft_snapshots
                 WHERE owner_id = ?1 AND storage_key = ?2",
                params![owner, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_snapshot: {e}")))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("load_snapshot: {e}")))?
        else {
            return Ok(None);
        };

        let column = |e: libsql::Error| DatabaseError::Query(format!("load_snapshot: {e}"));
        let payload: String = row.get(0).map_err(column)?;
        let revision: i64 = row.get(1).map_err(column)?;
        let saved_at: String = row.get(2).map_err(column)?;

        Ok(Some(StoredSnapshot {
            payload: serde_json::from_str(&payload)
                .map_err(|e| DatabaseError::Serialization(e.to_string()))?,
            revision: revision.max(0) as u64,
            saved_at: DateTime::parse_from_rfc3339(&saved_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| DatabaseError::Serialization(format!("saved_at: {e}")))?,
        }))
    }

    async fn save_snapshot(
        &self,
        owner: &str,
        key: &str,
        payload: &serde_json::Value,
    ) -> Result<u64, DatabaseError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        let mut rows = self
            .conn
            .query(
                "INSERT INTO draft_snapshots (owner_id, storage_key, payload, revision, saved_at)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT (owner_id, storage_key) DO UPDATE SET
                     payload = excluded.payload,
                     revision = draft_snapshots.revision + 1,
                     saved_at = excluded.saved_at
                 RETURNING revision",
                params![owner, key, body, Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_snapshot: {e}")))?;

        let revision = match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map_err(|e| DatabaseError::Query(format!("save_snapshot: {e}")))?,
            Ok(None) => return Err(DatabaseError::Query("save_snapshot: no revision returned".into())),
            Err(e) => return Err(DatabaseError::Query(format!("save_snapshot: {e}"))),
        };
        debug!(owner, key, revision, "Snapshot saved");
        Ok(revision.max(0) as u64)
    }

    async fn delete_snapshot(&self, owner: &str, key: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM draft_snapshots WHERE owner_id = ?1 AND storage_key = ?2",
                params![owner, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_snapshot: {e}")))?;
        Ok(removed > 0)
    }
}
