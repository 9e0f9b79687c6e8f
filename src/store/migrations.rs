//! Schema migrations for the libSQL backend.
//!
//! Applied versions are recorded in `_migrations`; each pending migration
//! runs in its own transaction together with its version record.

use libsql::Connection;
use tracing::{debug, info};

use crate::error::DatabaseError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Append only.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "draft_snapshots",
    sql: "CREATE TABLE IF NOT EXISTS draft_snapshots (
              owner_id TEXT NOT NULL,
              storage_key TEXT NOT NULL,
              payload TEXT NOT NULL,
              revision INTEGER NOT NULL DEFAULT 1,
              saved_at TEXT NOT NULL,
              PRIMARY KEY (owner_id, storage_key)
          );",
}];

pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("create _migrations: {e}")))?;

    let applied = schema_version(conn).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > applied);

    for migration in pending {
        info!(version = migration.version, name = migration.name, "Applying migration");
        let batch = format!(
            "BEGIN;\n{}\nINSERT INTO _migrations (version, name) VALUES ({}, '{}');\nCOMMIT;",
            migration.sql, migration.version, migration.name
        );
        if let Err(e) = conn.execute_batch(&batch).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(DatabaseError::Migration(format!(
                "V{} ({}): {e}",
                migration.version, migration.name
            )));
        }
    }

    let version = schema_version(conn).await?;
    debug!(version, "Schema up to date");
    Ok(())
}

/// Highest applied version, 0 on a fresh database.
pub async fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("read schema version: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("parse schema version: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Migration(format!("read schema version: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_conn() -> Connection {
        libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap()
            .connect()
            .unwrap()
    }

    async fn columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut rows = conn
            .query(&format!("PRAGMA table_info({table})"), ())
            .await
            .unwrap();
        let mut names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            names.push(row.get::<String>(1).unwrap());
        }
        names
    }

    #[tokio::test]
    async fn creates_snapshot_table() {
        let conn = memory_conn().await;
        run_migrations(&conn).await.unwrap();
        assert_eq!(
            columns(&conn, "draft_snapshots").await,
            vec!["owner_id", "storage_key", "payload", "revision", "saved_at"]
        );
        assert_eq!(schema_version(&conn).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn migration_future_can_cross_threads() {
        fn assert_send<T: Send>(_: &T) {}

        let conn = memory_conn().await;
        let migrate = run_migrations(&conn);
        assert_send(&migrate);
        migrate.await.unwrap();
    }

    #[tokio::test]
    async fn rerunning_is_a_noop() {
        let conn = memory_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT COUNT(*) FROM _migrations", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }
}
