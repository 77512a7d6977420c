//! Schema versioning for the local store.
//!
//! The applied version lives in SQLite's `user_version` header field, so the
//! cache needs no bookkeeping table of its own.

use libsql::Connection;

use crate::error::DatabaseError;

/// Schema statements, indexed by `version - 1`. Append only.
static SCHEMA: &[&str] = &["CREATE TABLE IF NOT EXISTS progress_cache (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );"];

/// Bring the schema up to the latest version.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current = schema_version(conn).await?;
    for (version, sql) in (1i64..).zip(SCHEMA).skip(current.max(0) as usize) {
        tracing::info!(version, "Applying local store schema");
        conn.execute_batch(&format!("{sql}\nPRAGMA user_version = {version};"))
            .await
            .map_err(|e| DatabaseError::Migration(format!("Schema V{version} failed: {e}")))?;
    }
    Ok(())
}

async fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("PRAGMA user_version", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read schema version: {e}")))?;
    match rows.next().await {
        Ok(Some(row)) => row
            .get(0)
            .map_err(|e| DatabaseError::Migration(format!("Bad schema version: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Migration(format!(
            "Failed to read schema version: {e}"
        ))),
    }
}
