use rusqlite::Connection;
use tracing::info;

use crate::db::connection::Database;
use crate::errors::MonitorError;

// Ordered, append-only. Each entry runs at most once, tracked through
// PRAGMA user_version; schema changes are additive.
const MIGRATIONS: &[&str] = &[
    include_str!("../../sql/0001_init.sql"),
    include_str!("../../sql/0002_status_complaint_count.sql"),
];

/// Bring the store up to the current schema version. Safe to call on every
/// startup; an up-to-date store is a no-op.
pub fn init_store(db: &Database) -> Result<(), MonitorError> {
    db.with_conn(apply_migrations)
}

pub fn apply_migrations(conn: &mut Connection) -> Result<(), MonitorError> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| MonitorError::Store(e.to_string()))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate().skip(version as usize) {
        let applied = idx as i64 + 1;
        let tx = conn
            .transaction()
            .map_err(|e| MonitorError::Store(e.to_string()))?;
        tx.execute_batch(sql)
            .map_err(|e| MonitorError::Store(format!("migration {applied} failed: {e}")))?;
        tx.pragma_update(None, "user_version", applied)
            .map_err(|e| MonitorError::Store(e.to_string()))?;
        tx.commit()
            .map_err(|e| MonitorError::Store(e.to_string()))?;
        info!(version = applied, "applied store migration");
    }

    Ok(())
}
