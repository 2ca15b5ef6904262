use chrono::NaiveDateTime;
use rusqlite::params;
use std::collections::HashMap;

use crate::db::connection::Database;
use crate::errors::MonitorError;
use crate::providers::BisSummary;

/// Last-known BIS state for one monitored address. A row exists only after
/// at least one successful check; no row means "never checked", not zero.
#[derive(Debug, Clone)]
pub struct AddressStatus {
    pub address: String,
    pub bin: Option<String>,
    pub dob_violations: i64,
    pub ecb_violations: i64,
    pub complaints: Option<i64>,
    pub last_checked: Option<NaiveDateTime>,
}

/// The whole table in one read; the run diffs every address against this
/// instead of issuing a query per address.
pub fn get_all_statuses(db: &Database) -> Result<HashMap<String, AddressStatus>, MonitorError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                "SELECT address, bin, dob_violations, ecb_violations, complaints, last_checked
                 FROM bis_status",
            )
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AddressStatus {
                    address: row.get(0)?,
                    bin: row.get(1)?,
                    dob_violations: row.get(2)?,
                    ecb_violations: row.get(3)?,
                    complaints: row.get(4)?,
                    last_checked: row.get(5)?,
                })
            })
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let mut out = HashMap::new();
        for row in rows {
            let status = row.map_err(|e| MonitorError::Store(e.to_string()))?;
            out.insert(status.address.clone(), status);
        }
        Ok(out)
    })
}

/// Upsert the counts for an address, leaving any stored BIN in place.
pub fn upsert_status(
    db: &Database,
    address: &str,
    summary: &BisSummary,
    now: NaiveDateTime,
) -> Result<(), MonitorError> {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO bis_status (address, dob_violations, ecb_violations, complaints, last_checked)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(address) DO UPDATE SET
                dob_violations = excluded.dob_violations,
                ecb_violations = excluded.ecb_violations,
                complaints = excluded.complaints,
                last_checked = excluded.last_checked
            "#,
            params![
                address,
                summary.violations_dob,
                summary.violations_ecb,
                summary.complaints,
                now
            ],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(())
    })
}

pub fn set_bin(db: &Database, address: &str, bin: &str) -> Result<(), MonitorError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE bis_status SET bin = ?1 WHERE address = ?2",
            params![bin, address],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(())
    })
}
