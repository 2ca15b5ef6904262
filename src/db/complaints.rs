use rusqlite::params;
use std::collections::HashSet;

use crate::db::connection::Database;
use crate::errors::MonitorError;
use crate::providers::ComplaintRecord;

/// Every incident id we have ever recorded. Fetched once per run and used
/// as the dedup ledger; the ledger is append-only.
pub fn get_all_incident_ids(db: &Database) -> Result<HashSet<String>, MonitorError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT incident_id FROM complaints_311")
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row.map_err(|e| MonitorError::Store(e.to_string()))?);
        }
        Ok(ids)
    })
}

/// Insert-if-absent by incident id. Returns whether a row was written;
/// re-inserting a known id is a no-op, not an error.
pub fn insert_complaint(db: &Database, record: &ComplaintRecord) -> Result<bool, MonitorError> {
    db.with_conn(|conn| {
        let changed = conn
            .execute(
                r#"
                INSERT OR IGNORE INTO complaints_311 (
                    incident_id, address, borough, zip_code, created_date,
                    complaint_type, descriptor, agency, status, closed_date,
                    resolution_description, location_type, latitude, longitude
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                params![
                    record.incident_id,
                    record.incident_address,
                    record.borough,
                    record.incident_zip,
                    record.created_date,
                    record.complaint_type,
                    record.descriptor,
                    record.agency,
                    record.status,
                    record.closed_date,
                    record.resolution_description,
                    record.location_type,
                    record.latitude,
                    record.longitude
                ],
            )
            .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(changed > 0)
    })
}
