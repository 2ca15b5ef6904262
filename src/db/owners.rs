use rusqlite::{params, OptionalExtension};

use crate::address::normalize_key;
use crate::db::connection::Database;
use crate::errors::MonitorError;

/// A notification recipient. The address relation is lookup-only; deleting
/// an owner never deletes the addresses it pointed at.
#[derive(Debug, Clone)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub webhook_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Personal run hours, stored as a JSON array of hours-of-day.
    pub schedule: Option<Vec<u32>>,
}

fn row_to_owner(row: &rusqlite::Row<'_>) -> rusqlite::Result<Owner> {
    let schedule: Option<String> = row.get(5)?;
    Ok(Owner {
        id: row.get(0)?,
        name: row.get(1)?,
        webhook_url: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        schedule: schedule.and_then(|s| serde_json::from_str(&s).ok()),
    })
}

pub fn add_owner(
    db: &Database,
    name: &str,
    webhook_url: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<i64, MonitorError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO owners (name, webhook_url, email, phone) VALUES (?1, ?2, ?3, ?4)",
            params![name, webhook_url, email, phone],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn update_owner_contacts(
    db: &Database,
    owner_id: i64,
    webhook_url: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(), MonitorError> {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            UPDATE owners SET
                webhook_url = COALESCE(?1, webhook_url),
                email = COALESCE(?2, email),
                phone = COALESCE(?3, phone)
            WHERE id = ?4
            "#,
            params![webhook_url, email, phone, owner_id],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(())
    })
}

pub fn set_owner_schedule(
    db: &Database,
    owner_id: i64,
    hours: &[u32],
) -> Result<(), MonitorError> {
    let encoded =
        serde_json::to_string(hours).map_err(|e| MonitorError::Store(e.to_string()))?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE owners SET schedule = ?1 WHERE id = ?2",
            params![encoded, owner_id],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(())
    })
}

pub fn delete_owner(db: &Database, owner_id: i64) -> Result<(), MonitorError> {
    db.with_conn(|conn| {
        conn.execute(
            "DELETE FROM address_owners WHERE owner_id = ?1",
            params![owner_id],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        conn.execute("DELETE FROM owners WHERE id = ?1", params![owner_id])
            .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(())
    })
}

pub fn get_owner(db: &Database, owner_id: i64) -> Result<Option<Owner>, MonitorError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT id, name, webhook_url, email, phone, schedule FROM owners WHERE id = ?1",
            params![owner_id],
            row_to_owner,
        )
        .optional()
        .map_err(|e| MonitorError::Store(e.to_string()))
    })
}

pub fn get_all_owners(db: &Database) -> Result<Vec<Owner>, MonitorError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT id, name, webhook_url, email, phone, schedule FROM owners ORDER BY id")
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let rows = stmt
            .query_map([], row_to_owner)
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let mut owners = Vec::new();
        for row in rows {
            owners.push(row.map_err(|e| MonitorError::Store(e.to_string()))?);
        }
        Ok(owners)
    })
}

pub fn assign_address(db: &Database, address: &str, owner_id: i64) -> Result<(), MonitorError> {
    let key = normalize_key(address);
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR REPLACE INTO address_owners (address, owner_id) VALUES (?1, ?2)",
            params![key, owner_id],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(())
    })
}

pub fn unassign_address(db: &Database, address: &str, owner_id: i64) -> Result<(), MonitorError> {
    let key = normalize_key(address);
    db.with_conn(|conn| {
        conn.execute(
            "DELETE FROM address_owners WHERE address = ?1 AND owner_id = ?2",
            params![key, owner_id],
        )
        .map_err(|e| MonitorError::Store(e.to_string()))?;
        Ok(())
    })
}

pub fn owner_addresses(db: &Database, owner_id: i64) -> Result<Vec<String>, MonitorError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT address FROM address_owners WHERE owner_id = ?1 ORDER BY address")
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params![owner_id], |row| row.get::<_, String>(0))
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let mut addresses = Vec::new();
        for row in rows {
            addresses.push(row.map_err(|e| MonitorError::Store(e.to_string()))?);
        }
        Ok(addresses)
    })
}

/// The full assignment relation in one read, for per-run attribution.
pub fn get_all_assignments(db: &Database) -> Result<Vec<(String, i64)>, MonitorError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare("SELECT address, owner_id FROM address_owners")
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| MonitorError::Store(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| MonitorError::Store(e.to_string()))?);
        }
        Ok(out)
    })
}
