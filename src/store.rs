// 🗄️ Contact Store - persisted mobile/address edits plus an audit trail
// Used by the update relay when it is started with a database path.

use crate::relay::ValidatedUpdate;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Latest known contact details for one voter card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContact {
    pub epic_id: String,
    pub voter_id: Option<String>,
    pub serial_no: Option<String>,
    pub mobile: String,
    pub address: String,
    pub updated_at: DateTime<Utc>,
}

/// One accepted update as it was applied, kept per voter card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactChange {
    pub change_id: String,
    pub epic_id: String,
    pub mobile: String,
    /// Empty when the update left the address alone
    pub address: String,
    pub voter_id: Option<String>,
    pub serial_no: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Open (or create) the database file and make sure the schema exists
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Contacts (one row per voter card id)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS voter_contacts (
            epic_id TEXT PRIMARY KEY,
            voter_id TEXT,
            serial_no TEXT,
            mobile TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Change history (one row per accepted update)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contact_changes (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            change_id TEXT UNIQUE NOT NULL,
            epic_id TEXT NOT NULL,
            mobile TEXT NOT NULL,
            address TEXT NOT NULL,
            voter_id TEXT,
            serial_no TEXT,
            changed_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_mobile ON voter_contacts(mobile)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_changes_epic ON contact_changes(epic_id)",
        [],
    )?;

    Ok(())
}

/// Upsert one validated update and append it to the change history.
///
/// The mobile number is always written (empty clears it). The address is
/// only replaced when the update carries one.
pub fn record_update(conn: &Connection, update: &ValidatedUpdate) -> Result<StoredContact> {
    let now = Utc::now();

    conn.execute(
        "INSERT INTO voter_contacts (epic_id, voter_id, serial_no, mobile, address, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(epic_id) DO UPDATE SET
            voter_id = COALESCE(excluded.voter_id, voter_contacts.voter_id),
            serial_no = COALESCE(excluded.serial_no, voter_contacts.serial_no),
            mobile = excluded.mobile,
            address = CASE WHEN excluded.address = '' THEN voter_contacts.address
                           ELSE excluded.address END,
            updated_at = excluded.updated_at",
        params![
            update.epic_id,
            update.voter_id,
            update.serial_no,
            update.mobile,
            update.address,
            now.to_rfc3339(),
        ],
    )
    .with_context(|| format!("Failed to upsert contact {}", update.epic_id))?;

    conn.execute(
        "INSERT INTO contact_changes (change_id, epic_id, mobile, address, voter_id, serial_no, changed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            uuid::Uuid::new_v4().to_string(),
            update.epic_id,
            update.mobile,
            update.address,
            update.voter_id,
            update.serial_no,
            now.to_rfc3339(),
        ],
    )
    .with_context(|| format!("Failed to log change for {}", update.epic_id))?;

    get_contact(conn, &update.epic_id)?
        .with_context(|| format!("Contact {} vanished after upsert", update.epic_id))
}

pub fn get_contact(conn: &Connection, epic_id: &str) -> Result<Option<StoredContact>> {
    let contact = conn
        .query_row(
            "SELECT epic_id, voter_id, serial_no, mobile, address, updated_at
             FROM voter_contacts WHERE epic_id = ?1",
            params![epic_id],
            |row| {
                let updated_at: String = row.get(5)?;
                Ok(StoredContact {
                    epic_id: row.get(0)?,
                    voter_id: row.get(1)?,
                    serial_no: row.get(2)?,
                    mobile: row.get(3)?,
                    address: row.get(4)?,
                    updated_at: parse_timestamp(5, &updated_at)?,
                })
            },
        )
        .optional()?;

    Ok(contact)
}

pub fn count_contacts(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM voter_contacts", [], |row| row.get(0))?;
    Ok(count)
}

/// Changes for one voter card, newest first
pub fn contact_history(conn: &Connection, epic_id: &str) -> Result<Vec<ContactChange>> {
    let mut stmt = conn.prepare(
        "SELECT change_id, epic_id, mobile, address, voter_id, serial_no, changed_at
         FROM contact_changes
         WHERE epic_id = ?1
         ORDER BY seq DESC",
    )?;

    let changes = stmt
        .query_map(params![epic_id], |row| {
            let changed_at: String = row.get(6)?;
            Ok(ContactChange {
                change_id: row.get(0)?,
                epic_id: row.get(1)?,
                mobile: row.get(2)?,
                address: row.get(3)?,
                voter_id: row.get(4)?,
                serial_no: row.get(5)?,
                changed_at: parse_timestamp(6, &changed_at)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(changes)
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn update(epic_id: &str, mobile: &str, address: &str) -> ValidatedUpdate {
        ValidatedUpdate {
            voter_id: None,
            epic_id: epic_id.to_string(),
            mobile: mobile.to_string(),
            address: address.to_string(),
            serial_no: None,
        }
    }

    #[test]
    fn test_upsert_keeps_one_row_per_card() {
        let conn = memory_db();

        record_update(&conn, &ValidatedUpdate {
            voter_id: Some("12".into()),
            serial_no: Some("7".into()),
            ..update("ABC1234567", "9090385555", "Flat 4")
        })
        .unwrap();
        let contact = record_update(&conn, &update("ABC1234567", "8888888888", "")).unwrap();

        assert_eq!(count_contacts(&conn).unwrap(), 1);
        assert_eq!(contact.mobile, "8888888888");
        assert_eq!(contact.address, "Flat 4", "empty address keeps the stored one");
        assert_eq!(contact.voter_id.as_deref(), Some("12"));
        assert_eq!(contact.serial_no.as_deref(), Some("7"));

        println!("✅ Contact upsert test PASSED");
    }

    #[test]
    fn test_empty_mobile_clears_number() {
        let conn = memory_db();
        record_update(&conn, &update("A1", "9090385555", "")).unwrap();
        record_update(&conn, &update("A1", "", "")).unwrap();

        assert_eq!(get_contact(&conn, "A1").unwrap().unwrap().mobile, "");
        assert!(get_contact(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_every_update_lands_in_history() {
        let conn = memory_db();
        record_update(&conn, &update("A1", "9090385555", "")).unwrap();
        record_update(&conn, &update("A1", "", "12A")).unwrap();
        record_update(&conn, &update("B2", "8888888888", "")).unwrap();

        let history = contact_history(&conn, "A1").unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].address, "12A");
        assert_eq!(history[0].mobile, "");
        assert_eq!(history[1].mobile, "9090385555");
        assert_ne!(history[0].change_id, history[1].change_id);
        assert!(contact_history(&conn, "missing").unwrap().is_empty());

        println!("✅ Contact history test PASSED");
    }
}
