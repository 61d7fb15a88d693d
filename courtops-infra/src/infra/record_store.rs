use chrono::{DateTime, NaiveDate, Utc};
use courtops_tools::records::*;
use courtops_tools::{CollaboratorError, RecordStore};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordStoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid enum value: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RecordStoreError> for CollaboratorError {
    fn from(err: RecordStoreError) -> Self {
        CollaboratorError::Storage(err.to_string())
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tickets (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    due_at TEXT,
    resolved_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
CREATE TABLE IF NOT EXISTS devices (
    id INTEGER PRIMARY KEY,
    asset_tag TEXT NOT NULL UNIQUE,
    device_type TEXT NOT NULL,
    location TEXT NOT NULL,
    assigned_user TEXT,
    warranty_end TEXT,
    last_patch_date TEXT,
    status TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS patches (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    patch_type TEXT NOT NULL,
    status TEXT NOT NULL,
    target_version TEXT,
    device_asset_tag TEXT,
    requested_date TEXT NOT NULL,
    scheduled_date TEXT,
    deployed_date TEXT,
    verified_date TEXT
);
CREATE TABLE IF NOT EXISTS change_requests (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    requested_by TEXT NOT NULL,
    current_process TEXT NOT NULL,
    proposed_change TEXT NOT NULL,
    impact_users TEXT NOT NULL,
    impact_data TEXT NOT NULL,
    impact_security TEXT NOT NULL,
    status TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS cases (
    id INTEGER PRIMARY KEY,
    case_number TEXT NOT NULL,
    defendant_name TEXT NOT NULL,
    charge_type TEXT NOT NULL,
    status TEXT NOT NULL,
    filing_date TEXT NOT NULL,
    hearing_date TEXT,
    disposition_date TEXT,
    fine_amount REAL NOT NULL,
    amount_paid REAL NOT NULL
);
";

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub tickets: usize,
    pub devices: usize,
    pub patches: usize,
    pub change_requests: usize,
    pub cases: usize,
}

impl RecordCounts {
    pub fn is_empty(&self) -> bool {
        self.tickets + self.devices + self.patches + self.change_requests + self.cases == 0
    }
}

/// SQLite-backed record store. One connection, serialised behind a mutex.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, RecordStoreError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self, RecordStoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, RecordStoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn counts(&self) -> Result<RecordCounts, RecordStoreError> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<usize, rusqlite::Error> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n.max(0) as usize)
        };
        Ok(RecordCounts {
            tickets: count("tickets")?,
            devices: count("devices")?,
            patches: count("patches")?,
            change_requests: count("change_requests")?,
            cases: count("cases")?,
        })
    }

    /// Remove every record. Used before reseeding.
    pub fn clear(&self) -> Result<(), RecordStoreError> {
        self.conn.lock().execute_batch(
            "DELETE FROM tickets; DELETE FROM devices; DELETE FROM patches;
             DELETE FROM change_requests; DELETE FROM cases;",
        )?;
        Ok(())
    }

    pub fn insert_ticket(&self, t: &Ticket) -> Result<i64, RecordStoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tickets (title, description, category, priority, status, created_at, due_at, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                t.title,
                t.description,
                encode(&t.category)?,
                encode(&t.priority)?,
                encode(&t.status)?,
                t.created_at,
                t.due_at,
                t.resolved_at
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_device(&self, d: &Device) -> Result<i64, RecordStoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO devices (asset_tag, device_type, location, assigned_user, warranty_end, last_patch_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                d.asset_tag,
                d.device_type,
                d.location,
                d.assigned_user,
                d.warranty_end,
                d.last_patch_date,
                encode(&d.status)?
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_patch(&self, p: &Patch) -> Result<i64, RecordStoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO patches (title, patch_type, status, target_version, device_asset_tag,
                                  requested_date, scheduled_date, deployed_date, verified_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                p.title,
                encode(&p.patch_type)?,
                encode(&p.status)?,
                p.target_version,
                p.device_asset_tag,
                p.requested_date,
                p.scheduled_date,
                p.deployed_date,
                p.verified_date
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_case(&self, c: &Case) -> Result<i64, RecordStoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO cases (case_number, defendant_name, charge_type, status, filing_date,
                                hearing_date, disposition_date, fine_amount, amount_paid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                c.case_number,
                c.defendant_name,
                c.charge_type,
                encode(&c.status)?,
                c.filing_date,
                c.hearing_date,
                c.disposition_date,
                c.fine_amount,
                c.amount_paid
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn insert_change_request(
        &self,
        request: &NewChangeRequest,
        status: ChangeRequestStatus,
    ) -> Result<i64, RecordStoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO change_requests (title, requested_by, current_process, proposed_change,
                impact_users, impact_data, impact_security, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                request.title,
                request.requested_by,
                request.current_process,
                request.proposed_change,
                request.impact_users,
                request.impact_data,
                request.impact_security,
                encode(&status)?
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn load_patch(conn: &Connection, id: i64) -> Result<Option<Patch>, RecordStoreError> {
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM patches WHERE id = ?1", PATCH_COLUMNS),
                params![id],
                patch_from_row,
            )
            .optional()?)
    }

    fn load_change_request(
        conn: &Connection,
        id: i64,
    ) -> Result<Option<ChangeRequest>, RecordStoreError> {
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM change_requests WHERE id = ?1", CR_COLUMNS),
                params![id],
                change_request_from_row,
            )
            .optional()?)
    }

    fn query<T>(
        &self,
        sql: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, RecordStoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], map)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

const TICKET_COLUMNS: &str =
    "id, title, description, category, priority, status, created_at, due_at, resolved_at";
const DEVICE_COLUMNS: &str =
    "id, asset_tag, device_type, location, assigned_user, warranty_end, last_patch_date, status";
const PATCH_COLUMNS: &str = "id, title, patch_type, status, target_version, device_asset_tag, \
     requested_date, scheduled_date, deployed_date, verified_date";
const CR_COLUMNS: &str = "id, title, requested_by, current_process, proposed_change, \
     impact_users, impact_data, impact_security, status";
const CASE_COLUMNS: &str = "id, case_number, defendant_name, charge_type, status, filing_date, \
     hearing_date, disposition_date, fine_amount, amount_paid";

/// Enums are stored as their snake_case serde name.
fn encode<T: Serialize>(value: &T) -> Result<String, RecordStoreError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => Ok(s),
        Ok(other) => Err(RecordStoreError::Encoding(other.to_string())),
        Err(e) => Err(RecordStoreError::Encoding(e.to_string())),
    }
}

fn decode<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_value(serde_json::Value::String(text))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: decode(row, 3)?,
        priority: decode(row, 4)?,
        status: decode(row, 5)?,
        created_at: row.get::<_, DateTime<Utc>>(6)?,
        due_at: row.get(7)?,
        resolved_at: row.get(8)?,
    })
}

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        asset_tag: row.get(1)?,
        device_type: row.get(2)?,
        location: row.get(3)?,
        assigned_user: row.get(4)?,
        warranty_end: row.get(5)?,
        last_patch_date: row.get(6)?,
        status: decode(row, 7)?,
    })
}

fn patch_from_row(row: &Row<'_>) -> rusqlite::Result<Patch> {
    Ok(Patch {
        id: row.get(0)?,
        title: row.get(1)?,
        patch_type: decode(row, 2)?,
        status: decode(row, 3)?,
        target_version: row.get(4)?,
        device_asset_tag: row.get(5)?,
        requested_date: row.get::<_, NaiveDate>(6)?,
        scheduled_date: row.get(7)?,
        deployed_date: row.get(8)?,
        verified_date: row.get(9)?,
    })
}

fn change_request_from_row(row: &Row<'_>) -> rusqlite::Result<ChangeRequest> {
    Ok(ChangeRequest {
        id: row.get(0)?,
        title: row.get(1)?,
        requested_by: row.get(2)?,
        current_process: row.get(3)?,
        proposed_change: row.get(4)?,
        impact_users: row.get(5)?,
        impact_data: row.get(6)?,
        impact_security: row.get(7)?,
        status: decode(row, 8)?,
    })
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
    Ok(Case {
        id: row.get(0)?,
        case_number: row.get(1)?,
        defendant_name: row.get(2)?,
        charge_type: row.get(3)?,
        status: decode(row, 4)?,
        filing_date: row.get(5)?,
        hearing_date: row.get(6)?,
        disposition_date: row.get(7)?,
        fine_amount: row.get(8)?,
        amount_paid: row.get(9)?,
    })
}

impl RecordStore for SqliteRecordStore {
    fn open_tickets(&self) -> Result<Vec<Ticket>, CollaboratorError> {
        Ok(self.query(
            &format!(
                "SELECT {} FROM tickets WHERE status IN ('open', 'in_progress') ORDER BY created_at DESC",
                TICKET_COLUMNS
            ),
            ticket_from_row,
        )?)
    }

    fn all_tickets(&self) -> Result<Vec<Ticket>, CollaboratorError> {
        Ok(self.query(
            &format!("SELECT {} FROM tickets ORDER BY id", TICKET_COLUMNS),
            ticket_from_row,
        )?)
    }

    fn ticket(&self, id: i64) -> Result<Option<Ticket>, CollaboratorError> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?1", TICKET_COLUMNS),
            params![id],
            ticket_from_row,
        )
        .optional()
        .map_err(|e| RecordStoreError::from(e).into())
    }

    fn update_ticket(&self, t: &Ticket) -> Result<(), CollaboratorError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE tickets SET title = ?1, description = ?2, category = ?3, priority = ?4,
                status = ?5, due_at = ?6, resolved_at = ?7 WHERE id = ?8",
            params![
                t.title,
                t.description,
                encode(&t.category)?,
                encode(&t.priority)?,
                encode(&t.status)?,
                t.due_at,
                t.resolved_at,
                t.id
            ],
        )
        .map_err(RecordStoreError::from)?;
        Ok(())
    }

    fn devices(&self) -> Result<Vec<Device>, CollaboratorError> {
        Ok(self.query(
            &format!("SELECT {} FROM devices ORDER BY asset_tag", DEVICE_COLUMNS),
            device_from_row,
        )?)
    }

    fn create_patch(&self, patch: NewPatch) -> Result<Patch, CollaboratorError> {
        let record = Patch {
            id: 0,
            title: patch.title,
            patch_type: patch.patch_type,
            status: PatchStatus::Requested,
            target_version: patch.target_version,
            device_asset_tag: patch.device_asset_tag,
            requested_date: patch.requested_date,
            scheduled_date: patch.scheduled_date,
            deployed_date: None,
            verified_date: None,
        };
        let id = self.insert_patch(&record)?;
        Ok(Patch { id, ..record })
    }

    fn patch(&self, id: i64) -> Result<Option<Patch>, CollaboratorError> {
        let conn = self.conn.lock();
        Ok(Self::load_patch(&conn, id)?)
    }

    fn update_patch(&self, p: &Patch) -> Result<(), CollaboratorError> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE patches SET status = ?1, scheduled_date = ?2, deployed_date = ?3,
                verified_date = ?4 WHERE id = ?5",
            params![
                encode(&p.status)?,
                p.scheduled_date,
                p.deployed_date,
                p.verified_date,
                p.id
            ],
        )
        .map_err(RecordStoreError::from)?;
        Ok(())
    }

    fn patches(&self) -> Result<Vec<Patch>, CollaboratorError> {
        Ok(self.query(
            &format!("SELECT {} FROM patches ORDER BY id", PATCH_COLUMNS),
            patch_from_row,
        )?)
    }

    fn create_change_request(
        &self,
        request: NewChangeRequest,
    ) -> Result<ChangeRequest, CollaboratorError> {
        let id = self.insert_change_request(&request, ChangeRequestStatus::Draft)?;
        let conn = self.conn.lock();
        Self::load_change_request(&conn, id)?
            .ok_or_else(|| CollaboratorError::Storage(format!("change request {} vanished", id)))
    }

    fn change_request(&self, id: i64) -> Result<Option<ChangeRequest>, CollaboratorError> {
        let conn = self.conn.lock();
        Ok(Self::load_change_request(&conn, id)?)
    }

    fn cases(&self) -> Result<Vec<Case>, CollaboratorError> {
        Ok(self.query(
            &format!("SELECT {} FROM cases ORDER BY id", CASE_COLUMNS),
            case_from_row,
        )?)
    }
}
