use crate::app_dirs::AppDirs;
use crate::session::LoggedContact;
use crate::{PileupError, Result};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// A contact as stored in the history database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactRecord {
    pub id: i64,
    pub number: u32,
    pub mode: String,
    pub callsign: String,
    pub speed: String,
    pub attempts: u32,
    pub elapsed: f64,
    pub annotation: String,
    pub timestamp: DateTime<Local>,
}

/// Contacts logged across sessions, kept in SQLite.
#[derive(Debug)]
pub struct ContactDb {
    conn: Connection,
}

impl ContactDb {
    /// Open the database under the state directory, creating it if needed.
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().ok_or(PileupError::NoStateDir("contacts.db"))?;
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PileupError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                number INTEGER NOT NULL,
                mode TEXT NOT NULL,
                callsign TEXT NOT NULL,
                speed TEXT NOT NULL,
                attempts INTEGER NOT NULL,
                elapsed REAL NOT NULL,
                annotation TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_contacts_timestamp ON contacts(timestamp)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn record(&self, contact: &LoggedContact) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO contacts
            (number, mode, callsign, speed, attempts, elapsed, annotation, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                contact.number,
                contact.mode.to_string(),
                contact.callsign,
                contact.speed,
                contact.attempts,
                contact.elapsed,
                contact.annotation,
                contact.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent contacts first.
    pub fn recent(&self, limit: usize) -> Result<Vec<ContactRecord>> {
        self.query(
            "SELECT id, number, mode, callsign, speed, attempts, elapsed, annotation, timestamp
             FROM contacts ORDER BY id DESC LIMIT ?1",
            Some(limit as i64),
        )
    }

    /// Every contact, oldest first.
    pub fn all(&self) -> Result<Vec<ContactRecord>> {
        self.query(
            "SELECT id, number, mode, callsign, speed, attempts, elapsed, annotation, timestamp
             FROM contacts ORDER BY id ASC",
            None,
        )
    }

    fn query(&self, sql: &str, limit: Option<i64>) -> Result<Vec<ContactRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = match limit {
            Some(limit) => stmt.query_map([limit], raw_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt.query_map([], raw_row)?.collect::<rusqlite::Result<Vec<_>>>()?,
        };
        rows.into_iter().map(RawRow::into_record).collect()
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM contacts", [])?;
        Ok(())
    }

    /// Write every contact as CSV; returns the number of rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let records = self.all()?;
        let mut csv = csv::Writer::from_writer(writer);
        for record in &records {
            csv.serialize(record)?;
        }
        csv.flush()?;
        Ok(records.len())
    }

    pub fn export_csv_to_path<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let written = self.export_csv(File::create(path)?)?;
        info!(path = %path.display(), written, "exported contact log");
        Ok(written)
    }
}

struct RawRow {
    id: i64,
    number: u32,
    mode: String,
    callsign: String,
    speed: String,
    attempts: u32,
    elapsed: f64,
    annotation: String,
    timestamp: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        number: row.get(1)?,
        mode: row.get(2)?,
        callsign: row.get(3)?,
        speed: row.get(4)?,
        attempts: row.get(5)?,
        elapsed: row.get(6)?,
        annotation: row.get(7)?,
        timestamp: row.get(8)?,
    })
}

impl RawRow {
    fn into_record(self) -> Result<ContactRecord> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|err| PileupError::CorruptRow {
                id: self.id,
                message: format!("bad timestamp '{}': {err}", self.timestamp),
            })?
            .with_timezone(&Local);

        Ok(ContactRecord {
            id: self.id,
            number: self.number,
            mode: self.mode,
            callsign: self.callsign,
            speed: self.speed,
            attempts: self.attempts,
            elapsed: self.elapsed,
            annotation: self.annotation,
            timestamp,
        })
    }
}
