//! Durable move history backed by SQLite.
//!
//! Every attempted move during organize and restore appends exactly one row.
//! Rows are never updated; the only deletions are retention trims of the
//! oldest records. A mutex serializes read-modify-write sequences so a
//! background worker can share the log safely.

use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Errors from history persistence. Append failures are reported to the
/// caller but never abort an in-progress run.
#[derive(Debug)]
pub enum HistoryError {
    /// Underlying SQLite failure.
    Database(rusqlite::Error),
    /// IO failure while exporting.
    Io(std::io::Error),
    /// The connection mutex was poisoned by a panicking holder.
    LockPoisoned,
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database(e) => write!(f, "History database error: {}", e),
            Self::Io(e) => write!(f, "History export IO error: {}", e),
            Self::LockPoisoned => write!(f, "History database lock was poisoned"),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<rusqlite::Error> for HistoryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e)
    }
}

/// Which engine produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Organize,
    Restore,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organize => "organize",
            Self::Restore => "restore",
        }
    }
}

/// Whether the moved entry was a file or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn from_is_dir(is_dir: bool) -> Self {
        if is_dir { Self::Folder } else { Self::File }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

/// One persisted move attempt. Immutable after insertion.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub item_type: String,
    pub filename: String,
    pub source_path: String,
    pub dest_path: String,
    pub status: String,
}

/// Handle to the history database.
pub struct HistoryDb {
    conn: Mutex<Connection>,
}

impl HistoryDb {
    /// Opens (creating if necessary) the history database at `path`.
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT,
                action TEXT,
                item_type TEXT,
                filename TEXT,
                source_path TEXT,
                dest_path TEXT,
                status TEXT
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Appends one move attempt. `status` is `"SUCCESS"` or `"FAIL: reason"`.
    pub fn append(
        &self,
        action: HistoryAction,
        kind: ItemKind,
        filename: &str,
        source_path: &Path,
        dest_path: &Path,
        status: &str,
    ) -> Result<(), HistoryError> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let conn = self.conn.lock().map_err(|_| HistoryError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO history
                (timestamp, action, item_type, filename, source_path, dest_path, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                timestamp,
                action.as_str(),
                kind.as_str(),
                filename,
                source_path.to_string_lossy(),
                dest_path.to_string_lossy(),
                status,
            ],
        )?;
        Ok(())
    }

    /// Deletes all records older than the newest `retention_count`. A
    /// non-positive count disables trimming.
    pub fn trim(&self, retention_count: i64) -> Result<(), HistoryError> {
        if retention_count <= 0 {
            return Ok(());
        }
        let conn = self.conn.lock().map_err(|_| HistoryError::LockPoisoned)?;
        let min_id_to_keep: Option<i64> = conn
            .query_row(
                "SELECT id FROM history ORDER BY id DESC LIMIT 1 OFFSET ?1",
                params![retention_count - 1],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(min_id) = min_id_to_keep {
            conn.execute("DELETE FROM history WHERE id < ?1", params![min_id])?;
        }
        Ok(())
    }

    /// The newest `limit` records, newest first.
    pub fn recent(&self, limit: i64) -> Result<Vec<MoveRecord>, HistoryError> {
        let conn = self.conn.lock().map_err(|_| HistoryError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, action, item_type, filename, source_path, dest_path, status
             FROM history ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], Self::row_to_record)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Serializes all records to a CSV file inside `dest_dir` and returns
    /// the produced path.
    pub fn export_csv(&self, dest_dir: &Path) -> Result<PathBuf, HistoryError> {
        let conn = self.conn.lock().map_err(|_| HistoryError::LockPoisoned)?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, action, item_type, filename, source_path, dest_path, status
             FROM history ORDER BY id",
        )?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut out = String::from(
            "id,timestamp,action,item_type,filename,source_path,dest_path,status\n",
        );
        for row in rows {
            let r = row?;
            let fields = [
                r.id.to_string(),
                r.timestamp,
                r.action,
                r.item_type,
                r.filename,
                r.source_path,
                r.dest_path,
                r.status,
            ];
            let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let csv_path = dest_dir.join(format!("aisort_history_{}.csv", stamp));
        fs::write(&csv_path, out).map_err(HistoryError::Io)?;
        Ok(csv_path)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MoveRecord> {
        Ok(MoveRecord {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            action: row.get(2)?,
            item_type: row.get(3)?,
            filename: row.get(4)?,
            source_path: row.get(5)?,
            dest_path: row.get(6)?,
            status: row.get(7)?,
        })
    }
}

/// RFC 4180 quoting: fields containing commas, quotes or newlines are
/// wrapped and inner quotes doubled.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
