//! History store

use crate::error::{HistoryError, HistoryResult};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const CREATE_TABLE: &str = "CREATE TABLE history(\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    text TEXT NOT NULL, \
    source TEXT NOT NULL, \
    target TEXT NOT NULL, \
    service TEXT NOT NULL, \
    result TEXT NOT NULL, \
    timestamp INTEGER NOT NULL)";

const INSERT: &str = "INSERT INTO history (text, source, target, service, result, timestamp) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// A row to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub text: String,
    /// Detected source language
    pub source: String,
    /// Effective target language
    pub target: String,
    pub service: String,
    pub result: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl NewHistoryEntry {
    pub fn now(
        text: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        service: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            target: target.into(),
            service: service.into(),
            result: result.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// A stored row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub text: String,
    pub source: String,
    pub target: String,
    pub service: String,
    pub result: String,
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Thread-safe history database handle
#[derive(Clone)]
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
    schema_creations: Arc<AtomicUsize>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("schema_creations", &self.schema_creations())
            .finish_non_exhaustive()
    }
}

impl HistoryStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> HistoryResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening history database");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HistoryError::Connection(format!("Failed to create directory: {}", e))
            })?;
        }
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// An in-memory database for testing
    pub fn memory() -> HistoryResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            schema_creations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times this handle created the schema
    pub fn schema_creations(&self) -> usize {
        self.schema_creations.load(Ordering::Relaxed)
    }

    /// Append one row, creating the table first if it is missing.
    ///
    /// At most one schema creation and one retry happen per call.
    pub fn append(&self, entry: &NewHistoryEntry) -> HistoryResult<i64> {
        let conn = self.conn.lock();
        match insert(&conn, entry) {
            Err(e) if e.is_missing_table() => {
                debug!("History table missing, creating schema");
                conn.execute_batch(CREATE_TABLE)?;
                self.schema_creations.fetch_add(1, Ordering::Relaxed);
                insert(&conn, entry).inspect_err(|e| {
                    warn!("History append failed after creating schema: {}", e);
                })
            }
            other => other,
        }
    }

    /// Most recent rows first
    pub fn recent(&self, limit: usize) -> HistoryResult<Vec<HistoryEntry>> {
        let conn = self.conn.lock();
        let query = || -> HistoryResult<Vec<HistoryEntry>> {
            let mut stmt = conn.prepare(
                "SELECT id, text, source, target, service, result, timestamp \
                 FROM history ORDER BY timestamp DESC, id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit as i64], |row| {
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    source: row.get(2)?,
                    target: row.get(3)?,
                    service: row.get(4)?,
                    result: row.get(5)?,
                    timestamp: row.get(6)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        };
        match query() {
            Err(e) if e.is_missing_table() => Ok(Vec::new()),
            other => other,
        }
    }

    /// Delete every row, returning how many were removed
    pub fn clear(&self) -> HistoryResult<usize> {
        let conn = self.conn.lock();
        match conn.execute("DELETE FROM history", []) {
            Ok(n) => {
                info!("Cleared {} history entries", n);
                Ok(n)
            }
            Err(e) => {
                let err = HistoryError::from(e);
                if err.is_missing_table() {
                    Ok(0)
                } else {
                    Err(err)
                }
            }
        }
    }
}

fn insert(conn: &Connection, entry: &NewHistoryEntry) -> HistoryResult<i64> {
    conn.execute(
        INSERT,
        params![
            entry.text,
            entry.source,
            entry.target,
            entry.service,
            entry.result,
            entry.timestamp
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
