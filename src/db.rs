//! SQLite persistence for finished interviews
//!
//! One row per interview, keyed by session id. Saving the same interview
//! again replaces the row.

mod schema;

use schema::SCHEMA;

use crate::state_machine::InterviewSnapshot;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Interview not found: {0}")]
    InterviewNotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let display = path.as_ref().display().to_string();
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: display,
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: ":memory:".to_string(),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Insert or replace the row for this snapshot's interview
    pub fn save_snapshot(&self, snapshot: &InterviewSnapshot) -> DbResult<()> {
        let json = serde_json::to_string(snapshot)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO interviews (id, stage, candidate_name, total_score, snapshot, started_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                stage = excluded.stage,
                candidate_name = excluded.candidate_name,
                total_score = excluded.total_score,
                snapshot = excluded.snapshot,
                updated_at = excluded.updated_at",
            params![
                snapshot.session_id,
                snapshot.stage.as_str(),
                snapshot.candidate_info.name,
                snapshot.total_score(),
                json,
                snapshot.started_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    #[allow(dead_code)] // Used in tests
    pub fn get_snapshot(&self, id: &str) -> DbResult<InterviewSnapshot> {
        let conn = self.conn.lock().unwrap();
        let json: String = conn
            .query_row(
                "SELECT snapshot FROM interviews WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::InterviewNotFound(id.to_string()),
                other => DbError::Sqlite(other),
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    #[allow(dead_code)] // Used in tests
    pub fn interview_count(&self) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM interviews", [], |row| row.get(0))?;
        Ok(count)
    }
}
