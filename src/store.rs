//! Where finished interviews are handed off
//!
//! The runtime only sees [`SnapshotStore`]. Two backends exist: a directory
//! of pretty-printed JSON files (the default) and a SQLite table.

use crate::db::{Database, DbError};
use crate::state_machine::InterviewSnapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Persistence collaborator for interview snapshots
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist the snapshot, returning a human-readable location
    async fn save(&self, snapshot: &InterviewSnapshot) -> Result<String, StoreError>;
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    async fn save(&self, snapshot: &InterviewSnapshot) -> Result<String, StoreError> {
        (**self).save(snapshot).await
    }
}

// ============================================================================
// JSON files
// ============================================================================

/// One `candidate_<started>_<id>.json` file per interview
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stable per interview, so saving again overwrites the same file
    pub fn file_name(snapshot: &InterviewSnapshot) -> String {
        let short_id: String = snapshot
            .session_id
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(8)
            .collect();
        format!(
            "candidate_{}_{short_id}.json",
            snapshot.started_at.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn path_for(&self, snapshot: &InterviewSnapshot) -> PathBuf {
        self.dir.join(Self::file_name(snapshot))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &InterviewSnapshot) -> Result<String, StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let path = self.path_for(snapshot);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, json).await?;
        tracing::info!(
            path = %path.display(),
            session_id = %snapshot.session_id,
            "Saved interview snapshot"
        );
        Ok(path.display().to_string())
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// Adapter to use [`Database`] as a snapshot store
#[derive(Clone)]
pub struct SqliteSnapshotStore {
    db: Database,
}

impl SqliteSnapshotStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(Database::open(path)?))
    }

    #[allow(dead_code)] // Useful for tests
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn save(&self, snapshot: &InterviewSnapshot) -> Result<String, StoreError> {
        let db = self.db.clone();
        let owned = snapshot.clone();
        // rusqlite is blocking
        tokio::task::spawn_blocking(move || db.save_snapshot(&owned)).await??;
        tracing::info!(
            db = %self.db.path(),
            session_id = %snapshot.session_id,
            "Saved interview snapshot"
        );
        Ok(format!("{} (interview {})", self.db.path(), snapshot.session_id))
    }
}
