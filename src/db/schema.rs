//! Database schema

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS interviews (
    id TEXT PRIMARY KEY,
    stage TEXT NOT NULL,
    candidate_name TEXT,
    total_score REAL NOT NULL DEFAULT 0,
    snapshot TEXT NOT NULL,
    started_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_interviews_updated ON interviews(updated_at DESC);
";
