//! Database schema for the known-state store.

/// SQL schema for the state database.
///
/// One row per observed path; upserts and deletes are keyed by path so
/// replaying a write after a crash is harmless.
pub const SCHEMA: &str = r"
-- Enable WAL mode for better concurrent read/write performance
PRAGMA journal_mode = WAL;

-- Files table: every path ever observed on the share and still present
CREATE TABLE IF NOT EXISTS files (
    path TEXT PRIMARY KEY NOT NULL,
    kind TEXT NOT NULL DEFAULT 'file',
    last_seen TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_last_seen ON files(last_seen);
";
