//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: records, FTS5 relevance index, search log",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Search-log indexes for the statistics aggregates",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    archive_number TEXT NOT NULL,
    credit TEXT NOT NULL,
    caption TEXT NOT NULL DEFAULT '',
    taken_at TEXT NOT NULL,
    height INTEGER NOT NULL,
    width INTEGER NOT NULL,

    -- Derived fields, written only by the normalization pipeline
    restriction TEXT,
    people TEXT NOT NULL DEFAULT '[]',
    locations TEXT NOT NULL DEFAULT '[]',
    normalize_version INTEGER
);

CREATE INDEX IF NOT EXISTS idx_records_taken_at ON records(taken_at);
CREATE INDEX IF NOT EXISTS idx_records_credit ON records(credit);
CREATE INDEX IF NOT EXISTS idx_records_normalize_version ON records(normalize_version);

-- FTS5 virtual table for weighted full-text relevance. Column order matters:
-- bm25(records_fts, w_caption, w_credit, w_archive_number) relies on it.
CREATE VIRTUAL TABLE IF NOT EXISTS records_fts USING fts5(
    caption,
    credit,
    archive_number,
    content='records',
    content_rowid='id'
);

-- Triggers to keep FTS in sync
CREATE TRIGGER IF NOT EXISTS records_ai AFTER INSERT ON records BEGIN
    INSERT INTO records_fts(rowid, caption, credit, archive_number)
    VALUES (NEW.id, NEW.caption, NEW.credit, NEW.archive_number);
END;

CREATE TRIGGER IF NOT EXISTS records_ad AFTER DELETE ON records BEGIN
    INSERT INTO records_fts(records_fts, rowid, caption, credit, archive_number)
    VALUES ('delete', OLD.id, OLD.caption, OLD.credit, OLD.archive_number);
END;

CREATE TRIGGER IF NOT EXISTS records_au AFTER UPDATE ON records BEGIN
    INSERT INTO records_fts(records_fts, rowid, caption, credit, archive_number)
    VALUES ('delete', OLD.id, OLD.caption, OLD.credit, OLD.archive_number);
    INSERT INTO records_fts(rowid, caption, credit, archive_number)
    VALUES (NEW.id, NEW.caption, NEW.credit, NEW.archive_number);
END;

-- Search usage log: one row per completed search, write-only from the core
CREATE TABLE IF NOT EXISTS search_log (
    id TEXT PRIMARY KEY,
    query TEXT,
    restriction TEXT,
    credit TEXT,
    date TEXT,
    page INTEGER NOT NULL,
    page_size INTEGER NOT NULL,
    sort TEXT NOT NULL,
    response_ms INTEGER NOT NULL,
    result_count INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: indexes backing the statistics view's aggregate queries
const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_search_log_query ON search_log(query);
CREATE INDEX IF NOT EXISTS idx_search_log_created ON search_log(created_at);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            // execute_batch handles multi-statement SQL including triggers
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
