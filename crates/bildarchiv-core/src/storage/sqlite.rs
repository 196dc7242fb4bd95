//! SQLite Storage Implementation
//!
//! The narrow storage capability the engine and the pipeline call through:
//! predicate-driven record queries, derived-field writeback, and the
//! search-usage log stream.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, params_from_iter, Connection, Row};
use rusqlite::types::Value;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::logging::{LogStats, QueryCount, SearchLogEntry};
use crate::record::{ArchiveRecord, DerivedFields, NewRecord};
use crate::search::{OrderBy, Predicate};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(i64),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORAGE
// ============================================================================

/// Catalogue storage over SQLite with an FTS5 relevance index.
///
/// Uses separate reader/writer connections for interior mutability. All
/// methods take `&self`, making `Storage` `Send + Sync` so callers can share
/// it behind `Arc<Storage>`. A second reader connection is dedicated to
/// count queries so the executor's concurrent count+page pair does not
/// serialize on a single connection mutex.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    count_reader: Mutex<Connection>,
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create a new storage instance.
    ///
    /// With `None`, the database lives in the platform data directory.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("de", "bildarchiv", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;
                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("bildarchiv.db")
            }
        };

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on the writer only
        super::migrations::apply_migrations(&writer_conn)?;

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        let count_conn = Connection::open(&path)?;
        Self::configure_connection(&count_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            count_reader: Mutex::new(count_conn),
        })
    }

    // ========================================================================
    // RECORDS
    // ========================================================================

    /// Insert a catalogue record (external-ingestion seam).
    ///
    /// Derived fields start empty and the version stamp absent.
    pub fn insert_record(&self, input: &NewRecord) -> Result<ArchiveRecord> {
        let id = {
            let writer = self
                .writer
                .lock()
                .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
            writer.execute(
                "INSERT INTO records (archive_number, credit, caption, taken_at, height, width)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.archive_number,
                    input.credit,
                    input.caption,
                    input.taken_at.to_rfc3339(),
                    input.height,
                    input.width,
                ],
            )?;
            writer.last_insert_rowid()
        };

        self.get_record(id)?.ok_or(StorageError::NotFound(id))
    }

    /// Fetch a single record by identity
    pub fn get_record(&self, id: i64) -> Result<Option<ArchiveRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare("SELECT * FROM records WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], Self::row_to_record)?;
        rows.next().transpose().map_err(Into::into)
    }

    /// Fetch an ordered page of records matching the predicate.
    pub fn find_records(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ArchiveRecord>> {
        let where_sql = predicate
            .where_sql()
            .map(|w| format!(" WHERE {w}"))
            .unwrap_or_default();
        let sql = format!(
            "SELECT r.* FROM {}{} ORDER BY {} LIMIT ? OFFSET ?",
            predicate.from_sql(),
            where_sql,
            order.sql(),
        );

        let mut bound: Vec<Value> = predicate.params().to_vec();
        bound.push(Value::Integer(limit as i64));
        bound.push(Value::Integer(offset as i64));

        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bound), Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Count all records matching the predicate.
    ///
    /// Must be handed the identical predicate as the paired
    /// [`find_records`](Self::find_records) call.
    pub fn count_records(&self, predicate: &Predicate) -> Result<u64> {
        let where_sql = predicate
            .where_sql()
            .map(|w| format!(" WHERE {w}"))
            .unwrap_or_default();
        let sql = format!("SELECT COUNT(*) FROM {}{}", predicate.from_sql(), where_sql);

        let counter = self
            .count_reader
            .lock()
            .map_err(|_| StorageError::Init("Count reader lock poisoned".into()))?;
        let count: i64 =
            counter.query_row(&sql, params_from_iter(predicate.params().to_vec()), |row| {
                row.get(0)
            })?;
        Ok(count.max(0) as u64)
    }

    /// Fetch a batch of records still below the target pipeline version,
    /// in store-default order.
    pub fn fetch_unprocessed(&self, version: u32, limit: u32) -> Result<Vec<ArchiveRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT * FROM records
             WHERE normalize_version IS NULL OR normalize_version < ?1
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![version, limit], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Write back derived fields and the version stamp as a single update
    /// keyed by record identity.
    pub fn update_derived_fields(&self, id: i64, fields: &DerivedFields) -> Result<()> {
        let people_json =
            serde_json::to_string(&fields.people).unwrap_or_else(|_| "[]".to_string());
        let locations_json =
            serde_json::to_string(&fields.locations).unwrap_or_else(|_| "[]".to_string());

        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let changed = writer.execute(
            "UPDATE records
             SET restriction = ?1, people = ?2, locations = ?3, normalize_version = ?4
             WHERE id = ?5",
            params![
                fields.restriction,
                people_json,
                locations_json,
                fields.version,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }

    /// Distinct credits, for the presentation layer's filter dropdown
    pub fn distinct_credits(&self) -> Result<Vec<String>> {
        self.distinct_column("SELECT DISTINCT credit FROM records ORDER BY credit")
    }

    /// Distinct non-null restriction values, for the filter dropdown
    pub fn distinct_restrictions(&self) -> Result<Vec<String>> {
        self.distinct_column(
            "SELECT DISTINCT restriction FROM records
             WHERE restriction IS NOT NULL ORDER BY restriction",
        )
    }

    fn distinct_column(&self, sql: &str) -> Result<Vec<String>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(row?);
        }
        Ok(values)
    }

    // ========================================================================
    // SEARCH LOG
    // ========================================================================

    /// Append one usage-log entry. Created-at is stamped at write time.
    pub fn create_log_entry(&self, entry: &SearchLogEntry) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute(
            "INSERT INTO search_log (
                id, query, restriction, credit, date,
                page, page_size, sort, response_ms, result_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.id,
                entry.query,
                entry.restriction,
                entry.credit,
                entry.date,
                entry.page,
                entry.page_size,
                entry.sort,
                entry.response_ms,
                // SQLite integers are i64; result counts never reach that bound
                entry.result_count as i64,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Pre-aggregated usage counters for the statistics view:
    /// total searches, mean response time, and the top queries by frequency.
    pub fn aggregate_log_entries(&self) -> Result<LogStats> {
        let counter = self
            .count_reader
            .lock()
            .map_err(|_| StorageError::Init("Count reader lock poisoned".into()))?;

        let (total_searches, avg_ms): (i64, f64) = counter.query_row(
            "SELECT COUNT(*), COALESCE(AVG(response_ms), 0.0) FROM search_log",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = counter.prepare(
            "SELECT query, COUNT(*) AS uses FROM search_log
             WHERE query IS NOT NULL
             GROUP BY query
             ORDER BY uses DESC
             LIMIT 8",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(QueryCount {
                query: row.get(0)?,
                count: row.get::<_, i64>(1)?.max(0) as u64,
            })
        })?;

        let mut top_queries = Vec::new();
        for row in rows {
            top_queries.push(row?);
        }

        Ok(LogStats {
            total_searches: total_searches.max(0) as u64,
            avg_response_ms: avg_ms.round() as u64,
            top_queries,
        })
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ArchiveRecord> {
        let taken_at_str: String = row.get("taken_at")?;
        let taken_at = parse_timestamp(&taken_at_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let people_json: String = row.get("people")?;
        let locations_json: String = row.get("locations")?;

        Ok(ArchiveRecord {
            id: row.get("id")?,
            archive_number: row.get("archive_number")?,
            credit: row.get("credit")?,
            caption: row.get("caption")?,
            taken_at,
            height: row.get("height")?,
            width: row.get("width")?,
            restriction: row.get("restriction")?,
            people: serde_json::from_str(&people_json).unwrap_or_default(),
            locations: serde_json::from_str(&locations_json).unwrap_or_default(),
            normalize_version: row.get("normalize_version")?,
        })
    }
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// TESTS
// ============================================================================
