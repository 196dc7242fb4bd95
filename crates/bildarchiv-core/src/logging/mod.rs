//! Usage Logger
//!
//! Records each completed search without blocking or failing the caller.
//! The write is dispatched as a detached task after the response value has
//! been computed; failures are swallowed and surfaced only as operational
//! warnings. At-most-once, best-effort semantics: no retry, no queue.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::filter::{RawSearchParams, SearchFilter};
use crate::storage::Storage;

// ============================================================================
// LOG ENTRY
// ============================================================================

/// One search-log row: the normalized filter values, pagination, timing and
/// result count for a completed search. Created exactly once per request,
/// never updated or deleted by the core.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLogEntry {
    /// Entry id (UUID v4)
    pub id: String,
    /// Normalized query text
    pub query: Option<String>,
    /// Restriction filter values, comma-joined if multiple
    pub restriction: Option<String>,
    /// Normalized credit filter
    pub credit: Option<String>,
    /// Date filter as submitted by the client (raw, not the parsed value)
    pub date: Option<String>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub page_size: u32,
    /// Sort direction token
    pub sort: String,
    /// Response latency from request start to response-ready
    pub response_ms: i64,
    /// Total matching records reported to the client
    pub result_count: u64,
}

impl SearchLogEntry {
    /// Build an entry for a completed search.
    ///
    /// Carries the normalized filter values rather than the compiled
    /// predicate; the date filter is logged raw as submitted.
    pub fn for_search(
        raw: &RawSearchParams,
        filter: &SearchFilter,
        latency: Duration,
        result_count: u64,
    ) -> Self {
        let restriction = if filter.restrictions.is_empty() {
            None
        } else {
            Some(filter.restrictions.join(","))
        };

        Self {
            id: Uuid::new_v4().to_string(),
            query: filter.query.clone(),
            restriction,
            credit: filter.credit.clone(),
            date: raw.date.clone(),
            page: filter.page,
            page_size: filter.page_size,
            sort: filter.sort.as_str().to_string(),
            response_ms: latency.as_millis().min(i64::MAX as u128) as i64,
            result_count,
        }
    }
}

// ============================================================================
// STATISTICS AGGREGATES
// ============================================================================

/// A query and how often it was searched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCount {
    /// The logged query text
    pub query: String,
    /// Number of searches with this query
    pub count: u64,
}

/// Pre-aggregated usage counters consumed by the statistics view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    /// Total logged searches
    pub total_searches: u64,
    /// Mean response latency in milliseconds, rounded
    pub avg_response_ms: u64,
    /// Most common non-null queries, most frequent first (top 8)
    pub top_queries: Vec<QueryCount>,
}

// ============================================================================
// USAGE LOGGER
// ============================================================================

/// Fire-and-forget writer for the search-usage log.
pub struct UsageLogger {
    storage: Arc<Storage>,
}

impl UsageLogger {
    /// Create a logger over the shared storage handle
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Dispatch one log write on a detached task.
    ///
    /// The returned handle exists for test observability only; the search
    /// path must never await it. Write failures are contained here and
    /// reported through `tracing::warn!`, never to the search caller.
    pub fn dispatch(&self, entry: SearchLogEntry) -> JoinHandle<()> {
        let storage = Arc::clone(&self.storage);
        tokio::spawn(async move {
            let entry_id = entry.id.clone();
            let result =
                tokio::task::spawn_blocking(move || storage.create_log_entry(&entry)).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!("search log write failed (entry {entry_id}): {e}");
                }
                Err(e) => {
                    tracing::warn!("search log task aborted (entry {entry_id}): {e}");
                }
            }
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
