//! Ranking Search Executor
//!
//! Resolves a compiled predicate into a total count and an ordered page of
//! results. The count and page queries run concurrently with the identical
//! predicate so `total` and `items` agree with each other at the same
//! instant, modulo concurrent writes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::filter::{RawSearchParams, SearchFilter};
use crate::logging::{SearchLogEntry, UsageLogger};
use crate::record::ArchiveRecord;
use crate::search::{OrderBy, Predicate};
use crate::storage::{Storage, StorageError};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Search error type.
///
/// Bad input never surfaces here — the filter compiler degrades it to
/// defaults. A search fails only when the store itself does.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The store could not be reached or a query failed structurally.
    /// Not retried internally; retry policy belongs to the caller.
    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),
    /// A count/fetch task was cancelled or panicked
    #[error("search task aborted: {0}")]
    Task(String),
}

/// Search result type
pub type Result<T> = std::result::Result<T, SearchError>;

// ============================================================================
// RESULT PAGE
// ============================================================================

/// One page of ranked search results.
///
/// The relevance score is an internal sort key only and is never part of
/// the returned projection.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub page_size: u32,
    /// Total matching records across all pages
    pub total: u64,
    /// `ceil(total / page_size)`
    pub total_pages: u64,
    /// Records on this page, at most `page_size` of them
    pub items: Vec<ArchiveRecord>,
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

/// The single read operation exposed to the presentation layer: compile the
/// raw parameters, build the predicate, execute the concurrent count+page
/// pair, then dispatch the usage log after the response value is ready.
pub struct SearchEngine {
    storage: Arc<Storage>,
    logger: UsageLogger,
}

impl SearchEngine {
    /// Create an engine over the shared storage handle
    pub fn new(storage: Arc<Storage>) -> Self {
        let logger = UsageLogger::new(Arc::clone(&storage));
        Self { storage, logger }
    }

    /// Execute a search request end to end.
    ///
    /// Requests are independent and stateless; any number may run in
    /// parallel. The usage-log write is dispatched fire-and-forget once the
    /// page is computed and never delays or fails the response.
    pub async fn search(&self, params: RawSearchParams) -> Result<SearchPage> {
        let started = Instant::now();

        let filter = SearchFilter::compile(&params);
        let predicate = Predicate::build(&filter);
        let order = if predicate.uses_fts() {
            OrderBy::Relevance(filter.sort)
        } else {
            OrderBy::TakenAt(filter.sort)
        };

        let page = self
            .execute(&predicate, order, filter.offset(), filter.page_size, filter.page)
            .await?;

        let entry = SearchLogEntry::for_search(&params, &filter, started.elapsed(), page.total);
        // Deliberately not awaited: logging happens-after the response
        let _ = self.logger.dispatch(entry);

        Ok(page)
    }

    /// Issue the count + paginated-fetch pair concurrently.
    ///
    /// Both queries consume clones of the same predicate, so filter SQL and
    /// bound parameters are byte-identical. No ordering dependency exists
    /// between them.
    async fn execute(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        offset: u64,
        page_size: u32,
        page: u32,
    ) -> Result<SearchPage> {
        let count_storage = Arc::clone(&self.storage);
        let count_predicate = predicate.clone();
        let fetch_storage = Arc::clone(&self.storage);
        let fetch_predicate = predicate.clone();

        let (total, items) = tokio::join!(
            tokio::task::spawn_blocking(move || count_storage.count_records(&count_predicate)),
            tokio::task::spawn_blocking(move || {
                fetch_storage.find_records(&fetch_predicate, order, offset, page_size)
            }),
        );

        let total = total.map_err(|e| SearchError::Task(e.to_string()))??;
        let items = items.map_err(|e| SearchError::Task(e.to_string()))??;

        Ok(SearchPage {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size as u64),
            items,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
