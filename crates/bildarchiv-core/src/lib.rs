//! # Bildarchiv Core
//!
//! Search and normalization engine for a photo-archive catalogue:
//!
//! - **Relevance Search**: SQLite FTS5 with field-weighted BM25 ranking
//!   (caption > credit > archive number), capture-date tiebreak
//! - **Filter Compiler**: lenient normalization of raw request parameters
//!   into a validated filter (clamped pagination, dropped malformed dates)
//! - **Structured Filters**: credit, calendar date, and restriction-token
//!   predicates composed with AND semantics on top of full-text matching
//! - **Usage Logging**: fire-and-forget persistence of every search with
//!   its latency and result count, plus aggregate statistics
//! - **Normalization Pipeline**: versioned batch extraction of restriction
//!   tokens, people, and locations from caption text
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bildarchiv_core::{RawSearchParams, SearchEngine, Storage};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(Storage::new(None)?);
//! let engine = SearchEngine::new(Arc::clone(&storage));
//!
//! let params = RawSearchParams {
//!     q: Some("berlin portrait".to_string()),
//!     ..Default::default()
//! };
//! let page = engine.search(params).await?;
//! println!("{} of {} results", page.items.len(), page.total);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod search;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Catalogue records
pub use record::{ArchiveRecord, DerivedFields, NewRecord};

// Filter compilation
pub use filter::{RawSearchParams, SearchFilter, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// Search execution
pub use search::{OrderBy, Predicate, SearchEngine, SearchError, SearchPage};

// Usage logging
pub use logging::{LogStats, QueryCount, SearchLogEntry, UsageLogger};

// Normalization pipeline
pub use pipeline::{
    extract, CaptionFacts, NormalizePipeline, PipelineConfig, RunSummary,
    CURRENT_NORMALIZE_VERSION,
};

// Storage layer
pub use storage::{Result, Storage, StorageError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
