//! Search Module
//!
//! The search/ranking query path:
//! - Predicate compilation from the normalized filter (with the documented
//!   restriction-matching asymmetry between the two branches)
//! - Weighted FTS5 relevance ranking (caption > credit > archive number)
//! - Concurrent count + paginated-fetch execution

mod executor;
mod predicate;

pub use executor::{Result as SearchResult, SearchEngine, SearchError, SearchPage};
pub use predicate::{
    sanitize_match_query, OrderBy, Predicate, WEIGHT_ARCHIVE_NUMBER, WEIGHT_CAPTION, WEIGHT_CREDIT,
};
