//! Storage Module
//!
//! SQLite-based storage layer with:
//! - FTS5 full-text search with query sanitization
//! - Predicate-driven count/fetch pairs for consistent pagination
//! - Derived-field writeback for the normalization pipeline
//! - The write-only search-usage log stream

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, Storage, StorageError};
