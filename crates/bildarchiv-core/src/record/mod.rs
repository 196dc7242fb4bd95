//! Archive Record - The catalogue entity being searched and normalized
//!
//! Each record carries:
//! - Raw archive metadata (archive number, credit, caption, capture date)
//! - Derived structured fields extracted from the caption text
//! - The normalization-pipeline version stamp that produced them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ARCHIVE RECORD
// ============================================================================

/// A single catalogue entry (photo metadata).
///
/// The caption text is the raw source of truth. The `restriction`, `people`
/// and `locations` fields are derived from it by the normalization pipeline
/// and are never hand-edited; `normalize_version` records which revision of
/// the extraction rules produced them (`None` = never processed).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    /// Opaque numeric identity (SQLite rowid)
    pub id: i64,
    /// Externally meaningful archive number ("Bildnummer", formatted as digits)
    pub archive_number: String,
    /// Photographer or agency credit
    pub credit: String,
    /// Free-text archive caption, the raw source of truth
    pub caption: String,
    /// Capture date (calendar-date semantics, no time-of-day meaning)
    pub taken_at: DateTime<Utc>,
    /// Image height in pixels
    pub height: u32,
    /// Image width in pixels
    pub width: u32,

    // ========== Derived fields (written only by the pipeline) ==========
    /// Usage-restriction token extracted from the caption
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restriction: Option<String>,
    /// People mentioned in the caption (deduplicated, order irrelevant)
    pub people: Vec<String>,
    /// Locations extracted from the caption (0 or 1 element under the
    /// current extraction policy)
    pub locations: Vec<String>,
    /// Pipeline version that produced the derived fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize_version: Option<u32>,
}

impl ArchiveRecord {
    /// Whether the record still needs processing at the given pipeline version
    pub fn is_unprocessed_at(&self, version: u32) -> bool {
        self.normalize_version.map(|v| v < version).unwrap_or(true)
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for creating a catalogue record.
///
/// Record creation belongs to the external ingestion process; the engine
/// itself never creates records. New records start with no derived fields
/// and no version stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    /// Archive number
    pub archive_number: String,
    /// Photographer or agency credit
    pub credit: String,
    /// Free-text caption
    pub caption: String,
    /// Capture date
    pub taken_at: DateTime<Utc>,
    /// Image height in pixels
    pub height: u32,
    /// Image width in pixels
    pub width: u32,
}

/// Derived fields written back by the normalization pipeline.
///
/// Applied as a single update keyed by record identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
    /// Extracted usage-restriction token
    pub restriction: Option<String>,
    /// Extracted people names
    pub people: Vec<String>,
    /// Extracted locations (0 or 1 element)
    pub locations: Vec<String>,
    /// Pipeline version producing these fields
    pub version: u32,
}

// ============================================================================
// TESTS
// ============================================================================
