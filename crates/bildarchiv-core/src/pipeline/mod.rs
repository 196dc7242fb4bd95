//! Normalization Pipeline
//!
//! Versioned batch extraction of structured fields from caption text.
//! Runs out-of-band (cron/batch) over the same record store as search and
//! never blocks it.
//!
//! Per record the state machine is: unprocessed (version absent or below
//! the current pipeline version) → processed (version equal). Bumping
//! [`CURRENT_NORMALIZE_VERSION`] makes every processed record stale again,
//! and reprocessing deterministically overwrites the previous derived
//! fields from caption text alone.

mod extract;

pub use extract::{extract, CaptionFacts};

use std::sync::Arc;

use crate::record::{ArchiveRecord, DerivedFields};
use crate::storage::{Result, Storage};
#[cfg(test)]
use crate::storage::StorageError;

/// Current revision of the extraction rules. Bump when the rules change;
/// every record then re-enters the unprocessed state.
pub const CURRENT_NORMALIZE_VERSION: u32 = 1;

/// Default number of records fetched per batch
pub const DEFAULT_BATCH_SIZE: u32 = 100;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Records fetched per batch
    pub batch_size: u32,
    /// Target pipeline version to stamp on processed records
    pub version: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            version: CURRENT_NORMALIZE_VERSION,
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records whose derived fields were written back
    pub processed: u64,
    /// Records whose write-back failed (retried on the next run)
    pub failed: u64,
    /// Batches fetched
    pub batches: u64,
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Batch normalization over the record store.
///
/// Cursor-less by design: each batch re-queries for records still below the
/// target version, so record mutation during the run cannot skip anything
/// and a crash-and-restart simply resumes wherever the predicate still
/// matches. Reprocessing a record is pure and safe, so concurrent pipeline
/// instances are correct (if wasteful).
pub struct NormalizePipeline {
    storage: Arc<Storage>,
    config: PipelineConfig,
    // Fault seam: lets tests make the write-back fail for chosen records
    #[cfg(test)]
    fail_write_on: fn(&ArchiveRecord) -> bool,
}

impl NormalizePipeline {
    /// Create a pipeline with the default configuration
    pub fn new(storage: Arc<Storage>) -> Self {
        Self::with_config(storage, PipelineConfig::default())
    }

    /// Create a pipeline with an explicit configuration
    pub fn with_config(storage: Arc<Storage>, config: PipelineConfig) -> Self {
        Self {
            storage,
            config,
            #[cfg(test)]
            fail_write_on: |_| false,
        }
    }

    #[cfg(test)]
    fn with_write_fault(
        storage: Arc<Storage>,
        config: PipelineConfig,
        fail_write_on: fn(&ArchiveRecord) -> bool,
    ) -> Self {
        Self {
            storage,
            config,
            fail_write_on,
        }
    }

    fn write_back(&self, record: &ArchiveRecord, fields: &DerivedFields) -> Result<()> {
        #[cfg(test)]
        if (self.fail_write_on)(record) {
            return Err(StorageError::Init("write rejected".into()));
        }
        self.storage.update_derived_fields(record.id, fields)
    }

    /// Run until no unprocessed records remain.
    ///
    /// Individual write-back failures do not abort the batch or the run;
    /// the affected record stays unprocessed and is picked up by the next
    /// run. A batch that makes no progress at all would otherwise refetch
    /// the same rows forever, so the loop bails there as well.
    pub fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        loop {
            let batch = self
                .storage
                .fetch_unprocessed(self.config.version, self.config.batch_size)?;
            if batch.is_empty() {
                break;
            }
            summary.batches += 1;

            let mut batch_processed = 0u64;
            let mut batch_skipped = 0u64;
            for record in &batch {
                if !record.is_unprocessed_at(self.config.version) {
                    // Another pipeline instance won the race since the fetch
                    batch_skipped += 1;
                    continue;
                }

                let facts = extract(&record.caption);
                let fields = DerivedFields {
                    restriction: facts.restriction,
                    people: facts.people,
                    locations: facts.locations,
                    version: self.config.version,
                };

                match self.write_back(record, &fields) {
                    Ok(()) => batch_processed += 1,
                    Err(e) => {
                        summary.failed += 1;
                        tracing::warn!(
                            "derived-field update failed for record {}: {e}",
                            record.id
                        );
                    }
                }
            }

            summary.processed += batch_processed;
            tracing::info!(
                "normalized {} records so far ({} failed, batch {})",
                summary.processed,
                summary.failed,
                summary.batches
            );

            if batch_processed == 0 && batch_skipped == 0 {
                // Every remaining record failed; leave them for the next run
                break;
            }
        }

        Ok(summary)
    }
}

// ============================================================================
// TESTS
// ============================================================================
