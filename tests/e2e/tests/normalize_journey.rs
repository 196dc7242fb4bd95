//! Normalization Journey
//!
//! Runs the pipeline over a freshly seeded catalogue and verifies the
//! derived fields end to end: restriction tokens, people, locations, the
//! version stamp, idempotent reruns, and version-bump reprocessing.

use std::sync::Arc;

use bildarchiv_core::{
    NormalizePipeline, PipelineConfig, CURRENT_NORMALIZE_VERSION,
};
use bildarchiv_e2e_tests::fixtures::{seed_catalogue, temp_storage};

#[test]
fn fresh_catalogue_is_fully_unprocessed() {
    let (_dir, storage) = temp_storage();
    let seeded = seed_catalogue(&storage);

    for record in &seeded {
        assert_eq!(record.normalize_version, None);
        assert!(record.people.is_empty());
        assert!(record.locations.is_empty());
        assert_eq!(record.restriction, None);
    }
    assert_eq!(
        storage
            .fetch_unprocessed(CURRENT_NORMALIZE_VERSION, 100)
            .unwrap()
            .len(),
        seeded.len()
    );
}

#[test]
fn pipeline_derives_structured_fields() {
    let (_dir, storage) = temp_storage();
    let seeded = seed_catalogue(&storage);

    let summary = NormalizePipeline::new(Arc::clone(&storage)).run().unwrap();
    assert_eq!(summary.processed as usize, seeded.len());
    assert_eq!(summary.failed, 0);

    // Single person, single location
    let beckenbauer = storage.get_record(seeded[0].id).unwrap().unwrap();
    assert_eq!(beckenbauer.people, vec!["Franz Beckenbauer"]);
    assert_eq!(beckenbauer.locations, vec!["München"]);
    assert_eq!(beckenbauer.restriction, None);
    assert_eq!(beckenbauer.normalize_version, Some(CURRENT_NORMALIZE_VERSION));

    // "and"-joined names plus a restriction token after the date
    let brandt = storage.get_record(seeded[2].id).unwrap().unwrap();
    assert_eq!(brandt.people, vec!["Willy Brandt", "Helmut Schmidt"]);
    assert_eq!(brandt.locations, vec!["Bonn"]);
    assert_eq!(brandt.restriction.as_deref(), Some("PUBLICATIONxINxGERxONLY"));

    let schneider = storage.get_record(seeded[3].id).unwrap().unwrap();
    assert_eq!(
        schneider.restriction.as_deref(),
        Some("PUBLICATIONxINxGERxSUIxAUTxONLY")
    );

    // Caption carrying neither comma nor date: keyword-only, no structure
    let luftaufnahme = storage.get_record(seeded[5].id).unwrap().unwrap();
    assert!(luftaufnahme.people.is_empty());
    assert!(luftaufnahme.locations.is_empty());
    assert_eq!(luftaufnahme.normalize_version, Some(CURRENT_NORMALIZE_VERSION));
}

#[test]
fn rerun_is_a_noop_until_version_bumps() {
    let (_dir, storage) = temp_storage();
    seed_catalogue(&storage);

    let pipeline = NormalizePipeline::new(Arc::clone(&storage));
    let first = pipeline.run().unwrap();
    assert_eq!(first.processed, 8);

    let second = pipeline.run().unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.batches, 0);

    let bumped = NormalizePipeline::with_config(
        Arc::clone(&storage),
        PipelineConfig {
            version: CURRENT_NORMALIZE_VERSION + 1,
            ..PipelineConfig::default()
        },
    );
    let third = bumped.run().unwrap();
    assert_eq!(third.processed, 8);
}

#[test]
fn distinct_restrictions_feed_the_filter_options() {
    let (_dir, storage) = temp_storage();
    seed_catalogue(&storage);
    NormalizePipeline::new(Arc::clone(&storage)).run().unwrap();

    let restrictions = storage.distinct_restrictions().unwrap();
    assert_eq!(
        restrictions,
        vec![
            "PUBLICATIONxINxGERxONLY".to_string(),
            "PUBLICATIONxINxGERxSUIxAUTxONLY".to_string(),
        ]
    );

    let credits = storage.distinct_credits().unwrap();
    assert_eq!(credits.len(), 4);
    assert!(credits.contains(&"IMAGO / teutopress".to_string()));
}
