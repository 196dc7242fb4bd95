//! Search Journey
//!
//! Drives the full request path a catalogue frontend would: raw query-string
//! parameters in, ranked result pages out. Covers free-text relevance,
//! structured filters, pagination, sorting, and lenient input handling.

use std::collections::HashSet;

use bildarchiv_core::{RawSearchParams, SearchEngine, SortOrder};
use bildarchiv_e2e_tests::fixtures::{seed_normalized, temp_storage};

fn params(pairs: &[(&str, &str)]) -> RawSearchParams {
    let mut p = RawSearchParams::default();
    for (key, value) in pairs {
        match *key {
            "q" => p.q = Some(value.to_string()),
            "credit" => p.credit = Some(value.to_string()),
            "date" => p.date = Some(value.to_string()),
            "restriction" => p.restriction.push(value.to_string()),
            "page" => p.page = Some(value.to_string()),
            "pageSize" => p.page_size = Some(value.to_string()),
            "sort" => p.sort = Some(value.to_string()),
            other => panic!("unknown param {other}"),
        }
    }
    p
}

#[tokio::test]
async fn browse_without_filters_returns_newest_first() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let page = engine.search(RawSearchParams::default()).await.unwrap();
    assert_eq!(page.total, 8);
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 50);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.items.len(), 8);

    // Default sort is capture date descending
    let dates: Vec<_> = page.items.iter().map(|r| r.taken_at).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
    assert_eq!(page.items[0].taken_at.format("%Y").to_string(), "1990");
}

#[tokio::test]
async fn ascending_sort_starts_with_oldest() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let page = engine.search(params(&[("sort", "asc")])).await.unwrap();
    assert_eq!(page.items[0].taken_at.format("%Y").to_string(), "1959");
    assert_eq!(
        SortOrder::parse_token(Some("asc")),
        SortOrder::Ascending,
    );
}

#[tokio::test]
async fn free_text_matches_captions() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let page = engine.search(params(&[("q", "stadion")])).await.unwrap();
    assert_eq!(page.total, 3);
    for record in &page.items {
        assert!(record.caption.to_lowercase().contains("stadion"));
    }
}

#[tokio::test]
async fn credit_filter_is_case_insensitive_exact() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let page = engine
        .search(params(&[("credit", "imago / teutopress")]))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    for record in &page.items {
        assert_eq!(record.credit, "IMAGO / teutopress");
    }

    // Prefix of a credit is not a match
    let page = engine.search(params(&[("credit", "IMAGO")])).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn date_filter_selects_single_calendar_day() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let page = engine.search(params(&[("date", "1988-07-09")])).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].archive_number, "0041587219");
}

#[tokio::test]
async fn combined_text_and_credit_narrow_each_other() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let text_only = engine.search(params(&[("q", "jubel")])).await.unwrap();
    assert_eq!(text_only.total, 2);

    let narrowed = engine
        .search(params(&[("q", "jubel"), ("credit", "IMAGO / Sven Simon")]))
        .await
        .unwrap();
    assert_eq!(narrowed.total, 2);

    let narrowed = engine
        .search(params(&[("q", "jubel"), ("date", "1974-05-12")]))
        .await
        .unwrap();
    assert_eq!(narrowed.total, 1);
    assert_eq!(narrowed.items[0].archive_number, "0041587213");
}

#[tokio::test]
async fn restriction_filter_requires_normalized_fields() {
    let (_dir, storage) = temp_storage();
    // Seed only; do not run the pipeline
    bildarchiv_e2e_tests::fixtures::seed_catalogue(&storage);
    let engine = SearchEngine::new(storage);

    let page = engine
        .search(params(&[("restriction", "PUBLICATIONxINxGERxONLY")]))
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn restriction_filter_after_normalization() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    // Without free text the restriction filter is a substring match
    let page = engine
        .search(params(&[("restriction", "publicationxinxgerxonly")]))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].archive_number, "0041587215");

    // Two values widen the filter (OR semantics)
    let page = engine
        .search(params(&[
            ("restriction", "PUBLICATIONxINxGERxONLY"),
            ("restriction", "PUBLICATIONxINxGERxSUIxAUTxONLY"),
        ]))
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    // With free text present the match becomes exact membership
    let page = engine
        .search(params(&[
            ("q", "bundestag"),
            ("restriction", "PUBLICATIONxINxGERxONLY"),
        ]))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].archive_number, "0041587215");
}

#[tokio::test]
async fn pagination_covers_catalogue_without_duplicates() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let mut seen = HashSet::new();
    for page_no in 1..=3 {
        let page = engine
            .search(params(&[
                ("page", &page_no.to_string()),
                ("pageSize", "3"),
            ]))
            .await
            .unwrap();
        assert_eq!(page.total, 8);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, page_no);
        for record in &page.items {
            assert!(seen.insert(record.id), "record {} repeated", record.id);
        }
    }
    assert_eq!(seen.len(), 8);

    // Past the last page: still well-formed, just empty
    let past = engine
        .search(params(&[("page", "4"), ("pageSize", "3")]))
        .await
        .unwrap();
    assert_eq!(past.total, 8);
    assert!(past.items.is_empty());
}

#[tokio::test]
async fn malformed_inputs_degrade_instead_of_failing() {
    let (_dir, storage) = temp_storage();
    seed_normalized(&storage);
    let engine = SearchEngine::new(storage);

    let page = engine
        .search(params(&[
            ("page", "0"),
            ("pageSize", "500"),
            ("date", "yesterday"),
            ("sort", "upward"),
        ]))
        .await
        .unwrap();

    // page floors at 1, pageSize clamps at 100, the bad date is dropped,
    // the unknown sort token falls back to descending
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 100);
    assert_eq!(page.total, 8);
    let dates: Vec<_> = page.items.iter().map(|r| r.taken_at).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
}
