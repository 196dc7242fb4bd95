//! Predicate Builder
//!
//! Compiles a normalized [`SearchFilter`] into an opaque storage predicate:
//! either a conjunction of exact/partial-match conditions (no free-text
//! query) or a sanitized FTS5 relevance predicate plus the same conditions
//! as an additional constraint (free-text query present).
//!
//! The two branches deliberately differ in how the restriction filter is
//! matched: substring-OR without a query, exact case-insensitive membership
//! with one. This asymmetry is preserved for compatibility with the archive
//! frontend and is a documented quirk, not something to unify here.

use chrono::{NaiveTime, TimeZone, Utc};
use rusqlite::types::Value;

use crate::filter::{SearchFilter, SortOrder};

/// Relevance weight for caption-text matches (primary field)
pub const WEIGHT_CAPTION: f64 = 3.0;
/// Relevance weight for credit matches (secondary field)
pub const WEIGHT_CREDIT: f64 = 2.0;
/// Relevance weight for archive-number matches (tertiary field)
pub const WEIGHT_ARCHIVE_NUMBER: f64 = 1.0;

// ============================================================================
// FTS QUERY SANITIZATION
// ============================================================================

/// Sanitize raw user text for use as an FTS5 MATCH expression.
///
/// Each whitespace token is stripped of embedded double quotes and wrapped
/// in a quoted phrase, which neutralizes FTS5 query operators (`AND`, `OR`,
/// `NEAR`, `*`, column filters). Tokens are joined by implicit AND.
///
/// Returns `None` when no usable token remains (quotes-only input), so the
/// caller can degrade to the filter-only branch instead of issuing a MATCH
/// that SQLite would reject.
pub fn sanitize_match_query(raw: &str) -> Option<String> {
    let phrases: Vec<String> = raw
        .split_whitespace()
        .map(|token| token.replace('"', ""))
        .filter(|token| !token.is_empty())
        .map(|token| format!("\"{token}\""))
        .collect();

    if phrases.is_empty() {
        None
    } else {
        Some(phrases.join(" "))
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Result ordering resolved by the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Relevance score descending, capture date as tiebreak.
    /// Only meaningful when the predicate carries an FTS match.
    Relevance(SortOrder),
    /// Capture date only (no free-text query, no relevance concept)
    TakenAt(SortOrder),
}

impl OrderBy {
    /// ORDER BY clause body.
    ///
    /// `bm25()` returns numerically smaller values for better matches, so
    /// ascending bm25 is descending relevance. The column weights rank
    /// caption matches over credit matches over archive-number matches.
    pub(crate) fn sql(&self) -> String {
        match self {
            OrderBy::Relevance(sort) => format!(
                "bm25(records_fts, {WEIGHT_CAPTION}, {WEIGHT_CREDIT}, {WEIGHT_ARCHIVE_NUMBER}), \
                 r.taken_at {}",
                sort.as_sql()
            ),
            OrderBy::TakenAt(sort) => format!("r.taken_at {}", sort.as_sql()),
        }
    }
}

// ============================================================================
// PREDICATE
// ============================================================================

/// An opaque, compiled filter predicate.
///
/// Count and page queries must consume the identical predicate so that
/// `total` and `items` are always consistent with each other; cloning the
/// predicate preserves the SQL and bound parameters byte for byte.
#[derive(Debug, Clone)]
pub struct Predicate {
    conditions: Vec<String>,
    params: Vec<Value>,
    fts: bool,
}

impl Predicate {
    /// Build a predicate from a normalized filter.
    pub fn build(filter: &SearchFilter) -> Self {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        let match_query = filter.query.as_deref().and_then(sanitize_match_query);
        let fts = match_query.is_some();

        if let Some(query) = match_query {
            conditions.push("records_fts MATCH ?".to_string());
            params.push(Value::Text(query));
        }

        if let Some(credit) = &filter.credit {
            conditions.push("lower(r.credit) = lower(?)".to_string());
            params.push(Value::Text(credit.clone()));
        }

        if let Some(date) = filter.date {
            // Closed range [start of day, end of day] over RFC 3339 text;
            // lexical comparison is valid because all stored timestamps use
            // the same UTC offset format.
            let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
            let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
                .expect("valid wall-clock time");
            let end = Utc.from_utc_datetime(&date.and_time(end_of_day));
            conditions.push("r.taken_at BETWEEN ? AND ?".to_string());
            params.push(Value::Text(start.to_rfc3339()));
            params.push(Value::Text(end.to_rfc3339()));
        }

        if !filter.restrictions.is_empty() {
            if fts {
                // Exact case-insensitive membership when free text is present
                let placeholders = vec!["lower(?)"; filter.restrictions.len()].join(", ");
                conditions.push(format!(
                    "lower(coalesce(r.restriction, '')) IN ({placeholders})"
                ));
            } else {
                // Case-insensitive substring match against any supplied value
                let alternatives = vec!["instr(lower(coalesce(r.restriction, '')), lower(?)) > 0";
                    filter.restrictions.len()]
                .join(" OR ");
                conditions.push(format!("({alternatives})"));
            }
            for value in &filter.restrictions {
                params.push(Value::Text(value.clone()));
            }
        }

        Self {
            conditions,
            params,
            fts,
        }
    }

    /// Whether this predicate carries a full-text relevance match
    pub fn uses_fts(&self) -> bool {
        self.fts
    }

    /// FROM clause body; the FTS branch joins the external-content index.
    pub(crate) fn from_sql(&self) -> &'static str {
        if self.fts {
            "records r JOIN records_fts ON records_fts.rowid = r.id"
        } else {
            "records r"
        }
    }

    /// WHERE clause body, or `None` when the conjunction is empty
    /// (an empty conjunction matches everything).
    pub(crate) fn where_sql(&self) -> Option<String> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(self.conditions.join(" AND "))
        }
    }

    /// Bound parameters, in condition order
    pub(crate) fn params(&self) -> &[Value] {
        &self.params
    }
}

// ============================================================================
// TESTS
// ============================================================================
