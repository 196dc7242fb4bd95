//! Filter Compiler
//!
//! Turns raw, untrusted request parameters into a validated, normalized
//! filter specification. Every malformed field degrades to a safe default;
//! a search must never fail because of bad query-string input.

use serde::{Deserialize, Serialize};

/// Default page size when the parameter is absent or unparsable
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Upper bound for the page size
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// RAW PARAMETERS
// ============================================================================

/// Raw request parameters as collected by the presentation layer.
///
/// Everything is an optional string (or list of strings for the repeatable
/// restriction parameter) because query strings are untrusted. Compile into
/// a [`SearchFilter`] before handing anything downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchParams {
    /// Free-text query
    pub q: Option<String>,
    /// Photographer/credit filter
    pub credit: Option<String>,
    /// Capture-date filter, expected as `YYYY-MM-DD`
    pub date: Option<String>,
    /// Usage-restriction filter (repeatable)
    #[serde(default)]
    pub restriction: Vec<String>,
    /// 1-based page number
    pub page: Option<String>,
    /// Page size
    pub page_size: Option<String>,
    /// Sort direction token (`asc` or `desc`)
    pub sort: Option<String>,
}

// ============================================================================
// NORMALIZED FILTER
// ============================================================================

/// Sort direction by capture date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first (default)
    #[default]
    Descending,
}

impl SortOrder {
    /// Parse the request token. Only the literal `asc` selects ascending;
    /// anything else (including absence) yields the descending default.
    pub fn parse_token(token: Option<&str>) -> Self {
        match token {
            Some("asc") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    /// SQL direction keyword
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    /// Request-token representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated, normalized filter specification.
///
/// Produced once at the boundary; all downstream components operate on this
/// type, never on raw strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Trimmed free-text query, absent if empty after trim
    pub query: Option<String>,
    /// Trimmed credit filter
    pub credit: Option<String>,
    /// Parsed capture-date filter; unparsable input is silently dropped
    pub date: Option<chrono::NaiveDate>,
    /// Trimmed, non-empty restriction values (duplicates allowed, order kept)
    pub restrictions: Vec<String>,
    /// 1-based page number, clamped to a minimum of 1
    pub page: u32,
    /// Page size, clamped to `[1, MAX_PAGE_SIZE]`
    pub page_size: u32,
    /// Sort direction by capture date
    pub sort: SortOrder,
}

impl SearchFilter {
    /// Compile raw parameters into a normalized filter.
    ///
    /// This never fails: malformed pagination, an unparsable date or an
    /// empty query all degrade to their defaults (InputDegradation policy).
    pub fn compile(raw: &RawSearchParams) -> Self {
        let query = raw
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let credit = raw
            .credit
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        // Unparsable dates are dropped, not rejected
        let date = raw
            .date
            .as_deref()
            .map(str::trim)
            .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        let restrictions: Vec<String> = raw
            .restriction
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let page = raw
            .page
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            // Clamp before the cast so out-of-range input cannot wrap to 0
            .map(|p| p.clamp(1, u32::MAX as i64) as u32)
            .unwrap_or(1);

        let page_size = raw
            .page_size
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(|p| p.clamp(1, MAX_PAGE_SIZE as i64) as u32)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let sort = SortOrder::parse_token(raw.sort.as_deref().map(str::trim));

        Self {
            query,
            credit,
            date,
            restrictions,
            page,
            page_size,
            sort,
        }
    }

    /// Pagination offset: `(page - 1) * page_size`.
    ///
    /// Computed in `u64`: the product exceeds `u32` for large valid pages.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.page_size as u64
    }
}

// ============================================================================
// TESTS
// ============================================================================
