//! Caption Extraction
//!
//! Derives structured fields from free-text archive captions. Archive
//! captions conventionally read
//!
//! ```text
//! Jane Doe, Max Mustermann, Berlin, 12.05.1987 portrait archive keywords
//! ```
//!
//! so the first `d.m.yyyy` date token anchors the caption: everything
//! before it is names and (as the last comma part) a location; everything
//! after is keyword noise. Restriction markers like
//! `PUBLICATIONxINxGERxSUIxAUTxONLY` can appear anywhere in the text.
//!
//! Extraction is a pure function of the caption text: no prior derived
//! state is consulted, which is what makes reprocessing safe.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Restriction token: `PUBLICATIONxINx` followed by one or more 3-letter
/// country segments and `ONLY`, bounded by non-word characters or string
/// edges. The whole (trimmed) match is the restriction value.
static RESTRICTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Z0-9_])PUBLICATIONxINx(?:[A-Z]{3}x)+ONLY(?:[^A-Z0-9_]|$)")
        .expect("restriction pattern is valid")
});

/// Date anchor: `d.m.yyyy` with 1-2 digit day/month and 4-digit year
static DATE_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}\.\d{1,2}\.\d{4}").expect("date pattern is valid"));

/// Standalone " and " connector between names, any casing
static AND_CONNECTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("connector pattern is valid"));

// ============================================================================
// EXTRACTED FACTS
// ============================================================================

/// Structured fields derived from one caption
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionFacts {
    /// Usage-restriction token, if present
    pub restriction: Option<String>,
    /// Deduplicated people names
    pub people: Vec<String>,
    /// Extracted location (0 or 1 element under the current policy)
    pub locations: Vec<String>,
}

/// Extract structured fields from a caption.
///
/// An empty caption yields empty facts, never an error.
pub fn extract(caption: &str) -> CaptionFacts {
    let restriction = extract_restriction(caption);

    // A caption with neither a comma nor a date anchor carries no
    // name/location structure at all; treat it as keyword-only text
    // instead of reading the whole thing as one "name".
    let has_anchor = DATE_ANCHOR_RE.is_match(caption) || caption.contains(',');
    let (people, location) = if has_anchor {
        split_names_location(pre_date_segment(caption))
    } else {
        (Vec::new(), None)
    };

    CaptionFacts {
        restriction,
        people,
        locations: location.into_iter().collect(),
    }
}

/// Find the restriction marker. The match includes the bounding character,
/// so trim before returning (a leading space disappears, other separators
/// are kept verbatim, matching the archive's established behavior).
fn extract_restriction(caption: &str) -> Option<String> {
    RESTRICTION_RE
        .find(caption)
        .map(|m| m.as_str().trim().to_string())
}

/// Everything before the first date token, or the whole caption when no
/// date is present.
fn pre_date_segment(caption: &str) -> &str {
    DATE_ANCHOR_RE
        .find(caption)
        .map(|m| &caption[..m.start()])
        .unwrap_or(caption)
}

/// Split the pre-date segment into people names and an optional location.
///
/// Comma parts are trimmed and empties discarded. With two or more parts
/// the last one is the location and the rest form the names segment; with
/// exactly one part it is all names. Within the names segment, standalone
/// " and " connectors become commas before the final split; names are
/// deduplicated and any name equal to the location (case-insensitive) is
/// dropped, guarding against the location token being captured as a
/// trailing "name".
fn split_names_location(segment: &str) -> (Vec<String>, Option<String>) {
    let parts: Vec<&str> = segment
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        return (Vec::new(), None);
    }

    let (names_segment, location) = if parts.len() >= 2 {
        (
            parts[..parts.len() - 1].join(", "),
            Some(parts[parts.len() - 1].to_string()),
        )
    } else {
        (parts[0].to_string(), None)
    };

    let normalized = AND_CONNECTOR_RE.replace_all(&names_segment, ", ");

    let mut people: Vec<String> = Vec::new();
    for part in normalized.split(',') {
        let name = part.trim();
        if name.is_empty() {
            continue;
        }
        if let Some(loc) = &location {
            if name.eq_ignore_ascii_case(loc) {
                continue;
            }
        }
        if !people.iter().any(|seen| seen == name) {
            people.push(name.to_string());
        }
    }

    (people, location)
}

// ============================================================================
// TESTS
// ============================================================================
