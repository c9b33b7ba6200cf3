use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

/// Sentinel name for numerals that could not be resolved to a vocabulary
/// member, whether by the oracle itself or by the confidence gate.
pub const UNKNOWN_NAME: &str = "unknown";

/// Note attached to a result when the locator produced zero hits.
pub const NOTE_NO_NUMERALS: &str = "no_numerals_found";

/// A detected reference-numeral token plus its pixel bounding box.
/// Identifiers are lowercase digits with an optional trailing letter
/// suffix ("12", "3c") and are unique within one locate pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumeralHit {
    pub id: String,
    pub bbox: BBox,
}

impl NumeralHit {
    pub fn new(id: impl Into<String>, bbox: BBox) -> Self {
        Self {
            id: id.into(),
            bbox,
        }
    }
}

/// Final classification for one numeral. `name` is either a vocabulary
/// member or [`UNKNOWN_NAME`]; `confidence` is in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentRecord {
    pub id: String,
    pub name: String,
    pub confidence: f64,
    pub evidence: String,
    pub bbox: BBox,
}

/// Terminal artifact of one pipeline run; written once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureResult {
    pub figure_id: String,
    pub components: Vec<ComponentRecord>,
    pub vocab_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Ordering key for numeral identifiers: numeric value first, then the
/// suffix letter, so "2" < "10" and "3" < "3c" < "4".
pub fn numeral_sort_key(id: &str) -> (u64, String) {
    let digits: String = id.chars().take_while(|c| c.is_ascii_digit()).collect();
    let suffix = id[digits.len()..].to_string();
    (digits.parse::<u64>().unwrap_or(u64::MAX), suffix)
}
