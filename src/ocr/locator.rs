use anyhow::Result;
use image::{DynamicImage, GenericImageView};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::geometry::BBox;
use crate::core::model::NumeralHit;
use crate::ocr::{preprocess, OcrEngine};

/// One or more digits, optionally followed by a single letter suffix.
static NUMERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)\d+[a-z]?$").unwrap());

/// Glyph confusions tesseract produces on fine numeral markings. The
/// "36" entry is a frequent misread of the "3c" suffix form.
const CONFUSIONS: &[(&str, &str)] = &[
    ("S", "5"),
    ("s", "5"),
    ("O", "0"),
    ("o", "0"),
    ("I", "1"),
    ("l", "1"),
    ("L", "1"),
    ("36", "3c"),
];

/// Look a token up in the confusion table; unknown tokens pass through.
pub fn correct_confusion(token: &str) -> &str {
    CONFUSIONS
        .iter()
        .find(|(from, _)| *from == token)
        .map(|(_, to)| *to)
        .unwrap_or(token)
}

pub fn is_numeral_token(token: &str) -> bool {
    NUMERAL_RE.is_match(token)
}

/// Binarize the figure, OCR it, and reduce the tokens to one clamped
/// [`NumeralHit`] per identifier (largest box wins, first seen on ties).
pub fn locate_numerals(image: &DynamicImage, engine: &dyn OcrEngine) -> Result<Vec<NumeralHit>> {
    let (width, height) = (image.width(), image.height());
    let binary = preprocess::binarize_for_ocr(image);
    let tokens = engine.read_tokens(&binary)?;

    let mut hits: Vec<NumeralHit> = Vec::new();
    for token in tokens {
        let trimmed = token.text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let corrected = if trimmed.chars().count() <= 2 {
            correct_confusion(trimmed)
        } else {
            trimmed
        };
        if !is_numeral_token(corrected) {
            debug!(token = trimmed, "discarding non-numeral token");
            continue;
        }
        let id = corrected.to_lowercase();
        let bbox = BBox::clamp(
            token.left,
            token.top,
            token.left + token.width,
            token.top + token.height,
            width,
            height,
        );
        match hits.iter_mut().find(|h| h.id == id) {
            Some(existing) => {
                if bbox.area() > existing.bbox.area() {
                    existing.bbox = bbox;
                }
            }
            None => hits.push(NumeralHit::new(id, bbox)),
        }
    }

    debug!(hits = hits.len(), "numeral location finished");
    Ok(hits)
}
