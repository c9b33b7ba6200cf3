use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::core::model::{
    numeral_sort_key, ComponentRecord, FigureResult, NumeralHit, NOTE_NO_NUMERALS, UNKNOWN_NAME,
};
use crate::crop;
use crate::ocr::{locator, OcrEngine};
use crate::oracle::{NamingRequest, Oracle};
use crate::vocab::{build_vocabulary, Vocabulary};

/// Reference text is truncated to this many characters before being
/// attached to naming requests, to respect oracle input limits.
pub const MAX_REFERENCE_CHARS: usize = 6000;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub image: PathBuf,
    pub reference_text: Option<PathBuf>,
    pub output: PathBuf,
    pub confidence_threshold: f64,
    pub workers: usize,
}

/// Run the whole pipeline: vocabulary, numeral location, per-numeral
/// classification, confidence gating, and result assembly.
///
/// Only missing or unreadable inputs are fatal. Every per-numeral
/// failure degrades to an "unknown" record for that numeral alone.
pub fn annotate_figure(
    config: &PipelineConfig,
    ocr: &dyn OcrEngine,
    oracle: &dyn Oracle,
) -> Result<FigureResult> {
    let reference_text = match &config.reference_text {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read reference text: {}", path.display()))?,
        None => String::new(),
    };
    let image = image::open(&config.image)
        .with_context(|| format!("failed to open figure image: {}", config.image.display()))?;
    let figure_id = config
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.image.display().to_string());

    let vocabulary = build_vocabulary(oracle, &reference_text);

    let hits = locator::locate_numerals(&image, ocr)?;
    if hits.is_empty() {
        info!(figure = %figure_id, "no numerals located, short-circuiting");
        return Ok(FigureResult {
            figure_id,
            components: Vec::new(),
            vocab_used: vocabulary.phrases().to_vec(),
            note: Some(NOTE_NO_NUMERALS.to_string()),
        });
    }
    info!(figure = %figure_id, numerals = hits.len(), "classifying numerals");

    let truncated = truncate_chars(&reference_text, MAX_REFERENCE_CHARS);
    let reference = (!truncated.trim().is_empty()).then_some(truncated);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .context("failed to build classification worker pool")?;
    let mut components: Vec<ComponentRecord> = pool.install(|| {
        hits.par_iter()
            .map(|hit| {
                classify_hit(
                    &image,
                    hit,
                    &vocabulary,
                    reference,
                    oracle,
                    config.confidence_threshold,
                )
            })
            .collect()
    });
    components.sort_by_key(|record| numeral_sort_key(&record.id));

    Ok(FigureResult {
        figure_id,
        components,
        vocab_used: vocabulary.phrases().to_vec(),
        note: None,
    })
}

/// Classify one numeral. Infallible by contract: every failure mode maps
/// to a degraded record so sibling numerals are unaffected.
fn classify_hit(
    image: &DynamicImage,
    hit: &NumeralHit,
    vocabulary: &Vocabulary,
    reference_text: Option<&str>,
    oracle: &dyn Oracle,
    threshold: f64,
) -> ComponentRecord {
    let crops = match crop::make_crops(image, &hit.bbox) {
        Ok(crops) => crops,
        Err(err) => {
            warn!(id = %hit.id, error = %err, "crop generation failed");
            return degraded_record(hit, "crop_error");
        }
    };

    let request = NamingRequest {
        id: &hit.id,
        crops: &crops,
        vocabulary: vocabulary.phrases(),
        reference_text,
    };
    match oracle.name_component(&request) {
        Ok(response) => {
            let confidence = response.confidence.clamp(0.0, 1.0);
            let mut name = response.name.trim().to_lowercase();
            if name != UNKNOWN_NAME && !vocabulary.contains(&name) {
                warn!(id = %hit.id, name = %name, "oracle chose a name outside the vocabulary");
                name = UNKNOWN_NAME.to_string();
            }
            // The gate always wins over the oracle's own selection.
            if confidence < threshold {
                name = UNKNOWN_NAME.to_string();
            }
            ComponentRecord {
                id: hit.id.clone(),
                name,
                confidence,
                evidence: response.evidence,
                bbox: hit.bbox,
            }
        }
        Err(err) => {
            warn!(id = %hit.id, error = %err, "classification degraded to unknown");
            degraded_record(hit, err.evidence_tag())
        }
    }
}

fn degraded_record(hit: &NumeralHit, evidence: &str) -> ComponentRecord {
    ComponentRecord {
        id: hit.id.clone(),
        name: UNKNOWN_NAME.to_string(),
        confidence: 0.0,
        evidence: evidence.to_string(),
        bbox: hit.bbox,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
