use std::collections::HashMap;
use std::fs;

use anyhow::Result;
use image::{GrayImage, Luma};

use figref::core::model::{NOTE_NO_NUMERALS, UNKNOWN_NAME};
use figref::export::JsonExporter;
use figref::ocr::{OcrEngine, TextToken};
use figref::oracle::{
    NamingRequest, NamingResponse, Oracle, OracleError, EVIDENCE_PARSE_ERROR,
};
use figref::pipeline::{annotate_figure, PipelineConfig};
use figref::FigureResult;

struct FixedEngine(Vec<TextToken>);

impl OcrEngine for FixedEngine {
    fn read_tokens(&self, _image: &GrayImage) -> Result<Vec<TextToken>> {
        Ok(self.0.clone())
    }
}

enum Answer {
    Named(&'static str, f64),
    Malformed,
}

struct ScriptedOracle {
    answers: HashMap<&'static str, Answer>,
    vocabulary: Vec<String>,
}

impl Oracle for ScriptedOracle {
    fn name_component(&self, request: &NamingRequest) -> Result<NamingResponse, OracleError> {
        match self.answers.get(request.id) {
            Some(Answer::Named(name, confidence)) => Ok(NamingResponse {
                id: Some(request.id.to_string()),
                name: name.to_string(),
                confidence: *confidence,
                evidence: "scripted".to_string(),
            }),
            Some(Answer::Malformed) => Err(OracleError::Malformed("no json".to_string())),
            None => Ok(NamingResponse {
                id: Some(request.id.to_string()),
                name: UNKNOWN_NAME.to_string(),
                confidence: 0.0,
                evidence: "not scripted".to_string(),
            }),
        }
    }

    fn extract_vocabulary(&self, _reference_text: &str) -> Result<Vec<String>, OracleError> {
        Ok(self.vocabulary.clone())
    }
}

fn token(text: &str, left: i32, top: i32) -> TextToken {
    TextToken {
        text: text.to_string(),
        left,
        top,
        width: 20,
        height: 14,
    }
}

/// Writes a blank figure and optional reference text, returning the config.
fn setup(dir: &tempfile::TempDir, reference: Option<&str>) -> Result<PipelineConfig> {
    let image_path = dir.path().join("fig1.png");
    GrayImage::from_pixel(600, 400, Luma([255u8])).save(&image_path)?;

    let reference_text = match reference {
        Some(text) => {
            let path = dir.path().join("claims.txt");
            fs::write(&path, text)?;
            Some(path)
        }
        None => None,
    };

    Ok(PipelineConfig {
        image: image_path,
        reference_text,
        output: dir.path().join("components.json"),
        confidence_threshold: 0.5,
        workers: 2,
    })
}

#[test]
fn end_to_end_classifies_every_located_numeral() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = setup(&dir, Some("1. A device comprising a terminal on a substrate."))?;

    // 102 appears twice; the larger second box must win.
    let engine = FixedEngine(vec![
        token("103", 400, 250),
        token("101", 50, 40),
        TextToken {
            text: "102".to_string(),
            left: 200,
            top: 100,
            width: 8,
            height: 6,
        },
        token("102", 210, 120),
    ]);
    let oracle = ScriptedOracle {
        answers: HashMap::from([
            ("101", Answer::Named("terminal", 0.9)),
            ("102", Answer::Named("substrate", 0.8)),
            ("103", Answer::Named("terminal", 0.2)),
        ]),
        vocabulary: vec![
            "terminal".to_string(),
            "substrate".to_string(),
            "die pad".to_string(),
        ],
    };

    let result = annotate_figure(&config, &engine, &oracle)?;

    assert_eq!(result.figure_id, "fig1.png");
    assert_eq!(result.components.len(), 3);
    let ids: Vec<&str> = result.components.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "103"]);
    assert!(result.components.iter().all(|r| r.bbox.area() > 0));
    assert!(result.vocab_used.contains(&"terminal".to_string()));
    assert!(result.note.is_none());

    // The duplicate 102 resolved to the larger box.
    let rec_102 = &result.components[1];
    assert_eq!(rec_102.bbox.width(), 20);

    // 0.2 < 0.5 threshold: gated to unknown despite the proposed name.
    let rec_103 = &result.components[2];
    assert_eq!(rec_103.name, UNKNOWN_NAME);
    assert_eq!(rec_103.confidence, 0.2);

    // Exported document round-trips.
    JsonExporter::new(config.output.clone()).export(&result)?;
    let written: FigureResult = serde_json::from_str(&fs::read_to_string(&config.output)?)?;
    assert_eq!(written.components.len(), 3);
    Ok(())
}

#[test]
fn zero_detections_short_circuit_with_note() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = setup(&dir, None)?;

    let engine = FixedEngine(vec![token("housing", 50, 40), token("--", 80, 90)]);
    let oracle = ScriptedOracle {
        answers: HashMap::new(),
        vocabulary: Vec::new(),
    };

    let result = annotate_figure(&config, &engine, &oracle)?;

    assert!(result.components.is_empty());
    assert_eq!(result.note.as_deref(), Some(NOTE_NO_NUMERALS));
    // No reference text: the domain-default vocabulary is still reported.
    assert!(!result.vocab_used.is_empty());
    Ok(())
}

#[test]
fn one_bad_classification_does_not_abort_the_others() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = setup(&dir, Some("1. A package comprising a die pad."))?;

    let engine = FixedEngine(vec![token("104", 100, 100), token("105", 300, 200)]);
    let oracle = ScriptedOracle {
        answers: HashMap::from([
            ("104", Answer::Malformed),
            ("105", Answer::Named("die pad", 0.85)),
        ]),
        vocabulary: vec!["die pad".to_string()],
    };

    let result = annotate_figure(&config, &engine, &oracle)?;

    assert_eq!(result.components.len(), 2);
    let rec_104 = &result.components[0];
    assert_eq!(rec_104.id, "104");
    assert_eq!(rec_104.name, UNKNOWN_NAME);
    assert_eq!(rec_104.confidence, 0.0);
    assert_eq!(rec_104.evidence, EVIDENCE_PARSE_ERROR);

    let rec_105 = &result.components[1];
    assert_eq!(rec_105.id, "105");
    assert_eq!(rec_105.name, "die pad");
    assert_eq!(rec_105.confidence, 0.85);
    Ok(())
}

#[test]
fn records_are_ordered_by_numeric_id_then_suffix() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = setup(&dir, None)?;

    let engine = FixedEngine(vec![
        token("10", 10, 10),
        token("3c", 60, 60),
        token("2", 110, 110),
        token("3", 160, 160),
    ]);
    let oracle = ScriptedOracle {
        answers: HashMap::new(),
        vocabulary: Vec::new(),
    };

    let result = annotate_figure(&config, &engine, &oracle)?;
    let ids: Vec<&str> = result.components.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3", "3c", "10"]);
    Ok(())
}
