use tracing::{info, warn};

use crate::oracle::Oracle;

/// Hard cap on candidate set size; a wider set degrades naming accuracy.
pub const MAX_VOCAB_SIZE: usize = 60;
/// Accepted phrase length range in characters.
pub const MAX_PHRASE_LEN: usize = 64;

/// Bounded, ordered, lowercase candidate set of component names.
/// Immutable after construction and shared read-only by every
/// per-numeral classification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    phrases: Vec<String>,
}

impl Vocabulary {
    /// Normalize raw oracle output: trim, lowercase, keep phrases of
    /// [1, 64] characters, dedupe, sort, cap at [`MAX_VOCAB_SIZE`].
    pub fn from_raw(raw: Vec<String>) -> Self {
        let mut phrases: Vec<String> = Vec::new();
        for phrase in raw {
            let cleaned = phrase.trim().to_lowercase();
            let len = cleaned.chars().count();
            if len == 0 || len > MAX_PHRASE_LEN {
                continue;
            }
            if !phrases.contains(&cleaned) {
                phrases.push(cleaned);
            }
        }
        phrases.sort();
        phrases.truncate(MAX_VOCAB_SIZE);
        Self { phrases }
    }

    /// Domain-default list used when no reference text is supplied.
    pub fn domain_default() -> Self {
        Self {
            phrases: [
                "semiconductor component",
                "main body",
                "terminal",
                "signal terminal",
                "ground terminal",
                "unused terminal",
                "circuit board",
                "wiring pattern",
                "first trace",
                "second trace",
                "third land",
                "first land",
                "second land",
                "connecting trace",
                "connecting member",
                "insulating film",
                "resist film",
                "silk film",
                "metallic body",
                "thermal via",
                "heat-radiating member",
            ]
            .map(String::from)
            .to_vec(),
        }
    }

    /// Smaller list used when the extraction oracle fails or returns an
    /// unparseable response.
    pub fn minimal_fallback() -> Self {
        Self {
            phrases: [
                "terminal",
                "signal terminal",
                "ground terminal",
                "unused terminal",
                "wiring pattern",
                "first land",
                "second land",
                "third land",
                "trace",
                "die pad",
                "insulating film",
                "thermal via",
                "heat-radiating member",
                "main body",
                "circuit board",
            ]
            .map(String::from)
            .to_vec(),
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn contains(&self, name: &str) -> bool {
        self.phrases.iter().any(|p| p == name)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// Build the run's vocabulary. Unavailability of the extraction oracle
/// never aborts the run; it falls back to a built-in list instead.
pub fn build_vocabulary(oracle: &dyn Oracle, reference_text: &str) -> Vocabulary {
    if reference_text.trim().is_empty() {
        info!("no reference text supplied, using domain-default vocabulary");
        return Vocabulary::domain_default();
    }
    match oracle.extract_vocabulary(reference_text) {
        Ok(raw) => {
            let vocabulary = Vocabulary::from_raw(raw);
            info!(phrases = vocabulary.len(), "vocabulary extracted from reference text");
            vocabulary
        }
        Err(err) => {
            warn!(error = %err, "vocabulary extraction failed, using minimal fallback");
            Vocabulary::minimal_fallback()
        }
    }
}
