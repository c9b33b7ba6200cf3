pub mod openai;

use serde::Deserialize;
use thiserror::Error;

use crate::crop::CropPair;

/// Evidence tags recorded when a classification degrades to "unknown".
pub const EVIDENCE_PARSE_ERROR: &str = "parse_error";
pub const EVIDENCE_TIMEOUT: &str = "timeout";
pub const EVIDENCE_UNAVAILABLE: &str = "oracle_unavailable";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle response was not parseable: {0}")]
    Malformed(String),
    #[error("oracle call timed out")]
    Timeout,
    #[error("oracle transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("oracle returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

impl OracleError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else {
            OracleError::Transport(err)
        }
    }

    /// Evidence string attached to the degraded record for this failure.
    pub fn evidence_tag(&self) -> &'static str {
        match self {
            OracleError::Malformed(_) => EVIDENCE_PARSE_ERROR,
            OracleError::Timeout => EVIDENCE_TIMEOUT,
            OracleError::Transport(_) | OracleError::Api { .. } => EVIDENCE_UNAVAILABLE,
        }
    }
}

/// One naming question: a numeral, its two crops, the closed candidate
/// set, and optional reference text (already truncated by the caller).
#[derive(Debug)]
pub struct NamingRequest<'a> {
    pub id: &'a str,
    pub crops: &'a CropPair,
    pub vocabulary: &'a [String],
    pub reference_text: Option<&'a str>,
}

/// Structured oracle answer. `id` is an echo used only for logging;
/// missing confidence or evidence default rather than failing the parse.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NamingResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyResponse {
    pub vocabulary: Vec<String>,
}

/// External decision service (vision + text). Injected into the builder
/// and orchestrator so tests can substitute a double.
pub trait Oracle: Sync {
    fn name_component(&self, request: &NamingRequest) -> Result<NamingResponse, OracleError>;
    fn extract_vocabulary(&self, reference_text: &str) -> Result<Vec<String>, OracleError>;
}

/// Parse a JSON payload out of a chat response, tolerating markdown code
/// fences around the object.
pub fn parse_oracle_json<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, OracleError> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|err| OracleError::Malformed(err.to_string()))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    inner.trim()
}
