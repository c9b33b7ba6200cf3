use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::oracle::{
    parse_oracle_json, NamingRequest, NamingResponse, Oracle, OracleError, VocabularyResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const NAMING_SYSTEM: &str = "You are a precise assistant for patent figures. Return JSON only.";

const VOCAB_SYSTEM: &str = "You extract short, canonical, de-duplicated technical noun phrases \
from patent claims. Return strict JSON with a single key 'vocabulary' listing 5-40 phrases. \
Phrases should be 1-4 words (e.g., 'signal terminal', 'die pad', 'wiring pattern'). \
Avoid verbs, whole sentences, and pronouns. Use lower case.";

/// Chat-completions oracle. One client instance serves both the vision
/// (naming) and text (vocabulary) calls; the request timeout applies to
/// every outbound call.
pub struct OpenAiOracle {
    client: Client,
    base_url: String,
    api_key: String,
    vision_model: String,
    text_model: String,
}

impl OpenAiOracle {
    pub fn new(
        api_key: String,
        vision_model: String,
        text_model: String,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OracleError::from_reqwest)?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            vision_model,
            text_model,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn chat(&self, model: &str, messages: Value) -> Result<String, OracleError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": model,
                "messages": messages,
                "temperature": 0.0,
            }))
            .send()
            .map_err(OracleError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(OracleError::from_reqwest)?;
        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|err| OracleError::Malformed(err.to_string()))?;
        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| OracleError::Malformed("response has no message content".to_string()))?;
        Ok(content.trim().to_string())
    }
}

impl Oracle for OpenAiOracle {
    fn name_component(&self, request: &NamingRequest) -> Result<NamingResponse, OracleError> {
        let instruction = format!(
            "Select the best matching component name for the label shown in 'id' from the given \
             vocabulary. Prefer exact, short technical noun phrases. If none fits, return \
             'unknown'. Return JSON: {{\"id\":\"{id}\",\"name\":\"<candidate or unknown>\",\
             \"confidence\":0..1,\"evidence\":\"<short reason>\"}}",
            id = request.id
        );

        let vocabulary =
            serde_json::to_string(request.vocabulary).unwrap_or_else(|_| "[]".to_string());
        let mut blocks = Vec::new();
        if let Some(text) = request.reference_text {
            blocks.push(json!({"type": "text", "text": format!("Claims context:\n{text}")}));
        }
        blocks.push(json!({"type": "text", "text": format!("id: {}", request.id)}));
        blocks.push(json!({"type": "text", "text": format!("Vocabulary: {vocabulary}")}));
        blocks.push(json!({
            "type": "image_url",
            "image_url": {"url": request.crops.tight.data_url(), "detail": "high"},
        }));
        blocks.push(json!({
            "type": "image_url",
            "image_url": {"url": request.crops.wide.data_url(), "detail": "high"},
        }));
        blocks.push(json!({"type": "text", "text": instruction}));

        debug!(id = request.id, model = %self.vision_model, "asking naming oracle");
        let content = self.chat(
            &self.vision_model,
            json!([
                {"role": "system", "content": NAMING_SYSTEM},
                {"role": "user", "content": blocks},
            ]),
        )?;
        parse_oracle_json(&content)
    }

    fn extract_vocabulary(&self, reference_text: &str) -> Result<Vec<String>, OracleError> {
        let task = "Task: Extract candidate component names as short noun phrases. Return JSON \
                    only like: {\"vocabulary\": [\"signal terminal\", \"die pad\", ...]}";
        debug!(model = %self.text_model, "asking vocabulary oracle");
        let content = self.chat(
            &self.text_model,
            json!([
                {"role": "system", "content": VOCAB_SYSTEM},
                {"role": "user", "content": [
                    {"type": "text", "text": format!("Claims:\n{reference_text}")},
                    {"type": "text", "text": task},
                ]},
            ]),
        )?;
        let parsed: VocabularyResponse = parse_oracle_json(&content)?;
        Ok(parsed.vocabulary)
    }
}
