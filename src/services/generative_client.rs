//! Generative-text client.
//!
//! Sends a single prompt to a `:generate` endpoint and flattens whatever
//! envelope comes back into plain text. Without a configured key the call is
//! skipped and `None` is returned so callers can fall back to canned text.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::errors::GenerativeError;
use crate::types::generative::{GenerateRequest, PromptOptions};
use crate::types::settings::GenerativeSettings;

type ShapeMatcher = fn(&Value) -> Option<String>;

/// Known response envelopes, tried in order.
const RESPONSE_SHAPES: &[(&str, ShapeMatcher)] = &[
    ("candidates[0].output", candidate_output),
    ("candidates[0].content", candidate_content),
    ("output[].content", output_fragments),
    ("text", top_level_text),
];

/// Client for the generative-text API.
#[derive(Debug, Clone)]
pub struct GenerativeTextClient {
    client: Client,
    settings: GenerativeSettings,
}

impl GenerativeTextClient {
    pub fn new(settings: GenerativeSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: GenerativeSettings) -> Self {
        Self { client, settings }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// `{base_url}/{model}:generate`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}:generate",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model.trim_start_matches('/')
        )
    }

    fn api_key(&self) -> Option<&str> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }

    /// Sends `prompt` and returns the normalized response text.
    ///
    /// Returns `Ok(None)` without any request when no API key is configured.
    pub async fn send_prompt(
        &self,
        prompt: &str,
        options: PromptOptions,
    ) -> Result<Option<String>, GenerativeError> {
        let Some(key) = self.api_key() else {
            warn!("generative API key is not set, skipping prompt");
            return Ok(None);
        };
        if options.max_output_tokens == Some(0) {
            return Err(GenerativeError::InvalidOptions(
                "max_output_tokens must be positive".to_string(),
            ));
        }

        let body = GenerateRequest::new(prompt, options);
        debug!(
            model = %self.settings.model,
            temperature = body.temperature,
            max_output_tokens = body.max_output_tokens,
            "sending generative prompt"
        );
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerativeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let data: Value =
            serde_json::from_str(&text).map_err(|e| GenerativeError::Decode(e.to_string()))?;
        Ok(Some(normalize_response(&data)))
    }
}

/// Flattens a generative response into text, falling back to the raw JSON.
pub fn normalize_response(data: &Value) -> String {
    RESPONSE_SHAPES
        .iter()
        .find_map(|(shape, matcher)| {
            let text = matcher(data)?;
            debug!(shape, "matched generative response shape");
            Some(text)
        })
        .unwrap_or_else(|| data.to_string())
}

fn first_candidate(data: &Value) -> Option<&Value> {
    data.get("candidates")?.as_array()?.first()
}

fn fragment_text(fragments: &[Value]) -> String {
    fragments
        .iter()
        .map(|f| f.get("text").and_then(Value::as_str).unwrap_or_default())
        .collect()
}

fn candidate_output(data: &Value) -> Option<String> {
    first_candidate(data)?
        .get("output")?
        .as_str()
        .map(str::to_string)
}

fn candidate_content(data: &Value) -> Option<String> {
    let fragments = first_candidate(data)?.get("content")?.as_array()?;
    Some(fragment_text(fragments))
}

fn output_fragments(data: &Value) -> Option<String> {
    let items = data.get("output")?.as_array()?;
    let lines: Vec<String> = items
        .iter()
        .map(|item| {
            item.get("content")
                .and_then(Value::as_array)
                .map(|fragments| fragment_text(fragments))
                .unwrap_or_default()
        })
        .collect();
    Some(lines.join("\n"))
}

fn top_level_text(data: &Value) -> Option<String> {
    data.get("text")?.as_str().map(str::to_string)
}
