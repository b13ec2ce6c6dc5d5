use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE: f64 = 0.25;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;

/// Per-call options for a generative prompt. Unset fields take the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptOptions {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

/// Body of the `:generate` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: PromptText,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptText {
    pub text: String,
}

impl GenerateRequest {
    pub fn new(prompt: &str, options: PromptOptions) -> Self {
        Self {
            prompt: PromptText {
                text: prompt.to_string(),
            },
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_output_tokens: options.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        }
    }
}
