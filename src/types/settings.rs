use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_GENERATIVE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta2";
pub const DEFAULT_GENERATIVE_MODEL: &str = "models/text-bison-001";

/// Top-level application settings container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub generative: GenerativeSettings,
}

/// Materials API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Generative-text API settings. Without an `api_key` prompts are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for GenerativeSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GENERATIVE_BASE_URL.to_string(),
            model: DEFAULT_GENERATIVE_MODEL.to_string(),
            api_key: None,
        }
    }
}
