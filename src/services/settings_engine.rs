// learnshelf Settings Engine
// Loads application settings from an optional JSON file, then overlays
// environment variables. Individual values can be updated by dotted key.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_BASE_URL: &str = "LEARNSHELF_API_BASE_URL";
/// Environment variable overriding `generative.base_url`.
pub const ENV_GENERATIVE_BASE_URL: &str = "GEMINI_BASE_URL";
/// Environment variable overriding `generative.model`.
pub const ENV_GENERATIVE_MODEL: &str = "GEMINI_MODEL";
/// Environment variable holding `generative.api_key`.
pub const ENV_GENERATIVE_API_KEY: &str = "GEMINI_API_KEY";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> Option<&str>;
}

/// Settings engine backed by an optional JSON file and the process environment.
pub struct SettingsEngine {
    config_path: Option<String>,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// Without a config path, settings come from defaults and the environment only.
    pub fn new(config_path: Option<String>) -> Self {
        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    /// Loads the config file, then overlays values returned by `lookup`.
    ///
    /// `lookup` stands in for `std::env::var`; empty values are ignored.
    pub fn load_with_env<F>(&mut self, lookup: F) -> Result<AppSettings, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = self.read_file()?;
        let env = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = env(ENV_API_BASE_URL) {
            settings.api.base_url = url;
        }
        if let Some(url) = env(ENV_GENERATIVE_BASE_URL) {
            settings.generative.base_url = url;
        }
        if let Some(model) = env(ENV_GENERATIVE_MODEL) {
            settings.generative.model = model;
        }
        if let Some(key) = env(ENV_GENERATIVE_API_KEY) {
            settings.generative.api_key = Some(key);
        }

        debug!(
            api_base_url = %settings.api.base_url,
            generative_model = %settings.generative.model,
            generative_key_set = settings.generative.api_key.is_some(),
            "settings loaded"
        );
        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Reads the config file. A missing file yields defaults.
    fn read_file(&self) -> Result<AppSettings, SettingsError> {
        let Some(config_path) = &self.config_path else {
            return Ok(AppSettings::default());
        };
        let path = Path::new(config_path);
        if !path.exists() {
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the config file and the process environment.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist. Without a config path
    /// this is a no-op.
    fn save(&self) -> Result<(), SettingsError> {
        let Some(config_path) = &self.config_path else {
            return Ok(());
        };
        let path = Path::new(config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Updates an individual setting by dot-notation key path, then saves.
    ///
    /// # Examples
    /// - `"api.base_url"` → updates `settings.api.base_url`
    /// - `"generative.model"` → updates `settings.generative.model`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        {
            let (last, parents) = parts
                .split_last()
                .ok_or_else(|| SettingsError::InvalidKey("Key cannot be empty".to_string()))?;
            let mut current = &mut json_value;
            for part in parents {
                current = current.get_mut(*part).ok_or_else(|| {
                    SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))
                })?;
            }
            match current {
                serde_json::Value::Object(map) if map.contains_key(*last) => {
                    map.insert(last.to_string(), value);
                }
                serde_json::Value::Object(_) => {
                    return Err(SettingsError::InvalidKey(format!(
                        "Key '{}' not found in settings",
                        key
                    )));
                }
                _ => {
                    return Err(SettingsError::InvalidKey(format!(
                        "Cannot navigate to key '{}': intermediate value is not an object",
                        key
                    )));
                }
            }
        }

        // Round-trip through AppSettings to validate the new value
        let new_settings: AppSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.settings = new_settings;
        self.save()?;
        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }
}
