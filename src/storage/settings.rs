//! Settings storage
//!
//! Manages persistence of the chat configuration.

use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError};
use crate::types::{ModelPreset, UNLIMITED_TOKENS};

/// Storage key of the settings document
pub const SETTINGS_KEY: &str = "settings";

/// Default chat endpoint (LM Studio's local server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234";

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Endpoint root, `/v1/chat/completions` is appended
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// System prompt for direct chat and post-enhancement generation
    pub system_prompt: String,
    /// Temperature parameter for text generation (0.0 - 2.0)
    pub temperature: f32,
    /// Maximum number of tokens to generate, `-1` for unlimited
    pub max_tokens: i32,
    /// Passed through to the endpoint, the response is still read whole
    #[serde(default)]
    pub stream: bool,
    /// Preset last applied, if it still exists
    #[serde(default)]
    pub active_preset: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: "local-model".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            temperature: 0.7,
            max_tokens: UNLIMITED_TOKENS,
            stream: false,
            active_preset: None,
        }
    }
}

impl AppSettings {
    /// Validate settings values
    ///
    /// Ensures all parameters are within acceptable ranges.
    pub fn validate(&mut self) {
        if self.temperature.is_nan() {
            self.temperature = 0.7;
        }
        self.temperature = self.temperature.clamp(0.0, 2.0);

        if self.max_tokens < 1 && self.max_tokens != UNLIMITED_TOKENS {
            self.max_tokens = UNLIMITED_TOKENS;
        }

        let trimmed = self.base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            default_base_url()
        } else {
            trimmed.to_string()
        };

        if self.model.trim().is_empty() {
            self.model = "local-model".to_string();
        }
    }

    /// Copy a preset's configuration in and mark it active
    pub fn apply_preset(&mut self, preset: &ModelPreset) {
        self.model = preset.model.clone();
        self.system_prompt = preset.system_prompt.clone();
        self.temperature = preset.temperature;
        self.max_tokens = preset.max_tokens;
        self.active_preset = Some(preset.id.clone());
        self.validate();
    }

    /// Snapshot the current configuration as an unsaved preset
    pub fn to_preset(&self, name: &str) -> ModelPreset {
        ModelPreset::new(
            name.trim(),
            self.model.clone(),
            self.system_prompt.clone(),
            self.temperature,
            self.max_tokens,
        )
    }
}

/// Load settings
///
/// Returns default settings if nothing is stored or the data is corrupted
pub fn load_settings(store: &dyn KeyValueStore) -> AppSettings {
    match load_settings_internal(store) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            AppSettings::default()
        }
    }
}

/// Internal settings loading with error propagation
fn load_settings_internal(store: &dyn KeyValueStore) -> Result<AppSettings, StorageError> {
    let Some(json) = store.read(SETTINGS_KEY)? else {
        tracing::info!("Settings not found, using defaults");
        return Ok(AppSettings::default());
    };

    let mut settings: AppSettings = serde_json::from_str(&json)?;

    // Validate loaded settings
    settings.validate();

    tracing::debug!("Loaded settings");
    Ok(settings)
}

/// Save settings
pub fn save_settings(store: &dyn KeyValueStore, settings: &AppSettings) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(settings)?;
    store.write(SETTINGS_KEY, &json)?;

    tracing::debug!("Saved settings");
    Ok(())
}
