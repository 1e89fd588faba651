//! Model preset types
//!
//! A preset is a named snapshot of the chat configuration.

use serde::{Deserialize, Serialize};

use crate::storage::Record;

/// `max_tokens` sentinel meaning "no limit"
pub const UNLIMITED_TOKENS: i32 = -1;

/// Saved chat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPreset {
    pub id: String,
    /// User-facing label
    pub name: String,
    /// Target model identifier
    pub model: String,
    pub system_prompt: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Maximum tokens to generate, `-1` for unlimited
    pub max_tokens: i32,
}

impl ModelPreset {
    /// Create a preset that has not been stored yet (empty id)
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        temperature: f32,
        max_tokens: i32,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_tokens == UNLIMITED_TOKENS
    }
}

impl Record for ModelPreset {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_json_shape() {
        let mut preset = ModelPreset::new("Fast", "qwen2.5-7b", "Be brief.", 0.3, UNLIMITED_TOKENS);
        preset.id = "p1".to_string();

        let json = serde_json::to_value(&preset).unwrap();
        assert_eq!(json["systemPrompt"], "Be brief.");
        assert_eq!(json["maxTokens"], -1);
        assert!(json.get("max_tokens").is_none());
        assert!(preset.is_unlimited());
    }
}
