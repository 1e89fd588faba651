//! Prompt enhancement
//!
//! The fixed meta-prompt and the requests built around it.

use crate::chat::{ChatClient, ChatError, ChatRequest};
use crate::storage::settings::AppSettings;
use crate::types::{Category, EnhancedPromptRecord};

/// Instruction sent as the system prompt of every enhancement request
pub const ENHANCEMENT_SYSTEM_PROMPT: &str = r#"You are an expert prompt engineer. The user will give you a short, basic prompt intended for a large language model. Rewrite it into a detailed, effective prompt.

Your rewrite should:
1. State the goal and the expected outcome explicitly
2. Give the model a fitting role or perspective
3. Add the context, constraints and assumptions the basic prompt leaves implicit
4. Specify the desired format, structure and length of the answer
5. Keep the user's original intent; do not invent unrelated requirements

Reply with the enhanced prompt only. Do not answer the prompt, and do not add commentary before or after it."#;

/// A successful enhancement, ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct Enhancement {
    pub original: String,
    pub enhanced: String,
    pub system_prompt: String,
}

impl Enhancement {
    pub fn to_record(&self, category: Category) -> EnhancedPromptRecord {
        EnhancedPromptRecord::new(
            self.original.clone(),
            self.enhanced.clone(),
            self.system_prompt.clone(),
            category,
        )
    }
}

fn request_with(settings: &AppSettings, system_prompt: &str, user_prompt: &str) -> ChatRequest {
    ChatRequest {
        model: settings.model.clone(),
        system_prompt: system_prompt.to_string(),
        user_prompt: user_prompt.to_string(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        stream: settings.stream,
    }
}

/// Direct chat with the configured system prompt
pub fn direct_request(settings: &AppSettings, user_prompt: &str) -> ChatRequest {
    request_with(settings, &settings.system_prompt, user_prompt)
}

/// Ask the model to rewrite `basic`
pub fn enhancement_request(settings: &AppSettings, basic: &str) -> ChatRequest {
    request_with(settings, ENHANCEMENT_SYSTEM_PROMPT, basic.trim())
}

/// Run an enhanced prompt against the configured system prompt
pub fn generation_request(settings: &AppSettings, enhanced: &str) -> ChatRequest {
    direct_request(settings, enhanced)
}

/// Re-run a saved record with the instruction that originally produced it
pub fn replay_request(settings: &AppSettings, record: &EnhancedPromptRecord) -> ChatRequest {
    request_with(settings, &record.system_prompt, &record.original_prompt)
}

/// Send an enhancement request and keep what is needed to save it
pub async fn enhance(
    client: &ChatClient,
    settings: &AppSettings,
    basic: &str,
) -> Result<Enhancement, ChatError> {
    let request = enhancement_request(settings, basic);
    let enhanced = client.try_send(&settings.base_url, &request).await?;

    tracing::info!(
        "Enhanced prompt ({} -> {} chars)",
        request.user_prompt.len(),
        enhanced.len()
    );

    Ok(Enhancement {
        original: request.user_prompt,
        enhanced: enhanced.trim().to_string(),
        system_prompt: request.system_prompt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhancement_request_uses_meta_prompt() {
        let mut settings = AppSettings::default();
        settings.system_prompt = "You are a pirate.".to_string();

        let request = enhancement_request(&settings, "  write a haiku  ");
        assert_eq!(request.system_prompt, ENHANCEMENT_SYSTEM_PROMPT);
        assert_eq!(request.user_prompt, "write a haiku");
        assert_eq!(request.max_tokens, settings.max_tokens);
    }

    #[test]
    fn test_generation_request_uses_configured_system_prompt() {
        let mut settings = AppSettings::default();
        settings.system_prompt = "You are a pirate.".to_string();

        let request = generation_request(&settings, "Detailed prompt");
        assert_eq!(request.system_prompt, "You are a pirate.");
        assert_eq!(request.user_prompt, "Detailed prompt");
    }

    #[test]
    fn test_replay_request_uses_stored_instruction() {
        let record = EnhancedPromptRecord::new("basic", "enhanced", "Old instruction", Category::Writing);
        let request = replay_request(&AppSettings::default(), &record);

        assert_eq!(request.system_prompt, "Old instruction");
        assert_eq!(request.user_prompt, "basic");
    }

    #[test]
    fn test_enhancement_to_record() {
        let enhancement = Enhancement {
            original: "o".to_string(),
            enhanced: "e".to_string(),
            system_prompt: ENHANCEMENT_SYSTEM_PROMPT.to_string(),
        };
        let record = enhancement.to_record(Category::Coding);

        assert!(record.id.is_empty());
        assert!(!record.favorite);
        assert_eq!(record.system_prompt, ENHANCEMENT_SYSTEM_PROMPT);
        assert_eq!(record.category, Category::Coding);
    }
}
