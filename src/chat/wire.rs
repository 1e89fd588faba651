//! Chat completion wire format
//!
//! Request body and the typed decode step for the response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::chat::ChatRequest;
use crate::types::Message;

// ============================================================================
// Request
// ============================================================================

/// JSON body of `POST /v1/chat/completions`
#[derive(Debug, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    /// `-1` is sent as-is and means unlimited
    pub max_tokens: i32,
    pub stream: bool,
}

impl From<&ChatRequest> for CompletionRequest {
    fn from(request: &ChatRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: vec![
                Message::system(request.system_prompt.clone()),
                Message::user(request.user_prompt.clone()),
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: request.stream,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<Value>,
}

/// Why a response body didn't yield any text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Failed to parse response: {0}")]
    InvalidJson(String),
    #[error("No choices in response")]
    NoChoices,
    #[error("No response content from model")]
    MissingContent,
    #[error("{0}")]
    Api(String),
}

/// Extract `choices[0].message.content` from a response body
pub fn parse_completion(body: &str) -> Result<String, DecodeError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(DecodeError::Api(api_error_message(&error)));
    }

    let choice = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or(DecodeError::NoChoices)?;

    match choice.message.and_then(|m| m.content) {
        Some(Value::String(content)) => Ok(content),
        _ => Err(DecodeError::MissingContent),
    }
}

/// `{"error": {"message": "..."}}` or `{"error": "..."}`
fn api_error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}},{"message":{"content":"second"}}]}"#;
        assert_eq!(parse_completion(body), Ok("Hi!".to_string()));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_completion("<html>502 Bad Gateway</html>"),
            Err(DecodeError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_missing_paths() {
        assert_eq!(parse_completion("{}"), Err(DecodeError::NoChoices));
        assert_eq!(parse_completion(r#"{"choices":[]}"#), Err(DecodeError::NoChoices));
        assert_eq!(
            parse_completion(r#"{"choices":[{"delta":{"content":"x"}}]}"#),
            Err(DecodeError::MissingContent)
        );
        assert_eq!(
            parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(DecodeError::MissingContent)
        );
        assert_eq!(
            parse_completion(r#"{"choices":[{"message":{"content":42}}]}"#),
            Err(DecodeError::MissingContent)
        );
    }

    #[test]
    fn test_parse_api_error() {
        assert_eq!(
            parse_completion(r#"{"error":{"message":"model not loaded","type":"invalid_request"}}"#),
            Err(DecodeError::Api("model not loaded".to_string()))
        );
        assert_eq!(
            parse_completion(r#"{"error":"Unexpected endpoint"}"#),
            Err(DecodeError::Api("Unexpected endpoint".to_string()))
        );
    }

    #[test]
    fn test_empty_content_is_still_content() {
        assert_eq!(
            parse_completion(r#"{"choices":[{"message":{"content":""}}]}"#),
            Ok(String::new())
        );
    }
}
