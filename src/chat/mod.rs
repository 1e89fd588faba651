//! Chat completion client
//!
//! Sends one request to an OpenAI-compatible `/v1/chat/completions`
//! endpoint and reads back the first choice's text. Every call site
//! (direct chat, enhancement, post-enhancement generation) goes through
//! [`ChatClient`].

pub mod transport;
pub mod wire;

use std::sync::Arc;

use thiserror::Error;

pub use transport::{ChatTransport, HttpTransport, RawResponse};
pub use wire::{parse_completion, CompletionRequest, DecodeError};

/// Path appended to the configured base URL
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// One chat request: a system prompt, a user prompt and sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    /// `-1` for unlimited
    pub max_tokens: i32,
    pub stream: bool,
}

/// Chat client errors
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Transport(String),
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Full endpoint URL for `base_url`
pub fn completions_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim().trim_end_matches('/'), COMPLETIONS_PATH)
}

#[derive(Clone)]
pub struct ChatClient {
    transport: Arc<dyn ChatTransport>,
}

impl ChatClient {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }

    /// Client over the real HTTP transport
    pub fn http() -> Result<Self, ChatError> {
        Ok(Self::new(Arc::new(HttpTransport::from_env()?)))
    }

    /// Send `request` and return the model's text, or the typed failure
    pub async fn try_send(&self, base_url: &str, request: &ChatRequest) -> Result<String, ChatError> {
        let url = completions_url(base_url);
        let body = serde_json::to_string(&CompletionRequest::from(request))?;

        tracing::info!(
            "POST {} (model: {}, max_tokens: {}, stream: {})",
            url,
            request.model,
            request.max_tokens,
            request.stream
        );

        let response = self.transport.post_json(&url, body).await?;

        if !response.is_success() {
            let message = match parse_completion(&response.body) {
                Err(DecodeError::Api(message)) => message,
                _ => response.body.trim().to_string(),
            };
            return Err(ChatError::Status {
                status: response.status,
                message,
            });
        }

        let content = parse_completion(&response.body)?;
        tracing::debug!("Received {} chars from {}", content.len(), request.model);
        Ok(content)
    }

    /// Send `request`; failures come back as `"Error: <message>"` text
    pub async fn send(&self, base_url: &str, request: &ChatRequest) -> String {
        match self.try_send(base_url, request).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that records requests and replays canned responses
    #[derive(Default)]
    pub struct ScriptedTransport {
        pub requests: Mutex<Vec<(String, String)>>,
        responses: Mutex<VecDeque<Result<RawResponse, String>>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn reply(&self, status: u16, body: &str) {
            self.responses.lock().unwrap().push_back(Ok(RawResponse {
                status,
                body: body.to_string(),
            }));
        }

        pub fn reply_content(&self, content: &str) {
            let body = serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            });
            self.reply(200, &body.to_string());
        }

        pub fn fail(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(message.to_string()));
        }

        pub fn sent_bodies(&self) -> Vec<serde_json::Value> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, body)| serde_json::from_str(body).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn post_json(&self, url: &str, body: String) -> Result<RawResponse, ChatError> {
            self.requests.lock().unwrap().push((url.to_string(), body));
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(ChatError::Transport(message)),
                None => Err(ChatError::Transport("no scripted response".to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "qwen2.5-7b-instruct".to_string(),
            system_prompt: "You are terse.".to_string(),
            user_prompt: "Name a prime.".to_string(),
            temperature: 0.5,
            max_tokens: -1,
            stream: true,
        }
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("http://localhost:1234"),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:1234/"),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_single_post_with_documented_shape() {
        let transport = ScriptedTransport::new();
        transport.reply_content("7");
        let client = ChatClient::new(transport.clone());

        let text = client.send("http://127.0.0.1:1234", &request()).await;
        assert_eq!(text, "7");

        let requests = transport.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://127.0.0.1:1234/v1/chat/completions");

        let body: serde_json::Value = serde_json::from_str(&requests[0].1).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "qwen2.5-7b-instruct",
                "messages": [
                    {"role": "system", "content": "You are terse."},
                    {"role": "user", "content": "Name a prime."}
                ],
                "temperature": 0.5,
                "max_tokens": -1,
                "stream": true
            })
        );
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_error_text() {
        let transport = ScriptedTransport::new();
        transport.fail("connection refused");
        let client = ChatClient::new(transport);

        let text = client.send("http://localhost:9", &request()).await;
        assert_eq!(text, "Error: connection refused");
    }

    #[tokio::test]
    async fn test_non_json_body_becomes_error_text() {
        let transport = ScriptedTransport::new();
        transport.reply(200, "not json at all");
        let client = ChatClient::new(transport);

        let text = client.send("http://localhost:1234", &request()).await;
        assert!(text.starts_with("Error: Failed to parse response"), "{}", text);
    }

    #[tokio::test]
    async fn test_missing_content_becomes_error_text() {
        let transport = ScriptedTransport::new();
        transport.reply(200, r#"{"choices":[{"message":{}}]}"#);
        let client = ChatClient::new(transport);

        let text = client.send("http://localhost:1234", &request()).await;
        assert_eq!(text, "Error: No response content from model");
    }

    #[tokio::test]
    async fn test_error_status_uses_api_message() {
        let transport = ScriptedTransport::new();
        transport.reply(404, r#"{"error":{"message":"model 'nope' not found"}}"#);
        transport.reply(500, "upstream exploded\n");
        let client = ChatClient::new(transport);

        let err = client.try_send("http://localhost:1234", &request()).await.unwrap_err();
        assert_eq!(err.to_string(), "API error (404): model 'nope' not found");

        let text = client.send("http://localhost:1234", &request()).await;
        assert_eq!(text, "Error: API error (500): upstream exploded");
    }
}
