//! HTTP transport for the chat client

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::chat::ChatError;

/// Environment variable holding an optional bearer token
pub const API_KEY_ENV: &str = "PROMPTFORGE_API_KEY";

/// Status and body of a finished HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one JSON POST and returns the complete response
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_json(&self, url: &str, body: String) -> Result<RawResponse, ChatError>;
}

/// `reqwest`-backed transport
///
/// No timeout is configured; requests wait as long as the connection does.
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(api_key: Option<String>) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("promptforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, api_key))
    }

    /// Transport over a preconfigured client
    pub fn with_client(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    /// Transport using `PROMPTFORGE_API_KEY` when it is set
    pub fn from_env() -> Result<Self, ChatError> {
        Self::new(std::env::var(API_KEY_ENV).ok())
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: String) -> Result<RawResponse, ChatError> {
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(format!("Failed to read response: {}", e)))?;

        Ok(RawResponse { status, body })
    }
}
