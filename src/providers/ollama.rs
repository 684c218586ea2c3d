//! Ollama generation client
//!
//! Talks to the non-streaming `/api/generate` endpoint of a local or remote
//! Ollama server.

use crate::config::GenerationConfig;
use crate::error::{HcChatError, Result};
use crate::providers::GenerationClient;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client for Ollama's `/api/generate`
///
/// # Examples
///
/// ```no_run
/// use hcchat::config::GenerationConfig;
/// use hcchat::providers::{GenerationClient, OllamaClient};
///
/// # async fn example() -> hcchat::error::Result<()> {
/// let client = OllamaClient::new(GenerationConfig::default())?;
/// let reply = client.generate("Hello!").await?;
/// # Ok(())
/// # }
/// ```
pub struct OllamaClient {
    client: Client,
    config: GenerationConfig,
}

/// Request body for /api/generate
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body for /api/generate with `stream: false`
#[derive(Debug, Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Prefer `response`, then `text`, else an empty reply
    fn into_reply(self) -> String {
        self.response
            .filter(|r| !r.is_empty())
            .or(self.text.filter(|t| !t.is_empty()))
            .unwrap_or_default()
    }
}

impl OllamaClient {
    /// Create a new client
    ///
    /// No timeout is set unless `timeout_seconds` is configured.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use hcchat::config::GenerationConfig;
    /// use hcchat::providers::OllamaClient;
    ///
    /// let client = OllamaClient::new(GenerationConfig::default()).unwrap();
    /// assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
    /// ```
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("hcchat/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| HcChatError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama client: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self { client, config })
    }

    /// Full URL of the generate endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint();
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| HcChatError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HcChatError::Request {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| HcChatError::InvalidResponse(e.to_string()))?;

        Ok(body.into_reply())
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
