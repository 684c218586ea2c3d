//! Generation client abstraction
//!
//! The chat handlers only need one thing from the model backend: turn a
//! prompt into reply text. `GenerationClient` is that seam; `OllamaClient`
//! is the HTTP implementation.

pub mod ollama;

pub use ollama::OllamaClient;

use crate::config::GenerationConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Request/response access to a text-generation endpoint
///
/// Implementations perform exactly one round trip per call and never stream.
/// They do not log per request; the caller logs a summary once the reply is
/// on screen.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send a prompt and return the full reply text
    ///
    /// # Errors
    ///
    /// Returns `HcChatError::Request` for non-success statuses,
    /// `HcChatError::Network` when the endpoint cannot be reached, and
    /// `HcChatError::InvalidResponse` when the body cannot be decoded.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model name used for requests
    fn model(&self) -> String;
}

/// Create the configured generation client
///
/// # Examples
///
/// ```
/// use hcchat::config::GenerationConfig;
/// use hcchat::providers::create_client;
///
/// let client = create_client(&GenerationConfig::default()).unwrap();
/// assert_eq!(client.model(), "healthconnect-model");
/// ```
pub fn create_client(config: &GenerationConfig) -> Result<Box<dyn GenerationClient>> {
    Ok(Box::new(OllamaClient::new(config.clone())?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_uses_configured_model() {
        let config = GenerationConfig {
            model: "custom-model".to_string(),
            ..GenerationConfig::default()
        };
        let client = create_client(&config).unwrap();
        assert_eq!(client.model(), "custom-model");
    }
}
