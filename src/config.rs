//! Configuration management for hcchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{HcChatError, Result};
use crate::storage::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for hcchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Generation endpoint settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Durable session storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Speech-to-text settings
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Generation endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout; the transport default applies when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "healthconnect-model".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_model(),
            timeout_seconds: None,
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Database file; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<String>,

    /// Record key, namespaced so other features can share the database
    #[serde(default = "default_storage_key")]
    pub key: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_storage_key(),
        }
    }
}

/// Speech-to-text configuration
///
/// Voice input is only available when `command` is set. The command must
/// record one utterance and print the transcript on stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeechConfig {
    /// Program and arguments of the recognizer
    #[serde(default)]
    pub command: Option<Vec<String>>,

    /// Language tag exported to the recognizer as `HCCHAT_SPEECH_LANG`
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            command: None,
            language: default_language(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| HcChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| HcChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("HCCHAT_OLLAMA_HOST") {
            self.generation.host = host;
        }

        if let Ok(model) = std::env::var("HCCHAT_MODEL") {
            self.generation.model = model;
        }

        if let Ok(timeout) = std::env::var("HCCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.generation.timeout_seconds = Some(value);
            } else {
                tracing::warn!("Invalid HCCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(db_path) = std::env::var(crate::storage::SESSIONS_DB_ENV) {
            self.storage.path = Some(db_path);
        }

        if let Ok(command) = std::env::var("HCCHAT_SPEECH_COMMAND") {
            let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            self.speech.command = if parts.is_empty() { None } else { Some(parts) };
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(db_path) = &cli.storage_path {
            self.storage.path = Some(db_path.clone());
        }

        if let crate::cli::Commands::Chat {
            model: Some(model), ..
        } = &cli.command
        {
            self.generation.model = model.clone();
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `HcChatError::Config` describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.generation.model.trim().is_empty() {
            return Err(HcChatError::Config("generation.model cannot be empty".to_string()).into());
        }

        match url::Url::parse(&self.generation.host) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(HcChatError::Config(format!(
                    "generation.host must use http or https, got {}",
                    url.scheme()
                ))
                .into());
            }
            Err(e) => {
                return Err(HcChatError::Config(format!(
                    "generation.host is not a valid URL ({}): {}",
                    self.generation.host, e
                ))
                .into());
            }
        }

        if self.generation.timeout_seconds == Some(0) {
            return Err(HcChatError::Config(
                "generation.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.key.trim().is_empty() {
            return Err(HcChatError::Config("storage.key cannot be empty".to_string()).into());
        }

        if let Some(command) = &self.speech.command {
            if command.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(
                    HcChatError::Config("speech.command needs a program".to_string()).into(),
                );
            }
        }

        Ok(())
    }
}
