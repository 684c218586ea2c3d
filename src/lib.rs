//! hcchat - HealthConnect assistant chat client library
//!
//! This library keeps a list of chat conversations, persists them locally,
//! and exchanges prompts with a text-generation endpoint.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Conversations, messages, titles, and the active pointer
//! - `storage`: Durable record of the session list (SQLite)
//! - `providers`: Generation client abstraction and the Ollama implementation
//! - `render`: Pure view projections of the session model
//! - `surface`: UI bindings that display rendered views
//! - `handlers`: User actions wired to model, storage, and rendering
//! - `image_input` / `speech`: Alternative ways to produce a message
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hcchat::providers::{create_client, GenerationClient};
//! use hcchat::storage::SqliteStorage;
//! use hcchat::surface::HeadlessSurface;
//! use hcchat::{ChatApp, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let storage = SqliteStorage::from_config(&config.storage)?;
//!     let client: Arc<dyn GenerationClient> = Arc::from(create_client(&config.generation)?);
//!     let mut app = ChatApp::load(storage, client, None, HeadlessSurface::new());
//!
//!     if let Some(outcome) = app.submit_text("What are your opening hours?").await {
//!         println!("{}", outcome.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod image_input;
pub mod providers;
pub mod render;
pub mod session;
pub mod speech;
pub mod storage;
pub mod surface;

// Re-export commonly used types
pub use config::Config;
pub use error::{HcChatError, Result};
pub use handlers::{ChatApp, SubmissionOutcome};
pub use session::{Message, MessageType, Role, Session, SessionStore};
pub use storage::SqliteStorage;

#[cfg(test)]
pub mod test_utils;
