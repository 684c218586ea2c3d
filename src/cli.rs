//! Command-line interface definition for hcchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot sends, and
//! conversation history management.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hcchat - HealthConnect assistant chat client
///
/// Chat with the HealthConnect assistant from the terminal. Conversations
/// are kept locally and survive restarts.
#[derive(Parser, Debug, Clone)]
#[command(name = "hcchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the session database location
    #[arg(long, env = "HCCHAT_SESSIONS_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for hcchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat
    Chat {
        /// Conversation to open (id, id prefix, or list position)
        #[arg(short, long)]
        session: Option<String>,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Send a single message and print the reply
    Send(SendArgs),

    /// Inspect and manage stored conversations
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Arguments for `hcchat send`
#[derive(Args, Debug, Clone)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["text", "image"])))]
pub struct SendArgs {
    /// Text to send
    #[arg(short, long)]
    pub text: Option<String>,

    /// Image file to send
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Conversation to send into; the most recent one when omitted
    #[arg(short, long)]
    pub session: Option<String>,

    /// Start a new conversation for this message
    #[arg(long, conflicts_with = "session")]
    pub new: bool,
}

/// History subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List conversations, most recent first
    List,

    /// Print a conversation transcript
    Show {
        /// Conversation id, id prefix, or list position
        id: String,
    },

    /// Delete a conversation permanently
    Delete {
        /// Conversation id, id prefix, or list position
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
