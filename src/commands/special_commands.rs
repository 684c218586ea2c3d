//! Special commands parser for interactive chat
//!
//! Lines starting with `/` manage conversations instead of being sent to the
//! assistant:
//! - Start, list, switch between, and delete conversations
//! - Send an image file
//! - Toggle voice input
//! - View status and help
//!
//! Command names are case-insensitive; arguments keep their case.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new conversation
    NewChat,

    /// Print the conversation list
    List,

    /// Make another conversation active
    ///
    /// Holds an id, id prefix, or list position.
    Switch(String),

    /// Delete a conversation, the active one when no selector is given
    Delete(Option<String>),

    /// Send an image file
    Image(PathBuf),

    /// Toggle voice input
    Mic,

    /// Display model, storage, and conversation status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input as a message
    None,
}

/// Parse user input into a special command
///
/// # Examples
///
/// ```
/// use hcchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/switch 2").unwrap(),
///     SpecialCommand::Switch("2".to_string())
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // Plain text is a message, except for the bare exit words
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/new" => no_argument("/new", arg, SpecialCommand::NewChat),
        "/list" | "/chats" => no_argument("/list", arg, SpecialCommand::List),

        "/switch" | "/open" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/switch".to_string(),
                    usage: "/switch <number|id>".to_string(),
                })
            } else {
                Ok(SpecialCommand::Switch(arg.to_string()))
            }
        }

        "/delete" => {
            if arg.is_empty() {
                Ok(SpecialCommand::Delete(None))
            } else {
                Ok(SpecialCommand::Delete(Some(arg.to_string())))
            }
        }

        "/image" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/image".to_string(),
                    usage: "/image <path>".to_string(),
                })
            } else {
                Ok(SpecialCommand::Image(PathBuf::from(arg)))
            }
        }

        "/mic" | "/voice" => no_argument("/mic", arg, SpecialCommand::Mic),
        "/status" => no_argument("/status", arg, SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        other if other.starts_with('/') => Err(CommandError::UnknownCommand(other.to_string())),

        // "exit now" and the like are ordinary messages
        _ => Ok(SpecialCommand::None),
    }
}

fn no_argument(
    command: &str,
    arg: &str,
    parsed: SpecialCommand,
) -> Result<SpecialCommand, CommandError> {
    if arg.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        })
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

CONVERSATIONS:
  /new              - Start a new conversation
  /list             - Show all conversations, most recent first
  /switch <n|id>    - Open conversation number n (or by id)
  /delete [n|id]    - Delete a conversation (asks for confirmation)

INPUT:
  /image <path>     - Send an image file
  /mic              - Speak a message (Ctrl-C stops listening)

SESSION INFORMATION:
  /status           - Show model, storage and conversation status
  /help             - Show this help message
  /?                - Same as /help

SESSION CONTROL:
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Command names are case-insensitive
  - Regular text (not starting with /) is sent to the assistant
  - Conversations are saved after every message
"#
    );
}
