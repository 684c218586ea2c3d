/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`: Interactive chat
- `send`: One message, one reply, for scripting
- `history`: Listing, viewing and deleting stored conversations

The handlers are thin: conversation state lives in `handlers::ChatApp`.
*/

use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_client, GenerationClient};
use crate::speech::SpeechRecognizer;
use crate::storage::SqliteStorage;
use rustyline::DefaultEditor;
use std::sync::Arc;

// Conversation history commands
pub mod history;

// Special commands parser for the chat loop
pub mod special_commands;

/// Question asked before a conversation is deleted
pub const DELETE_PROMPT: &str = "Delete this chat permanently? [y/N] ";

/// Whether an answer to a yes/no prompt means yes
///
/// # Examples
///
/// ```
/// use hcchat::commands::is_affirmative;
///
/// assert!(is_affirmative(" Y "));
/// assert!(is_affirmative("yes"));
/// assert!(!is_affirmative(""));
/// ```
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn ask_delete(rl: &mut DefaultEditor) -> bool {
    match rl.readline(DELETE_PROMPT) {
        Ok(answer) => is_affirmative(&answer),
        Err(_) => false,
    }
}

/// Ask for deletion confirmation on the terminal
pub fn confirm_delete() -> Result<bool> {
    let mut rl = DefaultEditor::new()?;
    Ok(ask_delete(&mut rl))
}

/// Open storage and build the generation client from configuration
fn open_backends(config: &Config) -> Result<(SqliteStorage, Arc<dyn GenerationClient>)> {
    let storage = SqliteStorage::from_config(&config.storage)?;
    let client: Arc<dyn GenerationClient> = Arc::from(create_client(&config.generation)?);
    tracing::debug!(
        "Using model {} with sessions in {}",
        client.model(),
        storage.db_path().display()
    );
    Ok((storage, client))
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Runs a readline loop over a [`ChatApp`] bound to the terminal.
    //! Regular lines are sent to the assistant; slash commands manage
    //! conversations.

    use super::*;
    use crate::commands::history::print_session_list;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::handlers::ChatApp;
    use crate::speech::create_recognizer;
    use crate::surface::TerminalSurface;
    use colored::Colorize;
    use rustyline::error::ReadlineError;

    /// Start interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `session` - Optional selector of the conversation to open first
    pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat");

        let (storage, client) = open_backends(&config)?;
        let recognizer: Option<Arc<dyn SpeechRecognizer>> = create_recognizer(&config.speech);
        let mut app = ChatApp::load(storage, client, recognizer, TerminalSurface::new());

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config, app.speech_supported());

        if let Some(selector) = session {
            match app.store().resolve(&selector) {
                Some(id) => {
                    app.select_chat(&id);
                }
                None => eprintln!(
                    "{}",
                    format!("No conversation matches '{}', opening the latest", selector).yellow()
                ),
            }
        }
        app.render_all();

        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::NewChat => {
                            app.new_chat();
                        }
                        SpecialCommand::List => {
                            print_session_list(app.store());
                        }
                        SpecialCommand::Switch(selector) => match app.store().resolve(&selector) {
                            Some(id) => {
                                app.select_chat(&id);
                            }
                            None => eprintln!(
                                "{}",
                                format!("No conversation matches '{}'", selector).red()
                            ),
                        },
                        SpecialCommand::Delete(selector) => {
                            let target = match selector {
                                Some(selector) => app.store().resolve(&selector),
                                None => Some(app.store().active_id().to_string()),
                            };
                            match target {
                                Some(id) => {
                                    if !app.delete_chat(&id, || ask_delete(&mut rl)) {
                                        println!("Cancelled.");
                                    }
                                }
                                None => eprintln!("{}", "No such conversation".red()),
                            }
                        }
                        SpecialCommand::Image(path) => {
                            app.submit_image_file(&path).await;
                        }
                        SpecialCommand::Mic => {
                            app.listen_and_submit(async {
                                if let Err(e) = tokio::signal::ctrl_c().await {
                                    tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                                    std::future::pending::<()>().await;
                                }
                            })
                            .await;
                        }
                        SpecialCommand::ShowStatus => {
                            print_status(&app, &config);
                        }
                        SpecialCommand::Help => {
                            print_help();
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            // Awaited before the next prompt: interactive sends never overlap.
                            app.submit_text(trimmed).await;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Display welcome banner at the start of interactive chat
    fn print_welcome_banner(config: &Config, speech_supported: bool) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║            HealthConnect Assistant Chat - Welcome!           ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Model:  {}", config.generation.model.cyan());
        println!(
            "Voice:  {}\n",
            if speech_supported {
                "available (/mic)".green()
            } else {
                "not configured".dimmed()
            }
        );
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display status information about the current session
    fn print_status(app: &ChatApp<TerminalSurface>, config: &Config) {
        let active = app.store().active();
        println!("\n{}", "Status".bold());
        println!("  Model:          {}", config.generation.model.cyan());
        println!("  Endpoint:       {}", config.generation.host);
        println!("  Storage:        {}", app.storage().db_path().display());
        println!("  Conversations:  {}", app.store().len());
        if let Some(session) = active {
            println!("  Active:         {} ({})", session.title.bold(), session.id);
            println!("  Messages:       {}", session.messages.len());
        }
        println!("  Microphone:     {}", app.mic_state());
        println!(
            "  Voice input:    {}\n",
            if app.speech_supported() {
                "available"
            } else {
                "not configured"
            }
        );
    }
}

// One-shot send handler
pub mod send {
    //! Non-interactive submission.
    //!
    //! Goes through the same handler path as the chat loop, so the
    //! message and its reply (or apology) are stored exactly as they would
    //! be interactively. Only the reply text is printed.

    use super::*;
    use crate::cli::SendArgs;
    use crate::error::HcChatError;
    use crate::handlers::ChatApp;
    use crate::surface::HeadlessSurface;

    /// Send one message and print the reply
    ///
    /// # Errors
    ///
    /// Returns an error when nothing could be submitted or when the
    /// generation endpoint failed. In the latter case the apology has
    /// already been stored in the conversation.
    pub async fn run_send(config: Config, args: SendArgs) -> Result<()> {
        let (storage, client) = open_backends(&config)?;
        let mut app = ChatApp::load(storage, client, None, HeadlessSurface::new());

        if args.new {
            app.new_chat();
        } else if let Some(selector) = &args.session {
            let id = app.require_session(selector)?.id.clone();
            app.select_chat(&id);
        }

        let outcome = if let Some(path) = &args.image {
            app.submit_image_file(path).await
        } else {
            app.submit_text(args.text.as_deref().unwrap_or_default()).await
        };

        let Some(outcome) = outcome else {
            let reason = app
                .surface()
                .notices
                .last()
                .cloned()
                .unwrap_or_else(|| "nothing to send".to_string());
            return Err(HcChatError::Config(reason).into());
        };

        println!("{}", outcome.text());
        if outcome.is_failure() {
            return Err(HcChatError::Network(
                "the assistant did not answer; see the log for details".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
