use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::{HcChatError, Result};
use crate::render::{self, format_datetime};
use crate::session::{Session, SessionStore};
use crate::storage::SqliteStorage;
use crate::surface::{ChatSurface, TerminalSurface};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(command: HistoryCommand, config: &Config) -> Result<()> {
    let storage = SqliteStorage::from_config(&config.storage)?;
    let sessions = storage.load();

    match command {
        HistoryCommand::List => {
            if sessions.is_empty() {
                println!("{}", "No conversations found.".yellow());
                return Ok(());
            }

            let (store, _) = SessionStore::from_loaded(sessions);
            println!("\nConversations:");
            session_table(&store).printstd();
            println!();
            println!(
                "Use {} to continue one.",
                "hcchat chat --session <#|ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let store = stored_sessions(sessions, &id)?;
            let session = find(&store, &id)?;

            let mut surface = TerminalSurface::new();
            surface.show_messages(&render::message_panel(Some(session), &[]));
            if session.messages.is_empty() {
                println!("{}", "(no messages)".dimmed());
            }
        }
        HistoryCommand::Delete { id, yes } => {
            let mut store = stored_sessions(sessions, &id)?;
            let target = find(&store, &id)?.id.clone();

            if !yes && !super::confirm_delete()? {
                println!("Cancelled.");
                return Ok(());
            }

            store.delete_session(&target);
            storage.save(store.sessions())?;
            println!("{}", format!("Deleted conversation {}", target).green());
        }
    }

    Ok(())
}

/// Build a store from what storage holds, without a synthesized session
///
/// An empty record matches no selector.
fn stored_sessions(sessions: Vec<Session>, selector: &str) -> Result<SessionStore> {
    if sessions.is_empty() {
        return Err(no_match(selector));
    }
    Ok(SessionStore::from_loaded(sessions).0)
}

fn no_match(selector: &str) -> anyhow::Error {
    HcChatError::Storage(format!("no conversation matches '{}'", selector)).into()
}

fn find<'a>(store: &'a SessionStore, selector: &str) -> Result<&'a Session> {
    store
        .resolve(selector)
        .and_then(|id| store.get(&id))
        .ok_or_else(|| no_match(selector))
}

/// Build the conversation table, most recent first
pub fn session_table(store: &SessionStore) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "#".bold(),
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Created".bold()
    ]);

    for item in render::sidebar(store).items {
        let messages = store.get(&item.id).map_or(0, |s| s.messages.len());
        let marker = if item.active {
            format!("{}*", item.position)
        } else {
            item.position.to_string()
        };
        table.add_row(prettytable::row![
            marker,
            item.id.cyan(),
            item.title,
            messages,
            item.created
        ]);
    }

    table
}

/// Print the conversation table for the interactive `/list` command
pub fn print_session_list(store: &SessionStore) {
    session_table(store).printstd();
    if let Some(active) = store.active() {
        println!(
            "Active: {} (created {})\n",
            active.title.bold(),
            format_datetime(active.created_at)
        );
    }
}
