//! UI bindings for rendered views
//!
//! A [`ChatSurface`] receives the views produced by [`crate::render`] and
//! puts them in front of the user. [`TerminalSurface`] drives an interactive
//! terminal; [`HeadlessSurface`] only records what it was given.

use crate::image_input::describe_data_url;
use crate::render::{ContentView, MessagePanelView, MessageView, SidebarView};
use crate::session::Role;
use colored::Colorize;
use std::io::{self, Write};

/// Receiver of rendered views
pub trait ChatSurface {
    /// Replace the conversation list
    fn show_sidebar(&mut self, view: &SidebarView);

    /// Replace the message panel
    fn show_messages(&mut self, view: &MessagePanelView);

    /// Show a transient notice that is not part of any conversation
    fn show_notice(&mut self, text: &str);
}

// Cursor up one line, then clear it.
const ERASE_LINE: &str = "\x1b[1A\x1b[2K";

/// Colored terminal output
///
/// The sidebar is printed only when it differs from the last one shown. The
/// message panel is printed in full when the conversation changes and
/// incrementally otherwise. Loading lines are kept at the bottom and erased
/// once their reply lands, which assumes nothing else is written to the
/// terminal while a loader is showing.
pub struct TerminalSurface<W: Write = io::Stdout> {
    out: W,
    last_sidebar: Option<SidebarView>,
    panel_session: Option<String>,
    printed_messages: usize,
    loader_lines: usize,
}

impl TerminalSurface<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for TerminalSurface<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalSurface<W> {
    /// Render into an arbitrary writer
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            last_sidebar: None,
            panel_session: None,
            printed_messages: 0,
            loader_lines: 0,
        }
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn erase_loaders(&mut self) -> io::Result<()> {
        for _ in 0..self.loader_lines {
            write!(self.out, "{}", ERASE_LINE)?;
        }
        self.loader_lines = 0;
        Ok(())
    }

    fn write_sidebar(&mut self, view: &SidebarView) -> io::Result<()> {
        self.erase_loaders()?;
        writeln!(self.out, "{}", "Conversations".bold())?;
        for item in &view.items {
            let line = format!("{:>3}. {}  {}", item.position, item.title, item.created.dimmed());
            if item.active {
                writeln!(self.out, "{} {}", "*".green().bold(), line.bold())?;
            } else {
                writeln!(self.out, "  {}", line)?;
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn write_messages(&mut self, view: &MessagePanelView) -> io::Result<()> {
        let messages: Vec<&MessageView> = view.entries.iter().filter(|e| !e.is_loading()).collect();
        let loaders = view.loading_count();

        let switched = self.panel_session.as_deref() != Some(view.session_id.as_str())
            || messages.len() < self.printed_messages;

        if switched {
            self.erase_loaders()?;
            self.panel_session = Some(view.session_id.clone());
            self.printed_messages = 0;
            writeln!(self.out, "{}", format!("── {} ──", view.title).cyan().bold())?;
        }

        let fresh = &messages[self.printed_messages..];
        if fresh.is_empty() && self.loader_lines == loaders {
            return self.out.flush();
        }

        self.erase_loaders()?;
        for entry in fresh {
            writeln!(self.out, "{}", format_entry(entry))?;
        }
        self.printed_messages = messages.len();

        for _ in 0..loaders {
            writeln!(self.out, "{} {}", "assistant:".green().bold(), "...".dimmed())?;
        }
        self.loader_lines = loaders;
        self.out.flush()
    }

    fn write_notice(&mut self, text: &str) -> io::Result<()> {
        self.erase_loaders()?;
        writeln!(self.out, "{}", text.yellow())?;
        self.out.flush()
    }
}

fn format_entry(entry: &MessageView) -> String {
    let speaker = match entry.role {
        Role::User => "you:".cyan().bold(),
        Role::Bot => "assistant:".green().bold(),
    };
    let body = match &entry.content {
        ContentView::Text(text) => text.clone(),
        ContentView::Image { src } => describe_image(src),
        ContentView::Loading => "...".to_string(),
    };
    format!("{} {} {}", entry.time.dimmed(), speaker, body)
}

fn describe_image(src: &str) -> String {
    match describe_data_url(src) {
        Some(info) => format!("[image {}, {} bytes]", info.mime, info.size),
        None => "[image]".to_string(),
    }
}

impl<W: Write> ChatSurface for TerminalSurface<W> {
    fn show_sidebar(&mut self, view: &SidebarView) {
        if self.last_sidebar.as_ref() == Some(view) {
            return;
        }
        if let Err(e) = self.write_sidebar(view) {
            tracing::warn!("Failed to draw conversation list: {}", e);
        }
        self.last_sidebar = Some(view.clone());
    }

    fn show_messages(&mut self, view: &MessagePanelView) {
        if let Err(e) = self.write_messages(view) {
            tracing::warn!("Failed to draw messages: {}", e);
        }
    }

    fn show_notice(&mut self, text: &str) {
        if let Err(e) = self.write_notice(text) {
            tracing::warn!("Failed to draw notice: {}", e);
        }
    }
}

/// Surface that keeps the latest views in memory
///
/// Used for non-interactive commands and for inspecting handler output.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    pub sidebar: SidebarView,
    pub messages: MessagePanelView,
    pub notices: Vec<String>,
    /// Number of message panel renders received
    pub message_renders: usize,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatSurface for HeadlessSurface {
    fn show_sidebar(&mut self, view: &SidebarView) {
        self.sidebar = view.clone();
    }

    fn show_messages(&mut self, view: &MessagePanelView) {
        self.messages = view.clone();
        self.message_renders += 1;
    }

    fn show_notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
    }
}
