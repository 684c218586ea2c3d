//! Pure view projections of the session model
//!
//! Both projections rebuild their output from scratch on every call, so
//! rendering twice with an unchanged model yields identical views. Turning a
//! view into terminal output is the job of a [`crate::surface::ChatSurface`].

use crate::session::{MessageType, Role, Session, SessionStore, FALLBACK_TITLE};
use chrono::{DateTime, Local};

/// One row of the conversation list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    /// 1-based position, usable as a selector for `/switch` and `/delete`
    pub position: usize,
    pub id: String,
    pub title: String,
    /// Human-readable creation time
    pub created: String,
    pub active: bool,
}

/// The conversation list, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SidebarView {
    pub items: Vec<SidebarItem>,
}

impl SidebarView {
    /// The item carrying the active marker
    pub fn active_item(&self) -> Option<&SidebarItem> {
        self.items.iter().find(|i| i.active)
    }
}

/// Content node of a message bubble
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentView {
    /// Text node
    Text(String),
    /// Image element with its data URL as source
    Image { src: String },
    /// Three-dot loading animation
    Loading,
}

/// One bubble in the message panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Style class, `user` or `bot`
    pub role: Role,
    pub content: ContentView,
    /// Human-readable timestamp
    pub time: String,
}

impl MessageView {
    pub fn is_loading(&self) -> bool {
        matches!(self.content, ContentView::Loading)
    }
}

/// The active conversation's messages plus any loading indicators
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePanelView {
    /// Session the panel shows; empty when there is none
    pub session_id: String,
    pub title: String,
    pub entries: Vec<MessageView>,
}

impl MessagePanelView {
    /// Index the panel is scrolled to: always the newest entry
    pub fn scroll_target(&self) -> Option<usize> {
        self.entries.len().checked_sub(1)
    }

    /// Number of loading indicators currently shown
    pub fn loading_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_loading()).count()
    }
}

/// Format epoch milliseconds as a local `HH:MM` time
pub fn format_time(ts: i64) -> String {
    local_time(ts)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Format epoch milliseconds as a local date and time
pub fn format_datetime(ts: i64) -> String {
    local_time(ts)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn local_time(ts: i64) -> Option<DateTime<Local>> {
    DateTime::from_timestamp_millis(ts).map(|t| t.with_timezone(&Local))
}

/// Project the session list into sidebar items
pub fn sidebar(store: &SessionStore) -> SidebarView {
    let items = store
        .by_recency()
        .into_iter()
        .enumerate()
        .map(|(idx, session)| SidebarItem {
            position: idx + 1,
            id: session.id.clone(),
            title: if session.title.is_empty() {
                FALLBACK_TITLE.to_string()
            } else {
                session.title.clone()
            },
            created: format_datetime(session.created_at),
            active: session.id == store.active_id(),
        })
        .collect();

    SidebarView { items }
}

/// Project a session's messages into the message panel
///
/// # Arguments
///
/// * `session` - The active session; `None` yields an empty panel
/// * `loaders` - Start time of each pending reply for this session; one
///   loading bubble is appended per entry
///
/// # Examples
///
/// ```
/// use hcchat::render::message_panel;
/// use hcchat::session::{MessageType, Role, Session};
///
/// let mut session = Session::new("s_1", 0);
/// session.append_message(Role::User, "Hi", MessageType::Text);
///
/// let panel = message_panel(Some(&session), &[0]);
/// assert_eq!(panel.entries.len(), 2);
/// assert_eq!(panel.loading_count(), 1);
/// ```
pub fn message_panel(session: Option<&Session>, loaders: &[i64]) -> MessagePanelView {
    let Some(session) = session else {
        return MessagePanelView::default();
    };

    let mut entries: Vec<MessageView> = session
        .messages
        .iter()
        .map(|m| MessageView {
            role: m.role,
            content: match m.kind {
                MessageType::Text => ContentView::Text(m.content.clone()),
                MessageType::Image => ContentView::Image {
                    src: m.content.clone(),
                },
            },
            time: format_time(m.ts),
        })
        .collect();

    entries.extend(loaders.iter().map(|started| MessageView {
        role: Role::Bot,
        content: ContentView::Loading,
        time: format_time(*started),
    }));

    MessagePanelView {
        session_id: session.id.clone(),
        title: session.title.clone(),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        let mut older = Session::new("s_1", 1_000);
        older.append_message(Role::User, "older chat", MessageType::Text);
        let mut newer = Session::new("s_2", 2_000);
        newer.append_message(Role::User, "Hi", MessageType::Text);
        newer.append_message(Role::Bot, "Hello!", MessageType::Text);
        newer.append_message(Role::User, "data:image/png;base64,AA==", MessageType::Image);
        SessionStore::from_loaded(vec![older, newer]).0
    }

    #[test]
    fn test_sidebar_sorted_most_recent_first_with_active_marker() {
        let view = sidebar(&store());
        let ids: Vec<&str> = view.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s_2", "s_1"]);
        assert_eq!(view.items[0].position, 1);
        assert_eq!(view.items[1].position, 2);
        assert_eq!(view.active_item().map(|i| i.id.as_str()), Some("s_2"));
        assert_eq!(view.items.iter().filter(|i| i.active).count(), 1);
    }

    #[test]
    fn test_sidebar_follows_active_pointer() {
        let mut store = store();
        store.set_active("s_1");
        let view = sidebar(&store);
        assert_eq!(view.active_item().map(|i| i.id.as_str()), Some("s_1"));
    }

    #[test]
    fn test_sidebar_shows_creation_time() {
        let view = sidebar(&store());
        assert_eq!(view.items[1].created, format_datetime(1_000));
        assert!(!view.items[1].created.is_empty());
    }

    #[test]
    fn test_sidebar_render_is_idempotent() {
        let store = store();
        assert_eq!(sidebar(&store), sidebar(&store));
    }

    #[test]
    fn test_message_panel_preserves_order_and_types() {
        let store = store();
        let view = message_panel(store.active(), &[]);
        assert_eq!(view.session_id, "s_2");
        assert_eq!(view.title, "Hi");
        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.entries[0].role, Role::User);
        assert_eq!(view.entries[0].content, ContentView::Text("Hi".to_string()));
        assert_eq!(view.entries[1].role, Role::Bot);
        assert!(matches!(view.entries[2].content, ContentView::Image { .. }));
        assert_eq!(view.scroll_target(), Some(2));
    }

    #[test]
    fn test_message_panel_appends_loaders_last() {
        let store = store();
        let view = message_panel(store.active(), &[5_000]);
        assert_eq!(view.entries.len(), 4);
        assert!(view.entries[3].is_loading());
        assert_eq!(view.entries[3].role, Role::Bot);
        assert_eq!(view.loading_count(), 1);
        assert_eq!(view.scroll_target(), Some(3));
    }

    #[test]
    fn test_message_panel_render_is_idempotent() {
        let store = store();
        let first = message_panel(store.active(), &[7]);
        let second = message_panel(store.active(), &[7]);
        assert_eq!(first, second);
        assert_eq!(first.entries.len(), second.entries.len());
    }

    #[test]
    fn test_message_panel_without_session_is_empty() {
        let view = message_panel(None, &[1]);
        assert!(view.entries.is_empty());
        assert_eq!(view.scroll_target(), None);
    }

    #[test]
    fn test_format_time_is_hours_and_minutes() {
        let formatted = format_time(0);
        assert_eq!(formatted.len(), 5);
        assert_eq!(&formatted[2..3], ":");
    }
}
