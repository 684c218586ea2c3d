use serde::{Deserialize, Serialize};
use std::fmt;

/// Title every session starts with until one is derived from the first user message
pub const DEFAULT_TITLE: &str = "New chat";

/// Title used when derivation yields an empty string
pub const FALLBACK_TITLE: &str = "Conversation";

/// Placeholder used for title derivation when the first user message is an image
pub const IMAGE_TITLE_PLACEHOLDER: &str = "[Image]";

/// Maximum number of characters kept in a derived title
pub const TITLE_MAX_CHARS: usize = 28;

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed, spoken, or uploaded by the person chatting
    User,
    /// Produced by the generation endpoint (or an apology in its place)
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Bot => write!(f, "bot"),
        }
    }
}

/// How the content of a message is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text
    #[default]
    Text,
    /// An image encoded as a data URL
    Image,
}

/// One turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    /// Creation time, epoch milliseconds
    pub ts: i64,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(role: Role, content: impl Into<String>, kind: MessageType) -> Self {
        Self {
            role,
            content: content.into(),
            kind,
            ts: now_millis(),
        }
    }
}

/// One conversation thread
///
/// Serialized with the same field names the browser client used
/// (`id`, `title`, `createdAt`, `messages`), so existing records load as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    /// Creation time, epoch milliseconds
    pub created_at: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Create an empty session with the default title
    pub fn new(id: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            created_at,
            messages: Vec::new(),
        }
    }

    /// Whether the title is still the default sentinel
    pub fn has_default_title(&self) -> bool {
        self.title.is_empty() || self.title == DEFAULT_TITLE
    }

    /// Append a message stamped with the current time
    ///
    /// If the title is still the default, it is derived from the first user
    /// message right after the append.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>, kind: MessageType) {
        self.messages.push(Message::new(role, content, kind));
        if self.has_default_title() {
            self.derive_title();
        }
    }

    /// Derive the title from the first user message, if there is one
    ///
    /// Returns true when the title changed.
    pub fn derive_title(&mut self) -> bool {
        let Some(first) = self.messages.iter().find(|m| m.role == Role::User) else {
            return false;
        };

        let raw = match first.kind {
            MessageType::Text => first.content.as_str(),
            MessageType::Image => IMAGE_TITLE_PLACEHOLDER,
        };

        let title = derive_title_from(raw);
        let changed = title != self.title;
        self.title = title;
        changed
    }
}

/// Collapse whitespace runs to one space and keep at most 28 characters
///
/// # Examples
///
/// ```
/// use hcchat::session::derive_title_from;
///
/// assert_eq!(derive_title_from("Hi\n\nthere"), "Hi there");
/// assert_eq!(derive_title_from(""), "Conversation");
/// ```
pub fn derive_title_from(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }

    let title: String = collapsed.chars().take(TITLE_MAX_CHARS).collect();
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title
    }
}
