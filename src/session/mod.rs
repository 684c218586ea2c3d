//! In-memory conversation model
//!
//! `SessionStore` owns the list of sessions and the active pointer. It never
//! touches the disk or the terminal: callers persist the list and re-render
//! after every mutation.

pub mod types;

pub use types::{
    derive_title_from, now_millis, Message, MessageType, Role, Session, DEFAULT_TITLE,
    FALLBACK_TITLE, IMAGE_TITLE_PLACEHOLDER, TITLE_MAX_CHARS,
};

/// Ordered set of sessions plus the id of the active one
///
/// Invariants: the list is never empty, ids are unique, and `active_id`
/// always references a session in the list once an operation returns.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Vec<Session>,
    active_id: String,
}

impl SessionStore {
    /// Build a store from sessions loaded from durable storage
    ///
    /// An empty list gets one fresh session. The most recently created
    /// session becomes active. The returned flag is true when a session was
    /// synthesized, meaning the caller should persist.
    ///
    /// # Examples
    ///
    /// ```
    /// use hcchat::session::{SessionStore, DEFAULT_TITLE};
    ///
    /// let (store, synthesized) = SessionStore::from_loaded(Vec::new());
    /// assert!(synthesized);
    /// assert_eq!(store.len(), 1);
    /// assert_eq!(store.active().unwrap().title, DEFAULT_TITLE);
    /// ```
    pub fn from_loaded(mut sessions: Vec<Session>) -> (Self, bool) {
        // Drop duplicate ids so lookups stay unambiguous; the first one wins.
        let mut seen = std::collections::HashSet::new();
        sessions.retain(|s| seen.insert(s.id.clone()));

        let mut store = Self {
            sessions,
            active_id: String::new(),
        };

        if store.sessions.is_empty() {
            let session = store.create_session();
            store.active_id = session.id.clone();
            store.sessions.push(session);
            return (store, true);
        }

        store.active_id = store.most_recent_id();
        (store, false)
    }

    /// Generate a new empty session with a time-based id
    ///
    /// The session is not inserted; see [`SessionStore::new_chat`].
    pub fn create_session(&self) -> Session {
        let created_at = now_millis();
        let mut stamp = created_at;
        while self.contains(&format!("s_{}", stamp)) {
            stamp += 1;
        }
        Session::new(format!("s_{}", stamp), created_at)
    }

    /// Create a session, add it to the store, and make it active
    pub fn new_chat(&mut self) -> &Session {
        let session = self.create_session();
        tracing::debug!("Created session {}", session.id);
        self.active_id = session.id.clone();
        self.sessions.push(session);
        let idx = self.sessions.len() - 1;
        &self.sessions[idx]
    }

    /// Reassign the active pointer
    ///
    /// Callers must only pass ids that exist in the store.
    pub fn set_active(&mut self, id: &str) {
        self.active_id = id.to_string();
    }

    /// Id of the active session
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active session, if the pointer references one
    pub fn active(&self) -> Option<&Session> {
        self.get(&self.active_id)
    }

    /// Mutable access to the active session
    pub fn active_mut(&mut self) -> Option<&mut Session> {
        let id = self.active_id.clone();
        self.get_mut(&id)
    }

    /// Look up a session by id
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Mutable lookup by id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Whether a session with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove a session
    ///
    /// If the store becomes empty a fresh session is created and activated.
    /// If the removed session was active, the most recently created remaining
    /// session becomes active.
    ///
    /// # Arguments
    ///
    /// * `id` - Full id of the session to remove
    ///
    /// # Returns
    ///
    /// `false` when the id is unknown, in which case nothing changes
    ///
    /// # Examples
    ///
    /// ```
    /// use hcchat::session::SessionStore;
    ///
    /// let (mut store, _) = SessionStore::from_loaded(Vec::new());
    /// let only = store.active_id().to_string();
    /// assert!(store.delete_session(&only));
    /// assert_eq!(store.len(), 1);
    /// assert_ne!(store.active_id(), only);
    /// ```
    pub fn delete_session(&mut self, id: &str) -> bool {
        let Some(idx) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        self.sessions.remove(idx);
        tracing::debug!("Deleted session {}", id);

        if self.sessions.is_empty() {
            let session = self.create_session();
            self.active_id = session.id.clone();
            self.sessions.push(session);
        } else if self.active_id == id {
            self.active_id = self.most_recent_id();
        }

        true
    }

    /// Sessions in storage order
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Sessions ordered by creation time, most recent first
    ///
    /// Ties keep storage order.
    pub fn by_recency(&self) -> Vec<&Session> {
        let mut sorted: Vec<&Session> = self.sessions.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Resolve a user-supplied selector to a session id
    ///
    /// Accepts a full id, a 1-based position in recency order, or a unique
    /// id prefix, in that order of precedence.
    ///
    /// # Arguments
    ///
    /// * `selector` - What the user typed; surrounding whitespace is ignored
    ///
    /// # Returns
    ///
    /// The full id of the matching session, or `None` when nothing or more
    /// than one session matches
    pub fn resolve(&self, selector: &str) -> Option<String> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }

        if self.contains(selector) {
            return Some(selector.to_string());
        }

        if let Ok(position) = selector.parse::<usize>() {
            if position >= 1 {
                if let Some(session) = self.by_recency().get(position - 1) {
                    return Some(session.id.clone());
                }
            }
        }

        let mut matches = self.sessions.iter().filter(|s| s.id.starts_with(selector));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only.id.clone()),
            _ => None,
        }
    }

    fn most_recent_id(&self) -> String {
        self.by_recency()
            .first()
            .map(|s| s.id.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, created_at: i64) -> Session {
        Session::new(id, created_at)
    }

    fn store_with(sessions: Vec<Session>) -> SessionStore {
        SessionStore::from_loaded(sessions).0
    }

    #[test]
    fn test_from_loaded_empty_synthesizes_default_session() {
        let (store, synthesized) = SessionStore::from_loaded(Vec::new());
        assert!(synthesized);
        assert_eq!(store.len(), 1);

        let active = store.active().expect("active session");
        assert_eq!(active.title, DEFAULT_TITLE);
        assert!(active.messages.is_empty());
        assert!(active.id.starts_with("s_"));
    }

    #[test]
    fn test_from_loaded_activates_most_recent() {
        let store = store_with(vec![session("s_1", 1), session("s_3", 3), session("s_2", 2)]);
        assert_eq!(store.active_id(), "s_3");
    }

    #[test]
    fn test_from_loaded_drops_duplicate_ids() {
        let mut first = session("s_1", 1);
        first.title = "kept".to_string();
        let store = store_with(vec![first, session("s_1", 5)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("s_1").unwrap().title, "kept");
    }

    #[test]
    fn test_new_chat_becomes_active() {
        let mut store = store_with(vec![session("s_1", 1)]);
        let id = store.new_chat().id.clone();
        assert_eq!(store.active_id(), id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_create_session_ids_are_unique() {
        let mut store = store_with(Vec::new());
        for _ in 0..50 {
            store.new_chat();
        }
        let mut ids: Vec<&str> = store.sessions().iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 51);
    }

    #[test]
    fn test_set_active_and_get_active() {
        let mut store = store_with(vec![session("s_1", 1), session("s_2", 2)]);
        store.set_active("s_1");
        assert_eq!(store.active().unwrap().id, "s_1");

        store.set_active("missing");
        assert!(store.active().is_none());
    }

    #[test]
    fn test_delete_active_selects_most_recent_remaining() {
        let mut store = store_with(vec![session("s_1", 1), session("s_3", 3), session("s_2", 2)]);
        store.set_active("s_3");
        assert!(store.delete_session("s_3"));
        assert_eq!(store.active_id(), "s_2");
        assert!(store.active().is_some());
    }

    #[test]
    fn test_delete_inactive_keeps_active() {
        let mut store = store_with(vec![session("s_1", 1), session("s_2", 2)]);
        store.set_active("s_2");
        assert!(store.delete_session("s_1"));
        assert_eq!(store.active_id(), "s_2");
    }

    #[test]
    fn test_delete_only_session_synthesizes_fresh_one() {
        let mut store = store_with(vec![session("s_1", 1)]);
        assert!(store.delete_session("s_1"));
        assert_eq!(store.len(), 1);

        let active = store.active().expect("fresh active session");
        assert_ne!(active.id, "s_1");
        assert_eq!(active.title, DEFAULT_TITLE);
        assert!(active.messages.is_empty());
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut store = store_with(vec![session("s_1", 1)]);
        assert!(!store.delete_session("nope"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_never_empty_across_create_delete_sequences() {
        let mut store = store_with(Vec::new());
        for round in 0..20 {
            if round % 3 == 0 {
                store.new_chat();
            }
            let victim = store.sessions()[0].id.clone();
            store.delete_session(&victim);
            assert!(!store.is_empty());
            assert!(store.active().is_some());
        }
    }

    #[test]
    fn test_by_recency_orders_descending() {
        let store = store_with(vec![session("s_1", 1), session("s_3", 3), session("s_2", 2)]);
        let ids: Vec<&str> = store.by_recency().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s_3", "s_2", "s_1"]);
        // Storage order is untouched.
        assert_eq!(store.sessions()[0].id, "s_1");
    }

    #[test]
    fn test_resolve_by_id_position_and_prefix() {
        let store = store_with(vec![
            session("s_100", 100),
            session("s_200", 200),
            session("s_205", 205),
        ]);
        assert_eq!(store.resolve("s_100"), Some("s_100".to_string()));
        assert_eq!(store.resolve("1"), Some("s_205".to_string()));
        assert_eq!(store.resolve("3"), Some("s_100".to_string()));
        assert_eq!(store.resolve("s_1"), Some("s_100".to_string()));
        // Ambiguous prefix
        assert_eq!(store.resolve("s_2"), None);
        assert_eq!(store.resolve("9"), None);
        assert_eq!(store.resolve("0"), None);
        assert_eq!(store.resolve("  "), None);
    }

    #[test]
    fn test_active_mut_appends_to_active_session() {
        let mut store = store_with(vec![session("s_1", 1), session("s_2", 2)]);
        store.set_active("s_1");
        store
            .active_mut()
            .unwrap()
            .append_message(Role::User, "hello", MessageType::Text);
        assert_eq!(store.get("s_1").unwrap().messages.len(), 1);
        assert!(store.get("s_2").unwrap().messages.is_empty());
    }
}
