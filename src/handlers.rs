//! Chat input handlers
//!
//! `ChatApp` owns the session model and wires user actions to it: every
//! mutation is followed by a save and a re-render. Replies are drawn first
//! so the loader they replace is gone before anything else is logged. A
//! submission runs in three phases so that independent submissions may be
//! in flight at the same time:
//!
//! 1. `begin_text` / `begin_image` append the user message and add a loader
//! 2. the caller awaits the generation client with the returned prompt
//! 3. `finish_submission` drops the loader and appends the reply or apology
//!
//! Each reply lands in the session that issued it, whatever is active by
//! then.

use crate::error::{HcChatError, Result};
use crate::image_input::read_image_as_data_url;
use crate::providers::GenerationClient;
use crate::render;
use crate::session::{now_millis, MessageType, Role, Session, SessionStore};
use crate::speech::{
    MicAction, MicControl, MicState, SpeechRecognizer, VOICE_FAILED_MESSAGE,
    VOICE_UNSUPPORTED_MESSAGE,
};
use crate::storage::SqliteStorage;
use crate::surface::ChatSurface;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Bot reply recorded when a text prompt could not be answered
pub const TEXT_FAILURE_MESSAGE: &str = "Sorry, I had trouble replying.";

/// Bot reply recorded when an image prompt could not be answered
pub const IMAGE_FAILURE_MESSAGE: &str = "Image upload worked, but the server failed to respond.";

/// A submission waiting for its reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    id: u64,
    session_id: String,
    kind: MessageType,
    prompt: String,
    started_at: i64,
}

impl PendingReply {
    /// Session the reply will be appended to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the prompt was text or an image
    pub fn kind(&self) -> MessageType {
        self.kind
    }

    /// Prompt to send to the generation client
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    fn apology(&self) -> &'static str {
        match self.kind {
            MessageType::Text => TEXT_FAILURE_MESSAGE,
            MessageType::Image => IMAGE_FAILURE_MESSAGE,
        }
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The endpoint answered; holds the reply text
    Replied(String),
    /// The endpoint failed; holds the apology that was recorded instead
    Failed(String),
}

impl SubmissionOutcome {
    /// Text of the bot message that was appended
    pub fn text(&self) -> &str {
        match self {
            Self::Replied(text) | Self::Failed(text) => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The chat application state and its event handlers
pub struct ChatApp<S: ChatSurface> {
    store: SessionStore,
    storage: SqliteStorage,
    client: Arc<dyn GenerationClient>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    surface: S,
    pending: Vec<PendingReply>,
    next_pending_id: u64,
    mic: MicControl,
}

impl<S: ChatSurface> ChatApp<S> {
    /// Load sessions from storage and build the application
    ///
    /// When storage held no sessions a fresh one is created and saved right
    /// away. Nothing is rendered; call [`ChatApp::render_all`] once the
    /// surface is ready.
    pub fn load(
        storage: SqliteStorage,
        client: Arc<dyn GenerationClient>,
        recognizer: Option<Arc<dyn SpeechRecognizer>>,
        surface: S,
    ) -> Self {
        let (store, synthesized) = SessionStore::from_loaded(storage.load());
        let app = Self {
            store,
            storage,
            client,
            recognizer,
            surface,
            pending: Vec::new(),
            next_pending_id: 0,
            mic: MicControl::new(),
        };
        if synthesized {
            app.persist();
        }
        tracing::info!(
            "Loaded {} sessions, active {}",
            app.store.len(),
            app.store.active_id()
        );
        app
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The generation client, for awaiting a reply outside of `&mut self`
    pub fn client(&self) -> Arc<dyn GenerationClient> {
        Arc::clone(&self.client)
    }

    /// Number of submissions waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn mic_state(&self) -> MicState {
        self.mic.state()
    }

    /// Whether a speech recognizer is configured
    pub fn speech_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Write the whole session list to storage
    ///
    /// Failures are logged; the in-memory model stays authoritative.
    pub fn persist(&self) {
        if let Err(e) = self.storage.save(self.store.sessions()) {
            log_save_failure(&e);
        }
    }

    /// Re-render both the conversation list and the message panel
    pub fn render_all(&mut self) {
        let sidebar = render::sidebar(&self.store);
        self.surface.show_sidebar(&sidebar);
        self.render_messages();
    }

    /// Re-render the message panel for the active session
    pub fn render_messages(&mut self) {
        let active = self.store.active_id().to_string();
        let loaders: Vec<i64> = self
            .pending
            .iter()
            .filter(|p| p.session_id == active)
            .map(|p| p.started_at)
            .collect();
        let panel = render::message_panel(self.store.active(), &loaders);
        self.surface.show_messages(&panel);
    }

    /// Start a new conversation and make it active
    pub fn new_chat(&mut self) -> String {
        let id = self.store.new_chat().id.clone();
        self.persist();
        self.render_all();
        tracing::info!("Started new chat {}", id);
        id
    }

    /// Make a conversation active
    ///
    /// Returns false when the id is unknown.
    pub fn select_chat(&mut self, id: &str) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.store.set_active(id);
        self.render_all();
        true
    }

    /// Delete a conversation after confirmation
    ///
    /// `confirm` is asked only for an existing id. Returns true when the
    /// conversation was removed.
    pub fn delete_chat(&mut self, id: &str, confirm: impl FnOnce() -> bool) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        if !confirm() {
            tracing::debug!("Deletion of {} cancelled", id);
            return false;
        }
        self.store.delete_session(id);
        self.persist();
        self.render_all();
        tracing::info!("Deleted chat {}", id);
        true
    }

    /// First phase of a text submission
    ///
    /// Returns `None` for empty input, which changes nothing.
    pub fn begin_text(&mut self, text: &str) -> Option<PendingReply> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.begin(text.to_string(), MessageType::Text)
    }

    /// First phase of an image submission
    pub fn begin_image(&mut self, data_url: String) -> Option<PendingReply> {
        if data_url.is_empty() {
            return None;
        }
        self.begin(data_url, MessageType::Image)
    }

    fn begin(&mut self, prompt: String, kind: MessageType) -> Option<PendingReply> {
        let session = self.store.active_mut()?;
        session.append_message(Role::User, prompt.clone(), kind);
        let session_id = session.id.clone();
        self.persist();
        self.render_all();

        self.next_pending_id += 1;
        let pending = PendingReply {
            id: self.next_pending_id,
            session_id,
            kind,
            prompt,
            started_at: now_millis(),
        };
        self.pending.push(pending.clone());
        self.render_messages();
        Some(pending)
    }

    /// Last phase of a submission
    ///
    /// Removes the loader and records the reply, or the apology when the
    /// request failed. Never returns an error.
    ///
    /// The reply is drawn before it is saved, and nothing is logged until
    /// the loader is gone from the surface: a terminal surface shares the
    /// screen with the log output.
    ///
    /// # Arguments
    ///
    /// * `pending` - The reply handle returned by `begin_text` or `begin_image`
    /// * `result` - What the generation client returned for its prompt
    ///
    /// # Returns
    ///
    /// The reply text, or the apology that was recorded in its place
    pub fn finish_submission(
        &mut self,
        pending: PendingReply,
        result: Result<String>,
    ) -> SubmissionOutcome {
        self.pending.retain(|p| p.id != pending.id);

        let (outcome, failure) = match result {
            Ok(reply) => (SubmissionOutcome::Replied(reply), None),
            Err(e) => (
                SubmissionOutcome::Failed(pending.apology().to_string()),
                Some(e),
            ),
        };

        let delivered = match self.store.get_mut(&pending.session_id) {
            Some(session) => {
                session.append_message(Role::Bot, outcome.text(), MessageType::Text);
                true
            }
            None => false,
        };
        // Draw before saving: storage logs too.
        self.render_all();

        let saved = if delivered {
            self.storage.save(self.store.sessions())
        } else {
            Ok(())
        };

        tracing::debug!(
            "Reply for session {} ({:?} prompt, {} chars) finished in {} ms",
            pending.session_id,
            pending.kind,
            pending.prompt.chars().count(),
            now_millis() - pending.started_at
        );
        if let Some(e) = failure {
            tracing::error!(
                "Generation failed for session {}: {:#}",
                pending.session_id,
                e
            );
        }
        if !delivered {
            tracing::warn!(
                "Session {} was deleted before its reply arrived",
                pending.session_id
            );
        }
        if let Err(e) = saved {
            log_save_failure(&e);
        }
        outcome
    }

    async fn complete(&mut self, pending: PendingReply) -> SubmissionOutcome {
        let client = self.client();
        let result = client.generate(pending.prompt()).await;
        self.finish_submission(pending, result)
    }

    /// Submit text and wait for the reply
    pub async fn submit_text(&mut self, text: &str) -> Option<SubmissionOutcome> {
        let pending = self.begin_text(text)?;
        Some(self.complete(pending).await)
    }

    /// Submit an image data URL and wait for the reply
    pub async fn submit_image(&mut self, data_url: String) -> Option<SubmissionOutcome> {
        let pending = self.begin_image(data_url)?;
        Some(self.complete(pending).await)
    }

    /// Read an image file and submit it
    ///
    /// An unreadable or unsupported file is reported as a notice and
    /// nothing is submitted.
    pub async fn submit_image_file(&mut self, path: &Path) -> Option<SubmissionOutcome> {
        match read_image_as_data_url(path).await {
            Ok(data_url) => self.submit_image(data_url).await,
            Err(e) => {
                tracing::warn!("Rejected image {}: {}", path.display(), e);
                self.surface
                    .show_notice(&format!("Could not use {}: {}", path.display(), e));
                None
            }
        }
    }

    /// Flip the microphone control
    ///
    /// Returns `None` and shows the unsupported notice when there is no
    /// recognizer.
    pub fn toggle_mic(&mut self) -> Option<MicAction> {
        match self.mic.toggle(self.recognizer.is_some()) {
            Ok(action) => Some(action),
            Err(e) => {
                tracing::debug!("Microphone toggle ignored: {}", e);
                self.surface.show_notice(VOICE_UNSUPPORTED_MESSAGE);
                None
            }
        }
    }

    /// Listen for one utterance and submit it as text
    ///
    /// Listening ends on a result, on a recognizer error, or when `stop`
    /// resolves. Only a result leads to a submission.
    pub async fn listen_and_submit<F>(&mut self, stop: F) -> Option<SubmissionOutcome>
    where
        F: Future<Output = ()>,
    {
        if self.toggle_mic() != Some(MicAction::Start) {
            return None;
        }
        let Some(recognizer) = self.recognizer.clone() else {
            self.mic.finish();
            return None;
        };

        self.surface.show_notice("Listening... (Ctrl-C to stop)");
        // A stop wins over a recognizer that ended at the same moment, such
        // as one killed by the same Ctrl-C.
        let heard = tokio::select! {
            biased;
            _ = stop => {
                tracing::debug!("Listening stopped by user");
                Ok(None)
            }
            result = recognizer.recognize() => result,
        };
        self.mic.finish();

        match heard {
            Ok(Some(text)) => {
                tracing::debug!("Recognized {} chars", text.len());
                self.submit_text(&text).await
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Speech recognition failed: {:#}", e);
                self.surface.show_notice(VOICE_FAILED_MESSAGE);
                None
            }
        }
    }

    /// Resolve a selector and fail with a readable error when it matches nothing
    pub fn require_session(&self, selector: &str) -> Result<&Session> {
        self.store
            .resolve(selector)
            .and_then(|id| self.store.get(&id))
            .ok_or_else(|| {
                HcChatError::Storage(format!("no conversation matches '{}'", selector)).into()
            })
    }
}

fn log_save_failure(e: &anyhow::Error) {
    tracing::error!("Failed to save sessions: {:#}", e);
}
