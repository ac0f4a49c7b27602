//! Chat controller: applies display actions to explicit application state.
//!
//! Each handler takes the current [`ChatState`] and returns the next one
//! together with the updates the display should render. A failed remote
//! call produces a [`Notice`] and leaves the state as it was, except for
//! what that call was responsible for changing.

use agent_chat_core::{ErrorKind, GatewayError, SessionId, SessionSummary, StreamFragment};
use futures::StreamExt;
use uuid::Uuid;

use crate::{Gateway, SessionDirectory, Transcript};

/// State owned by the single active conversation flow.
#[derive(Debug, Clone)]
pub struct ChatState {
    /// Stable for the lifetime of the client instance.
    pub user_id: String,
    pub selected_session: Option<SessionId>,
    pub directory: SessionDirectory,
}

impl ChatState {
    /// State for a freshly generated user id.
    #[must_use]
    pub fn new() -> Self {
        Self::for_user(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            selected_session: None,
            directory: SessionDirectory::new(),
        }
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs from the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    CreateSession,
    SelectSession(SessionId),
    DeleteSession(SessionId),
    SendText(String),
    /// Show the directory, refreshing only if it is stale.
    ShowSessions,
    /// Re-list sessions unconditionally.
    RefreshSessions,
    /// Load the selected session's transcript.
    LoadHistory,
}

/// What a loaded session has to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationView {
    /// No messages yet; prompt for the first input.
    Empty,
    Messages(Transcript),
}

impl From<Transcript> for ConversationView {
    fn from(transcript: Transcript) -> Self {
        if transcript.is_empty() {
            Self::Empty
        } else {
            Self::Messages(transcript)
        }
    }
}

/// Short diagnostic for the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Failure class, if the notice reports a gateway failure.
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Notice {
    fn from_error(context: &str, error: &GatewayError) -> Self {
        Self {
            kind: Some(error.kind()),
            message: format!("{context}: {error}"),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
        }
    }
}

/// Output for the display.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Sessions(Vec<SessionSummary>),
    SessionCreated(SessionId),
    SessionSelected(SessionId),
    SessionDeleted(SessionId),
    Conversation(ConversationView),
    /// Assistant reply fragments, in order.
    Reply(Vec<StreamFragment>),
    /// The agent sent nothing back.
    NoResponse,
    Notice(Notice),
}

/// Handles display actions over a [`Gateway`].
#[derive(Clone)]
pub struct ChatController {
    gateway: Gateway,
}

impl ChatController {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Apply one action.
    pub async fn handle(
        &self,
        state: ChatState,
        action: UserAction,
    ) -> (ChatState, Vec<ViewUpdate>) {
        match action {
            UserAction::CreateSession => self.create_session(state).await,
            UserAction::SelectSession(id) => {
                let mut state = state;
                state.selected_session = Some(id.clone());
                (state, vec![ViewUpdate::SessionSelected(id)])
            }
            UserAction::DeleteSession(id) => self.delete_session(state, id).await,
            UserAction::SendText(text) => self.send_streaming(state, &text, |_| {}).await,
            UserAction::ShowSessions => self.show_sessions(state, false).await,
            UserAction::RefreshSessions => self.show_sessions(state, true).await,
            UserAction::LoadHistory => self.load_history(state).await,
        }
    }

    async fn create_session(&self, mut state: ChatState) -> (ChatState, Vec<ViewUpdate>) {
        match self.gateway.create_session(&state.user_id).await {
            Ok(id) => {
                state.selected_session = Some(id.clone());
                state.directory.invalidate();
                (
                    state,
                    vec![ViewUpdate::SessionCreated(id.clone()), ViewUpdate::SessionSelected(id)],
                )
            }
            Err(e) => (state, vec![notice("Error creating session", &e)]),
        }
    }

    async fn delete_session(
        &self,
        mut state: ChatState,
        id: SessionId,
    ) -> (ChatState, Vec<ViewUpdate>) {
        match self.gateway.delete_session(&state.user_id, &id).await {
            Ok(()) => {
                if state.selected_session.as_deref() == Some(id.as_str()) {
                    state.selected_session = None;
                }
                state.directory.invalidate();
                (state, vec![ViewUpdate::SessionDeleted(id)])
            }
            Err(e) => (state, vec![notice("Error deleting session", &e)]),
        }
    }

    async fn show_sessions(
        &self,
        mut state: ChatState,
        force: bool,
    ) -> (ChatState, Vec<ViewUpdate>) {
        let result = if force {
            state.directory.refresh(&self.gateway, &state.user_id).await
        } else {
            state.directory.read(&self.gateway, &state.user_id).await
        };

        let update = match result {
            Ok(entries) => ViewUpdate::Sessions(entries.to_vec()),
            Err(e) => notice("Error fetching sessions", &e),
        };
        (state, vec![update])
    }

    async fn load_history(&self, state: ChatState) -> (ChatState, Vec<ViewUpdate>) {
        let Some(session_id) = state.selected_session.clone() else {
            return (state, vec![ViewUpdate::Notice(Notice::info("No chat selected."))]);
        };

        match self.gateway.get_session(&state.user_id, &session_id).await {
            Ok(session) => {
                let view = ConversationView::from(Transcript::from(&session));
                (state, vec![ViewUpdate::Conversation(view)])
            }
            Err(e) => (state, vec![notice("Could not load session details", &e)]),
        }
    }

    /// Send text to the selected session, calling `on_fragment` for each
    /// reply fragment as it arrives.
    ///
    /// The local state is not appended to; reload history to see the
    /// service's record of the exchange.
    pub async fn send_streaming<F>(
        &self,
        state: ChatState,
        text: &str,
        mut on_fragment: F,
    ) -> (ChatState, Vec<ViewUpdate>)
    where
        F: FnMut(&StreamFragment),
    {
        let Some(session_id) = state.selected_session.clone() else {
            return (
                state,
                vec![ViewUpdate::Notice(Notice::info(
                    "Start or select a chat before sending a message.",
                ))],
            );
        };
        if text.trim().is_empty() {
            return (state, Vec::new());
        }

        let mut stream = match self.gateway.stream_reply(&state.user_id, &session_id, text).await {
            Ok(stream) => stream,
            Err(e) => {
                return (
                    state,
                    vec![notice("Error sending message", &e), ViewUpdate::NoResponse],
                );
            }
        };

        let mut fragments = Vec::new();
        let mut interrupted = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    on_fragment(&fragment);
                    fragments.push(fragment);
                }
                Err(e) => {
                    interrupted = Some(e);
                    break;
                }
            }
        }

        let mut updates = vec![if fragments.is_empty() {
            ViewUpdate::NoResponse
        } else {
            ViewUpdate::Reply(fragments)
        }];
        if let Some(e) = interrupted {
            updates.push(notice("Reply interrupted", &e));
        }
        (state, updates)
    }
}

fn notice(context: &str, error: &GatewayError) -> ViewUpdate {
    ViewUpdate::Notice(Notice::from_error(context, error))
}
