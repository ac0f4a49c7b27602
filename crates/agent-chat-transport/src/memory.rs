//! In-process agent service.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{SystemTime, UNIX_EPOCH},
};

use agent_chat_core::{
    ClassMethod, Content, Event, FrameStream, GatewayError, Part, QueryRequest, RawFrame, Session,
    SessionId, StreamFrame, Transport,
};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};
use uuid::Uuid;

/// Produces the agent's reply chunks for a user message.
pub type Responder = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Author tag recorded on agent events.
pub const AGENT_AUTHOR: &str = "agent";

/// In-memory agent service speaking the same wire contract as the HTTP
/// endpoint.
///
/// Useful for development, offline demos and tests. Data is lost on drop.
pub struct MemoryTransport {
    sessions: RwLock<HashMap<String, Vec<Session>>>,
    responder: Responder,
}

impl MemoryTransport {
    /// Create a service whose agent echoes the user's message.
    #[must_use]
    pub fn new() -> Self {
        Self::with_responder(Arc::new(|message: &str| vec![format!("You said: {message}")]))
    }

    /// Create a service with a custom agent.
    #[must_use]
    pub fn with_responder(responder: Responder) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            responder,
        }
    }

    /// Ids of the sessions a user currently has.
    #[must_use]
    pub fn session_ids(&self, user_id: &str) -> Vec<SessionId> {
        self.sessions
            .read()
            .map(|s| {
                s.get(user_id)
                    .map(|list| list.iter().map(|s| s.id.clone()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn create(&self, user_id: &str) -> Result<Value, GatewayError> {
        let session = Session {
            id: Uuid::new_v4().simple().to_string(),
            user_id: Some(user_id.to_string()),
            last_update_time: Some(now()),
            events: Vec::new(),
        };
        let id = session.id.clone();

        self.sessions
            .write()
            .map_err(|e| GatewayError::Transport(e.to_string()))?
            .entry(user_id.to_string())
            .or_default()
            .push(session);

        Ok(json!({ "output": { "id": id } }))
    }

    fn list(&self, user_id: &str) -> Result<Value, GatewayError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let summaries: Vec<_> = sessions
            .get(user_id)
            .map(|list| list.iter().map(Session::summary).collect())
            .unwrap_or_default();

        Ok(json!({ "output": { "sessions": summaries } }))
    }

    fn get(&self, user_id: &str, session_id: &str) -> Result<Value, GatewayError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let session = sessions
            .get(user_id)
            .and_then(|list| list.iter().find(|s| s.id == session_id))
            .ok_or_else(|| GatewayError::NotFound(session_id.to_string()))?;

        Ok(json!({ "output": session }))
    }

    fn delete(&self, user_id: &str, session_id: &str) -> Result<Value, GatewayError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let list = sessions
            .get_mut(user_id)
            .ok_or_else(|| GatewayError::NotFound(session_id.to_string()))?;
        let before = list.len();
        list.retain(|s| s.id != session_id);
        if list.len() == before {
            return Err(GatewayError::NotFound(session_id.to_string()));
        }

        Ok(json!({ "output": null }))
    }

    /// Append the user event and one agent event per reply chunk, returning
    /// the agent events as frames.
    fn converse(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<Vec<RawFrame>, GatewayError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let session = sessions
            .get_mut(user_id)
            .and_then(|list| list.iter_mut().find(|s| s.id == session_id))
            .ok_or_else(|| GatewayError::NotFound(session_id.to_string()))?;

        session.events.push(Event::text("user", "user", message));

        let mut frames = Vec::new();
        for chunk in (self.responder)(message) {
            let event = Event {
                author: Some(AGENT_AUTHOR.to_string()),
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::text(chunk.clone())],
                }),
            };
            session.events.push(event);

            let frame = StreamFrame {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part::text(chunk)],
                }),
            };
            frames.push(RawFrame::from(serde_json::to_string(&frame)?));
        }
        session.last_update_time = Some(now());

        Ok(frames)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn require<'a>(field: Option<&'a String>, name: &str) -> Result<&'a str, GatewayError> {
    field
        .map(String::as_str)
        .ok_or_else(|| GatewayError::Protocol(format!("request input has no `{name}`")))
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn query(&self, request: &QueryRequest) -> Result<Value, GatewayError> {
        let input = &request.input;
        match request.class_method {
            ClassMethod::CreateSession => self.create(&input.user_id),
            ClassMethod::ListSessions => self.list(&input.user_id),
            ClassMethod::GetSession => {
                self.get(&input.user_id, require(input.session_id.as_ref(), "session_id")?)
            }
            ClassMethod::DeleteSession => {
                self.delete(&input.user_id, require(input.session_id.as_ref(), "session_id")?)
            }
            ClassMethod::StreamQuery => Err(GatewayError::Protocol(
                "async_stream_query must be sent to the streaming endpoint".to_string(),
            )),
        }
    }

    async fn stream_query(&self, request: &QueryRequest) -> Result<FrameStream, GatewayError> {
        let input = &request.input;
        if request.class_method != ClassMethod::StreamQuery {
            return Err(GatewayError::Protocol(format!(
                "{} is not a streaming method",
                request.class_method.as_str()
            )));
        }
        let frames = self.converse(
            &input.user_id,
            require(input.session_id.as_ref(), "session_id")?,
            require(input.message.as_ref(), "message")?,
        )?;
        Ok(futures::stream::iter(frames.into_iter().map(Ok)).boxed())
    }
}
