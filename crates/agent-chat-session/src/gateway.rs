//! Remote agent gateway.

use std::sync::Arc;

use agent_chat_core::{
    FrameStream, GatewayError, QueryRequest, Session, SessionId, SessionSummary, StreamFragment,
    Transport, protocol,
};
use futures::stream::BoxStream;

use crate::aggregator::{self, Reply};

/// Session operations against the remote agent.
///
/// Stateless: every call goes to the service, and every failure comes back
/// as a typed [`GatewayError`]. The transport strategy is fixed at
/// construction.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
}

impl Gateway {
    /// Create a gateway over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Request a new session for `user_id`.
    ///
    /// # Errors
    /// Fails on transport failure, non-success status, or a response
    /// without a session id.
    pub async fn create_session(&self, user_id: &str) -> Result<SessionId, GatewayError> {
        let result = async {
            let body = self.transport.query(&QueryRequest::create_session(user_id)).await?;
            protocol::decode_created(body)
        }
        .await;

        match &result {
            Ok(id) => tracing::info!(user_id, session_id = %id, "Created session"),
            Err(e) => tracing::warn!(user_id, "Error creating session: {e}"),
        }
        result
    }

    /// List the user's sessions. An empty list is a valid answer.
    ///
    /// # Errors
    /// Fails on transport failure or an unexpected response shape.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, GatewayError> {
        let result = async {
            let body = self.transport.query(&QueryRequest::list_sessions(user_id)).await?;
            protocol::decode_session_list(body)
        }
        .await;

        match &result {
            Ok(sessions) => tracing::debug!(user_id, count = sessions.len(), "Listed sessions"),
            Err(e) => tracing::warn!(user_id, "Error fetching sessions: {e}"),
        }
        result
    }

    /// Fetch a session with its event log.
    ///
    /// # Errors
    /// Returns `NotFound` if the service has no such session and `Protocol`
    /// if the response is not a session object.
    pub async fn get_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Session, GatewayError> {
        let result = async {
            let body = self
                .transport
                .query(&QueryRequest::get_session(user_id, session_id))
                .await?;
            protocol::decode_session(body, session_id)
        }
        .await;

        match &result {
            Ok(session) => tracing::debug!(
                user_id,
                session_id,
                events = session.events.len(),
                "Fetched session"
            ),
            Err(e) => tracing::warn!(user_id, session_id, "Error fetching session details: {e}"),
        }
        result
    }

    /// Delete a session. Any success status counts; the body is ignored.
    ///
    /// # Errors
    /// Fails on transport failure or non-success status.
    pub async fn delete_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), GatewayError> {
        let result = self
            .transport
            .execute(&QueryRequest::delete_session(user_id, session_id))
            .await;

        match &result {
            Ok(()) => tracing::info!(user_id, session_id, "Deleted session"),
            Err(e) => tracing::warn!(user_id, session_id, "Error deleting session: {e}"),
        }
        result
    }

    /// Send a message and return the raw reply frames.
    ///
    /// The service appends the user and agent events itself; nothing is
    /// recorded locally.
    ///
    /// # Errors
    /// Fails if the stream cannot be opened.
    pub async fn send_message(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<FrameStream, GatewayError> {
        tracing::debug!(user_id, session_id, "Sending message");
        self.transport
            .stream_query(&QueryRequest::stream_query(user_id, session_id, text))
            .await
            .inspect_err(|e| tracing::warn!(user_id, session_id, "Error sending message: {e}"))
    }

    /// Send a message and yield reply fragments as frames arrive.
    ///
    /// # Errors
    /// Fails if the stream cannot be opened. Mid-stream failures arrive as
    /// the final `Err` item.
    pub async fn stream_reply(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<BoxStream<'static, Result<StreamFragment, GatewayError>>, GatewayError> {
        let frames = self.send_message(user_id, session_id, text).await?;
        Ok(aggregator::fragment_stream(frames))
    }

    /// Send a message and collect the whole reply.
    ///
    /// # Errors
    /// Fails if the stream cannot be opened. An interruption after opening
    /// is reported in [`Reply::interrupted`] instead.
    pub async fn send_and_collect(
        &self,
        user_id: &str,
        session_id: &str,
        text: &str,
    ) -> Result<Reply, GatewayError> {
        let frames = self.send_message(user_id, session_id, text).await?;
        Ok(aggregator::collect(frames).await)
    }
}
