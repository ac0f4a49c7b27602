//! Wire envelopes for the remote agent endpoint.
//!
//! Requests are `{"class_method": ..., "input": {...}}`. Non-streaming
//! responses wrap their payload in `output`; the streaming response is
//! newline-delimited JSON, one [`RawFrame`] per line.

use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    GatewayError,
    model::{Content, Session, SessionId, SessionSummary, null_as_default},
};

/// Operation discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassMethod {
    #[serde(rename = "async_create_session")]
    CreateSession,
    #[serde(rename = "async_list_sessions")]
    ListSessions,
    #[serde(rename = "async_get_session")]
    GetSession,
    #[serde(rename = "async_delete_session")]
    DeleteSession,
    #[serde(rename = "async_stream_query")]
    StreamQuery,
}

impl ClassMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateSession => "async_create_session",
            Self::ListSessions => "async_list_sessions",
            Self::GetSession => "async_get_session",
            Self::DeleteSession => "async_delete_session",
            Self::StreamQuery => "async_stream_query",
        }
    }

    /// Whether the operation answers with a frame stream.
    #[must_use]
    pub const fn is_streaming(self) -> bool {
        matches!(self, Self::StreamQuery)
    }
}

/// `input` object of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryInput {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub class_method: ClassMethod,
    pub input: QueryInput,
}

impl QueryRequest {
    #[must_use]
    pub fn create_session(user_id: &str) -> Self {
        Self::new(ClassMethod::CreateSession, user_id, None, None)
    }

    #[must_use]
    pub fn list_sessions(user_id: &str) -> Self {
        Self::new(ClassMethod::ListSessions, user_id, None, None)
    }

    #[must_use]
    pub fn get_session(user_id: &str, session_id: &str) -> Self {
        Self::new(ClassMethod::GetSession, user_id, Some(session_id), None)
    }

    #[must_use]
    pub fn delete_session(user_id: &str, session_id: &str) -> Self {
        Self::new(ClassMethod::DeleteSession, user_id, Some(session_id), None)
    }

    #[must_use]
    pub fn stream_query(user_id: &str, session_id: &str, message: &str) -> Self {
        Self::new(
            ClassMethod::StreamQuery,
            user_id,
            Some(session_id),
            Some(message),
        )
    }

    fn new(
        class_method: ClassMethod,
        user_id: &str,
        session_id: Option<&str>,
        message: Option<&str>,
    ) -> Self {
        Self {
            class_method,
            input: QueryInput {
                user_id: user_id.to_string(),
                session_id: session_id.map(str::to_string),
                message: message.map(str::to_string),
            },
        }
    }
}

/// `output` of create-session.
#[derive(Debug, Clone, Deserialize)]
struct CreatedSession {
    id: SessionId,
}

/// `output` of list-sessions.
#[derive(Debug, Clone, Deserialize)]
struct SessionList {
    #[serde(default, deserialize_with = "null_as_default")]
    sessions: Vec<SessionSummary>,
}

/// Extract the `output` field of a response body.
///
/// # Errors
/// Returns `Protocol` if the body is not an object carrying `output`.
pub fn take_output(body: Value) -> Result<Value, GatewayError> {
    match body {
        Value::Object(mut map) => map
            .remove("output")
            .ok_or_else(|| GatewayError::Protocol("response has no `output` field".to_string())),
        other => Err(GatewayError::Protocol(format!(
            "expected a JSON object response, got {}",
            value_type_name(&other)
        ))),
    }
}

fn decode<T: DeserializeOwned>(output: Value, what: &str) -> Result<T, GatewayError> {
    serde_json::from_value(output)
        .map_err(|e| GatewayError::Protocol(format!("malformed {what}: {e}")))
}

/// Decode a create-session response into the new session id.
///
/// # Errors
/// Returns `Protocol` if the response lacks a non-empty `output.id`.
pub fn decode_created(body: Value) -> Result<SessionId, GatewayError> {
    let created: CreatedSession = decode(take_output(body)?, "create-session output")?;
    if created.id.trim().is_empty() {
        return Err(GatewayError::Protocol("created session has an empty id".to_string()));
    }
    Ok(created.id)
}

/// Decode a list-sessions response.
///
/// # Errors
/// Returns `Protocol` on an unexpected shape.
pub fn decode_session_list(body: Value) -> Result<Vec<SessionSummary>, GatewayError> {
    let list: SessionList = decode(take_output(body)?, "list-sessions output")?;
    Ok(list.sessions)
}

/// Decode a get-session response.
///
/// A null or empty `output` means the service has no such session.
///
/// # Errors
/// Returns `NotFound` for an empty output and `Protocol` on an unexpected shape.
pub fn decode_session(body: Value, session_id: &str) -> Result<Session, GatewayError> {
    let output = take_output(body)?;
    let empty = match &output {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Err(GatewayError::NotFound(session_id.to_string()));
    }
    decode(output, "session")
}

const fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One undecoded line of a streaming response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Bytes);

impl RawFrame {
    #[must_use]
    pub fn new(line: impl Into<Bytes>) -> Self {
        Self(line.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode this line as a stream frame.
    ///
    /// # Errors
    /// Returns the JSON error for partial, keep-alive or otherwise malformed lines.
    pub fn decode(&self) -> Result<StreamFrame, serde_json::Error> {
        serde_json::from_slice(&self.0)
    }
}

impl From<&str> for RawFrame {
    fn from(line: &str) -> Self {
        Self(Bytes::copy_from_slice(line.as_bytes()))
    }
}

impl From<String> for RawFrame {
    fn from(line: String) -> Self {
        Self(Bytes::from(line))
    }
}

/// Decoded stream frame. Only the content block matters to the client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}
