//! End-to-end chat flows against in-process transports.

use std::sync::Arc;

use agent_chat_core::{
    ErrorKind, FrameStream, GatewayError, QueryRequest, RawFrame, Role, StreamFragment, Transport,
};
use agent_chat_session::{
    ChatController, ChatState, ConversationView, Gateway, Notice, UserAction, ViewUpdate,
};
use agent_chat_transport::{MemoryTransport, frames_from_bytes};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;

/// Delegates sessions to a memory service but answers every send with a
/// fixed byte script.
struct ScriptedTransport {
    sessions: MemoryTransport,
    script: Vec<Result<&'static str, &'static str>>,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn query(&self, request: &QueryRequest) -> Result<Value, GatewayError> {
        self.sessions.query(request).await
    }

    async fn stream_query(&self, _request: &QueryRequest) -> Result<FrameStream, GatewayError> {
        let chunks: Vec<Result<Bytes, std::io::Error>> = self
            .script
            .iter()
            .map(|item| match item {
                Ok(text) => Ok(Bytes::from_static(text.as_bytes())),
                Err(reason) => Err(std::io::Error::other(*reason)),
            })
            .collect();
        Ok(frames_from_bytes(futures::stream::iter(chunks)))
    }
}

/// Every call fails at the transport level.
struct DownTransport;

#[async_trait]
impl Transport for DownTransport {
    async fn query(&self, _request: &QueryRequest) -> Result<Value, GatewayError> {
        Err(GatewayError::Transport("connection refused".to_string()))
    }

    async fn stream_query(&self, _request: &QueryRequest) -> Result<FrameStream, GatewayError> {
        Err(GatewayError::Transport("connection refused".to_string()))
    }
}

fn scripted(script: Vec<Result<&'static str, &'static str>>) -> ChatController {
    ChatController::new(Gateway::new(Arc::new(ScriptedTransport {
        sessions: MemoryTransport::new(),
        script,
    })))
}

fn reply_texts(updates: &[ViewUpdate]) -> Vec<String> {
    updates
        .iter()
        .find_map(|u| match u {
            ViewUpdate::Reply(fragments) => {
                Some(fragments.iter().map(|f| f.as_str().to_string()).collect())
            }
            _ => None,
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn chicago_reply_skips_malformed_line() {
    let controller = scripted(vec![
        Ok("{\"content\":{\"parts\":[{\"text\":\"Chicago\"}]}}\n"),
        Ok("{\"content\":{\"par\n"),
        Ok("{\"content\":{\"parts\":[{\"text\":\" is in Illinois.\"}]}}\n"),
    ]);

    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;

    let mut live = Vec::new();
    let (_, updates) = controller
        .send_streaming(state, "Tell me about Chicago", |f| live.push(f.clone()))
        .await;

    assert_eq!(reply_texts(&updates), vec!["Chicago", " is in Illinois."]);
    assert_eq!(
        live,
        vec![StreamFragment::new("Chicago"), StreamFragment::new(" is in Illinois.")]
    );
}

#[tokio::test]
async fn interrupted_stream_keeps_received_fragments() {
    let controller = scripted(vec![
        Ok("{\"content\":{\"parts\":[{\"text\":\"Chic\"}]}}\n{\"content\""),
        Err("connection reset by peer"),
    ]);
    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;

    let (_, updates) = controller
        .handle(state, UserAction::SendText("hi".into()))
        .await;

    assert_eq!(reply_texts(&updates), vec!["Chic"]);
    assert!(updates.iter().any(|u| matches!(
        u,
        ViewUpdate::Notice(Notice { kind: Some(ErrorKind::Transport), .. })
    )));
}

#[tokio::test]
async fn blank_reply_is_no_response() {
    let controller = scripted(vec![Ok("\n{\"content\":{\"parts\":[{\"text\":\"  \"}]}}\n")]);
    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;

    let (_, updates) = controller
        .handle(state, UserAction::SendText("hi".into()))
        .await;
    assert_eq!(updates, vec![ViewUpdate::NoResponse]);
}

#[tokio::test]
async fn conversation_round_trip() {
    let controller = ChatController::new(Gateway::new(Arc::new(MemoryTransport::with_responder(
        Arc::new(|_: &str| vec!["Y".to_string()]),
    ))));

    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;
    let (state, updates) = controller
        .handle(state, UserAction::SendText("X".into()))
        .await;
    assert_eq!(reply_texts(&updates), vec!["Y"]);

    let (_, updates) = controller.handle(state, UserAction::LoadHistory).await;
    let [ViewUpdate::Conversation(ConversationView::Messages(transcript))] = &updates[..] else {
        panic!("expected a transcript, got {updates:?}");
    };
    let messages: Vec<_> = transcript
        .iter()
        .map(|m| (m.role, m.text.as_str()))
        .collect();
    assert_eq!(messages, vec![(Role::User, "X"), (Role::Assistant, "Y")]);
}

#[tokio::test]
async fn deleting_selected_session_clears_selection() {
    let controller = ChatController::new(Gateway::new(Arc::new(MemoryTransport::new())));

    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;
    let (state, _) = controller.handle(state, UserAction::CreateSession).await;
    let deleted = state.selected_session.clone().expect("selected");

    let (state, updates) = controller.handle(state, UserAction::ShowSessions).await;
    assert!(matches!(&updates[..], [ViewUpdate::Sessions(list)] if list.len() == 2));

    let (state, updates) = controller
        .handle(state, UserAction::DeleteSession(deleted.clone()))
        .await;
    assert_eq!(updates, vec![ViewUpdate::SessionDeleted(deleted.clone())]);
    assert!(state.selected_session.is_none());
    assert!(state.directory.is_stale());

    let (state, updates) = controller.handle(state, UserAction::ShowSessions).await;
    let [ViewUpdate::Sessions(list)] = &updates[..] else {
        panic!("expected sessions, got {updates:?}");
    };
    assert_eq!(list.len(), 1);
    assert!(!state.directory.contains(&deleted));
}

#[tokio::test]
async fn deleting_other_session_keeps_selection() {
    let controller = ChatController::new(Gateway::new(Arc::new(MemoryTransport::new())));

    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;
    let other = state.selected_session.clone().expect("selected");
    let (state, _) = controller.handle(state, UserAction::CreateSession).await;
    let current = state.selected_session.clone();

    let (state, _) = controller.handle(state, UserAction::DeleteSession(other)).await;
    assert_eq!(state.selected_session, current);
}

#[tokio::test]
async fn missing_session_keeps_selection() {
    let controller = ChatController::new(Gateway::new(Arc::new(MemoryTransport::new())));

    let (state, _) = controller
        .handle(
            ChatState::for_user("u1"),
            UserAction::SelectSession("missing".to_string()),
        )
        .await;
    let (state, updates) = controller.handle(state, UserAction::LoadHistory).await;

    assert_eq!(state.selected_session.as_deref(), Some("missing"));
    assert!(matches!(
        &updates[..],
        [ViewUpdate::Notice(Notice { kind: Some(ErrorKind::NotFound), .. })]
    ));
}

#[tokio::test]
async fn failed_delete_leaves_state_unchanged() {
    let controller = ChatController::new(Gateway::new(Arc::new(MemoryTransport::new())));

    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;
    let (state, _) = controller.handle(state, UserAction::ShowSessions).await;
    let selected = state.selected_session.clone();

    let (state, updates) = controller
        .handle(state, UserAction::DeleteSession("missing".to_string()))
        .await;
    assert_eq!(state.selected_session, selected);
    assert!(!state.directory.is_stale());
    assert!(matches!(&updates[..], [ViewUpdate::Notice(_)]));
}

#[tokio::test]
async fn service_down_degrades_without_panicking() {
    let controller = ChatController::new(Gateway::new(Arc::new(DownTransport)));
    let mut state = ChatState::for_user("u1");
    state.selected_session = Some("s1".to_string());

    let (state, updates) = controller.handle(state, UserAction::ShowSessions).await;
    assert!(matches!(&updates[..], [ViewUpdate::Notice(_)]));
    assert!(state.directory.is_stale());
    assert!(state.directory.entries().is_empty());

    let (state, updates) = controller.handle(state, UserAction::CreateSession).await;
    assert!(matches!(&updates[..], [ViewUpdate::Notice(_)]));
    assert_eq!(state.selected_session.as_deref(), Some("s1"));

    let (_, updates) = controller
        .handle(state, UserAction::SendText("hi".into()))
        .await;
    assert!(matches!(
        &updates[..],
        [ViewUpdate::Notice(_), ViewUpdate::NoResponse]
    ));
}

#[tokio::test]
async fn gateway_fragment_stream_is_ordered() {
    let transport = Arc::new(MemoryTransport::with_responder(Arc::new(|_: &str| {
        vec!["one".to_string(), "two".to_string(), "three".to_string()]
    })));
    let gateway = Gateway::new(transport);
    let id = gateway.create_session("u1").await.expect("create");

    let fragments: Vec<String> = gateway
        .stream_reply("u1", &id, "count")
        .await
        .expect("stream")
        .map(|f| f.expect("fragment").into_string())
        .collect()
        .await;
    assert_eq!(fragments, vec!["one", "two", "three"]);

    let raw: Vec<RawFrame> = gateway
        .send_message("u1", &id, "again")
        .await
        .expect("send")
        .map(|f| f.expect("frame"))
        .collect()
        .await;
    assert_eq!(raw.len(), 3);
}

#[tokio::test]
async fn refresh_relists_even_when_directory_is_fresh() {
    let controller = ChatController::new(Gateway::new(Arc::new(MemoryTransport::new())));

    let (state, _) = controller
        .handle(ChatState::for_user("u1"), UserAction::CreateSession)
        .await;
    let (state, _) = controller.handle(state, UserAction::ShowSessions).await;
    assert!(!state.directory.is_stale());

    let outside = controller.gateway().create_session("u1").await.expect("create");

    let (state, updates) = controller.handle(state, UserAction::ShowSessions).await;
    assert!(matches!(&updates[..], [ViewUpdate::Sessions(list)] if list.len() == 1));
    assert!(!state.directory.contains(&outside));

    let (state, updates) = controller.handle(state, UserAction::RefreshSessions).await;
    assert!(matches!(&updates[..], [ViewUpdate::Sessions(list)] if list.len() == 2));
    assert!(state.directory.contains(&outside));
    assert!(!state.directory.is_stale());
}
