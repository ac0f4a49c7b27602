//! HTTP transport against a mock agent endpoint.

use std::sync::Arc;

use agent_chat_core::{ErrorKind, GatewayConfig, GatewayError, QueryRequest, RawFrame, Transport};
use agent_chat_transport::{HttpTransport, StaticToken};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESOURCE: &str = "projects/demo/locations/us-central1/reasoningEngines/7";

fn transport(server: &MockServer) -> HttpTransport {
    let config = GatewayConfig::new(RESOURCE, "us-central1").with_base_url(server.uri());
    HttpTransport::new(config, Arc::new(StaticToken::new("test-token"))).expect("transport")
}

#[tokio::test]
async fn query_posts_envelope_with_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/{RESOURCE}:query")))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(body_json(json!({
            "class_method": "async_create_session",
            "input": {"user_id": "u1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"output": {"id": "123"}})))
        .expect(1)
        .mount(&server)
        .await;

    let body = transport(&server)
        .query(&QueryRequest::create_session("u1"))
        .await
        .expect("query");
    assert_eq!(body, json!({"output": {"id": "123"}}));
}

#[tokio::test]
async fn query_maps_404_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/{RESOURCE}:query")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Session gone not found.", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let err = transport(&server)
        .query(&QueryRequest::get_session("u1", "gone"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("Session gone not found."));
}

#[tokio::test]
async fn query_reports_server_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .query(&QueryRequest::list_sessions("u1"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 500, .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn query_rejects_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .query(&QueryRequest::list_sessions("u1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn stream_query_yields_lines() {
    let server = MockServer::start().await;

    let body = concat!(
        "{\"content\":{\"parts\":[{\"text\":\"Chicago\"}]}}\n",
        "\n",
        "{\"content\":{\"parts\":[{\"text\":\" is in Illinois.\"}]}}\n",
    );
    Mock::given(method("POST"))
        .and(path(format!("/v1/{RESOURCE}:streamQuery")))
        .and(body_json(json!({
            "class_method": "async_stream_query",
            "input": {"user_id": "u1", "session_id": "s1", "message": "Tell me about Chicago"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let frames: Vec<RawFrame> = transport(&server)
        .stream_query(&QueryRequest::stream_query("u1", "s1", "Tell me about Chicago"))
        .await
        .expect("stream")
        .map(|item| item.expect("frame"))
        .collect()
        .await;

    assert_eq!(frames.len(), 2);
    assert!(frames[1].decode().is_ok());
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let config =
        GatewayConfig::new(RESOURCE, "us-central1").with_base_url("http://127.0.0.1:9");
    let transport =
        HttpTransport::new(config, Arc::new(StaticToken::new("t"))).expect("transport");

    let err = transport
        .query(&QueryRequest::list_sessions("u1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn execute_accepts_empty_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/v1/{RESOURCE}:query")))
        .and(body_json(json!({
            "class_method": "async_delete_session",
            "input": {"user_id": "u1", "session_id": "s1"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    transport(&server)
        .execute(&QueryRequest::delete_session("u1", "s1"))
        .await
        .expect("delete");
}

#[tokio::test]
async fn execute_still_reports_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .execute(&QueryRequest::delete_session("u1", "s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Status { status: 403, .. }));
}

#[tokio::test]
async fn query_empty_body_is_null() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body = transport(&server)
        .query(&QueryRequest::list_sessions("u1"))
        .await
        .expect("query");
    assert!(body.is_null());
}
