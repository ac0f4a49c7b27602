//! Raw HTTP transport.

use std::sync::Arc;

use agent_chat_core::{
    CredentialProvider, FrameStream, GatewayConfig, GatewayError, QueryRequest, Transport,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::Deserialize;
use serde_json::Value;

use crate::ndjson::frames_from_bytes;

const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Transport posting JSON envelopes to the agent's `:query` and
/// `:streamQuery` endpoints.
pub struct HttpTransport {
    http: Client,
    config: GatewayConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport for a validated config.
    ///
    /// # Errors
    /// Returns `Config` for an invalid config and `Transport` if the HTTP
    /// client cannot be built.
    pub fn new(
        config: GatewayConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = config.user_agent.as_deref() {
            builder = builder.user_agent(user_agent);
        }
        let http = builder
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the POST for a request, fetching a fresh credential.
    ///
    /// # Errors
    /// Returns the credential provider's error.
    pub async fn build_request(
        &self,
        request: &QueryRequest,
    ) -> Result<RequestBuilder, GatewayError> {
        let url = if request.class_method.is_streaming() {
            self.config.stream_query_url()
        } else {
            self.config.query_url()
        };
        let token = self.credentials.token().await?;

        Ok(self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .bearer_auth(token)
            .json(request))
    }

    async fn send(&self, request: &QueryRequest) -> Result<Response, GatewayError> {
        tracing::debug!(
            method = request.class_method.as_str(),
            user_id = %request.input.user_id,
            "Sending agent request"
        );
        let response = self
            .build_request(request)
            .await?
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(status, &body);
        Err(GatewayError::from_status(status.as_u16(), message))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn query(&self, request: &QueryRequest) -> Result<Value, GatewayError> {
        let response = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn execute(&self, request: &QueryRequest) -> Result<(), GatewayError> {
        self.send(request).await.map(drop)
    }

    async fn stream_query(&self, request: &QueryRequest) -> Result<FrameStream, GatewayError> {
        let response = self.send(request).await?;
        Ok(frames_from_bytes(Box::pin(response.bytes_stream())))
    }
}

/// Google-style `{"error": {"message": ...}}` error body.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayloadFields {
    message: Option<String>,
}

fn parse_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let explicit = serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|p| p.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty());
    if let Some(message) = explicit {
        return message;
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}
