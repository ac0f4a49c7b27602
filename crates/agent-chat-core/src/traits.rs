//! Core traits for transports and credentials.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::{GatewayError, QueryRequest, RawFrame};

/// Frames of a streaming response, in arrival order.
///
/// An `Err` item reports a transport interruption and ends the stream.
pub type FrameStream = BoxStream<'static, Result<RawFrame, GatewayError>>;

/// Trait for ways of reaching the remote agent service.
///
/// Implementations only move envelopes; decoding stays with the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a non-streaming call and return the raw response body.
    async fn query(&self, request: &QueryRequest) -> Result<Value, GatewayError>;

    /// Perform a non-streaming call whose only outcome is success or
    /// failure. The response body is not inspected.
    async fn execute(&self, request: &QueryRequest) -> Result<(), GatewayError> {
        self.query(request).await.map(drop)
    }

    /// Open a streaming call.
    ///
    /// Errors returned here mean the stream could not be opened at all.
    async fn stream_query(&self, request: &QueryRequest) -> Result<FrameStream, GatewayError>;
}

/// Supplies the bearer credential attached to every request.
///
/// Acquisition and refresh are the provider's business.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current access token.
    async fn token(&self) -> Result<String, GatewayError>;
}
