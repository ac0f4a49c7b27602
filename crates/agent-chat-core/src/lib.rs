//! Core abstractions for remote agent chat sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `Session`, `Event`, `Part` - Records as stored by the remote agent service
//! - `Message`, `StreamFragment` - Client-side transcript and reply pieces
//! - `QueryRequest` - Wire envelopes for the agent endpoint
//! - `GatewayError` - Typed failures for every remote call
//! - `Transport` and `CredentialProvider` traits

pub mod config;
pub mod error;
pub mod model;
pub mod protocol;
pub mod traits;

pub use config::GatewayConfig;
pub use error::{ErrorKind, GatewayError};
pub use model::{
    Content, Event, Message, Part, Role, Session, SessionId, SessionSummary, StreamFragment,
};
pub use protocol::{ClassMethod, QueryInput, QueryRequest, RawFrame, StreamFrame};
pub use traits::{CredentialProvider, FrameStream, Transport};
