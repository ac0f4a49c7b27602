//! Transports for the remote agent endpoint.
//!
//! Provides:
//! - NDJSON line framing for streaming responses
//! - HTTP transport (feature: http)
//! - In-process agent service (feature: memory)
//! - Credential providers

pub mod credentials;
pub mod ndjson;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "memory")]
pub mod memory;

pub use credentials::{EnvToken, StaticToken};
pub use ndjson::{LineSplitter, frames_from_bytes};

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "memory")]
pub use memory::{MemoryTransport, Responder};
