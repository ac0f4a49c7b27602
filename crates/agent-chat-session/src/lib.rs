//! Session and transcript engine for remote agents.
//!
//! Provides:
//! - `Gateway` - Session lifecycle and message sending over any transport
//! - `aggregator` - Reduce streamed frames to ordered reply fragments
//! - `Transcript` - Role-tagged messages rebuilt from a session's event log
//! - `SessionDirectory` - Refreshable view of a user's sessions
//! - `ChatController` - Handle display actions against explicit `ChatState`

pub mod aggregator;
pub mod controller;
pub mod directory;
pub mod gateway;
pub mod transcript;

pub use aggregator::Reply;
pub use controller::{ChatController, ChatState, ConversationView, Notice, UserAction, ViewUpdate};
pub use directory::SessionDirectory;
pub use gateway::Gateway;
pub use transcript::Transcript;
