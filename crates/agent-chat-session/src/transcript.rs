//! Transcript reconstruction from a session's event log.

use agent_chat_core::{Event, Message, Session};
use serde::{Deserialize, Serialize};

/// Role-tagged messages in event-log order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub messages: Vec<Message>,
}

impl Transcript {
    /// Rebuild a transcript from events.
    ///
    /// Each event yields at most one message. Events whose joined text is
    /// blank are dropped; nothing is reordered or merged.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let messages = events
            .iter()
            .filter_map(|event| {
                let text = event.joined_text();
                if text.trim().is_empty() {
                    None
                } else {
                    Some(Message::new(event.role(), text))
                }
            })
            .collect();
        Self { messages }
    }

    /// No conversation yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl From<&Session> for Transcript {
    fn from(session: &Session) -> Self {
        Self::from_events(&session.events)
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
