//! Session records and transcript types.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// Service-assigned session identifier.
pub type SessionId = String;

/// Entry of a list-sessions response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,
    /// Last update (Unix epoch seconds, possibly fractional).
    #[serde(
        rename = "lastUpdateTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_update_time: Option<f64>,
}

impl SessionSummary {
    /// Create a summary.
    #[must_use]
    pub fn new(id: impl Into<SessionId>, last_update_time: Option<f64>) -> Self {
        Self {
            id: id.into(),
            last_update_time,
        }
    }

    /// Short `MM/DD HH:MM` label of the last update in local time.
    #[must_use]
    pub fn last_update_label(&self) -> String {
        self.last_update_label_in(&Local)
    }

    /// Short `MM/DD HH:MM` label of the last update in `tz`, or `Unknown`.
    #[must_use]
    pub fn last_update_label_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.last_update_time
            .filter(|ts| *ts > 0.0)
            .and_then(epoch_to_datetime)
            .map_or_else(
                || "Unknown".to_string(),
                |dt| dt.with_timezone(tz).format("%m/%d %H:%M").to_string(),
            )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn epoch_to_datetime(ts: f64) -> Option<DateTime<chrono::Utc>> {
    let secs = ts.trunc() as i64;
    let nanos = (ts.fract() * 1e9) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Full session state as returned by get-session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Last update (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<f64>,
    /// Append-only event log, in service order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<Event>,
}

impl Session {
    /// Summary view of this session.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        SessionSummary::new(self.id.clone(), self.last_update_time)
    }
}

/// One recorded turn in a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    /// `"user"` or an agent identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
}

impl Event {
    /// Build a text event.
    #[must_use]
    pub fn text(
        author: impl Into<String>,
        role: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            author: Some(author.into()),
            content: Some(Content {
                role: Some(role.into()),
                parts: vec![Part::text(text)],
            }),
        }
    }

    /// Role of this event.
    ///
    /// The content block's role wins over the event author; with neither
    /// present the event is attributed to the assistant.
    #[must_use]
    pub fn role(&self) -> Role {
        self.content
            .as_ref()
            .and_then(|c| c.role.as_deref())
            .or(self.author.as_deref())
            .map_or(Role::Assistant, Role::from_tag)
    }

    /// Concatenated text of all parts, in part order, skipping missing text.
    ///
    /// Whitespace-only parts are kept so spacing between parts survives;
    /// only a blank result as a whole is treated as empty.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Content block of an event or stream frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parts: Vec<Part>,
}

/// Smallest content unit. Only text is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    /// Build a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// The text, if present and not blank.
    #[must_use]
    pub fn visible_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Client-recognized message roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a service role or author tag. Anything but `"user"` is the assistant.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag == "user" { Self::User } else { Self::Assistant }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconstructed transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Piece of assistant text surfaced while a reply streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamFragment(String);

impl StreamFragment {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StreamFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Treat an explicit JSON `null` like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
