//! Session directory: the last-fetched list of a user's sessions.

use std::collections::HashSet;

use agent_chat_core::{GatewayError, SessionSummary};

use crate::Gateway;

/// Refreshable view of a user's sessions.
///
/// Not authoritative and not time-based: it goes stale only through
/// [`invalidate`](Self::invalidate), typically after a create or delete.
#[derive(Debug, Clone)]
pub struct SessionDirectory {
    entries: Vec<SessionSummary>,
    stale: bool,
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDirectory {
    /// Create an empty directory that refreshes on first read.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            stale: true,
        }
    }

    /// Force the next read to refresh.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Entries as of the last successful refresh.
    #[must_use]
    pub fn entries(&self) -> &[SessionSummary] {
        &self.entries
    }

    #[must_use]
    pub fn contains(&self, session_id: &str) -> bool {
        self.entries.iter().any(|s| s.id == session_id)
    }

    /// Replace the entries with the service's current list.
    ///
    /// On failure the previous entries are kept and the directory stays
    /// stale so the next read tries again.
    ///
    /// # Errors
    /// Returns the gateway's list error.
    pub async fn refresh(
        &mut self,
        gateway: &Gateway,
        user_id: &str,
    ) -> Result<&[SessionSummary], GatewayError> {
        let sessions = gateway.list_sessions(user_id).await?;
        self.replace(sessions);
        Ok(&self.entries)
    }

    /// Entries, refreshing first if stale.
    ///
    /// # Errors
    /// Returns the gateway's list error when a refresh was needed and failed.
    pub async fn read(
        &mut self,
        gateway: &Gateway,
        user_id: &str,
    ) -> Result<&[SessionSummary], GatewayError> {
        if self.stale {
            return self.refresh(gateway, user_id).await;
        }
        Ok(&self.entries)
    }

    /// Wholesale replacement. Later duplicates of an id are dropped.
    pub fn replace(&mut self, sessions: Vec<SessionSummary>) {
        let mut seen = HashSet::new();
        let before = sessions.len();
        self.entries = sessions
            .into_iter()
            .filter(|s| seen.insert(s.id.clone()))
            .collect();
        if self.entries.len() != before {
            tracing::warn!(
                dropped = before - self.entries.len(),
                "Session list contained duplicate ids"
            );
        }
        self.stale = false;
    }
}
