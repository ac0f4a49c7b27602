//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// Resource id shipped in unedited configs.
pub const PLACEHOLDER_RESOURCE_ID: &str = "your-resource-id-here";

pub const ENV_RESOURCE_ID: &str = "AGENT_RESOURCE_ID";
pub const ENV_LOCATION: &str = "AGENT_LOCATION";
pub const ENV_BASE_URL: &str = "AGENT_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "AGENT_TIMEOUT_SECS";

/// Location of the remote agent and transport settings.
///
/// Treated as immutable once a transport is built from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Full resource name of the deployed agent.
    pub resource_id: String,
    /// Service region, e.g. `us-central1`.
    pub location: String,
    /// Base URL override (scheme + host). Derived from `location` when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Optional `User-Agent` override.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl GatewayConfig {
    /// Create a config for a resource in a region.
    #[must_use]
    pub fn new(resource_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            location: location.into(),
            base_url: None,
            timeout_secs: None,
            user_agent: None,
        }
    }

    /// Load from `AGENT_*` environment variables.
    ///
    /// # Errors
    /// Returns `Config` if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `Config` if a required key is missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GatewayError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(required(ENV_RESOURCE_ID)?, required(ENV_LOCATION)?);
        config.base_url = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty());
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                GatewayError::Config(format!("{ENV_TIMEOUT_SECS}={raw:?} is not a number: {e}"))
            })?;
            config.timeout_secs = Some(secs);
        }
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Configured request timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Check that the config names a real resource.
    ///
    /// # Errors
    /// Returns `Config` for an empty or placeholder resource id or empty location.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let resource = self.resource_id.trim();
        if resource.is_empty() {
            return Err(GatewayError::Config("resource id is empty".to_string()));
        }
        if resource == PLACEHOLDER_RESOURCE_ID {
            return Err(GatewayError::Config(
                "resource id is still the placeholder; set it to the deployed agent's resource name"
                    .to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(GatewayError::Config("location is empty".to_string()));
        }
        Ok(())
    }

    /// Scheme and host requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url.as_deref().map_or_else(
            || format!("https://{}-aiplatform.googleapis.com", self.location.trim()),
            |url| url.trim_end_matches('/').to_string(),
        )
    }

    /// Endpoint for non-streaming operations.
    #[must_use]
    pub fn query_url(&self) -> String {
        format!("{}/v1/{}:query", self.base_url(), self.resource_path())
    }

    /// Endpoint for the streaming operation.
    #[must_use]
    pub fn stream_query_url(&self) -> String {
        format!("{}/v1/{}:streamQuery", self.base_url(), self.resource_path())
    }

    fn resource_path(&self) -> &str {
        self.resource_id.trim().trim_matches('/')
    }
}
