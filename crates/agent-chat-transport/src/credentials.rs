//! Credential providers.

use async_trait::async_trait;
use agent_chat_core::{CredentialProvider, GatewayError};

/// A fixed token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> Result<String, GatewayError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every request,
/// so an external refresher can rotate it.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvToken {
    async fn token(&self) -> Result<String, GatewayError> {
        std::env::var(&self.var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Credentials(format!("{} is not set", self.var)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        assert_eq!(StaticToken::new("abc").token().await.unwrap(), "abc");
        assert_eq!(format!("{:?}", StaticToken::new("abc")), "StaticToken(..)");
    }

    #[tokio::test]
    async fn test_env_token_missing() {
        let err = EnvToken::new("AGENT_CHAT_TEST_TOKEN_THAT_IS_NEVER_SET")
            .token()
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Credentials(_)));
    }
}
