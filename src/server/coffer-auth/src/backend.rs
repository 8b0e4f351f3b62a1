//! Login backend trait.

use async_trait::async_trait;
use coffer_gateway::PassCli;

use crate::AuthError;

/// Trait for credential stores that require a session before lookups.
#[async_trait]
pub trait LoginBackend: Send + Sync {
    /// Opens a session for `identity`.
    ///
    /// # Arguments
    ///
    /// * `identity` - Account the credential store should log in as
    async fn login(&self, identity: &str) -> Result<(), AuthError>;

    /// Returns the name of this backend for logging/debugging.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl LoginBackend for PassCli {
    async fn login(&self, identity: &str) -> Result<(), AuthError> {
        PassCli::login(self, identity)
            .await
            .map_err(|e| AuthError::LoginFailed {
                backend: LoginBackend::name(self).to_string(),
                reason: e.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "proton-pass-cli"
    }
}
