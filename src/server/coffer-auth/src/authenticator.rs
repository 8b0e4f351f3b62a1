//! One-shot startup authentication.

use std::sync::Arc;

use coffer_gateway::RunMode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{AuthError, LoginBackend};

/// Lifecycle of the process-wide credential store session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Login has not been attempted.
    NotStarted,
    /// Login is in progress.
    Authenticating,
    /// Session established (or skipped in test mode).
    Authenticated,
    /// Login failed. Terminal.
    Failed,
}

/// Logs into the credential store before the server accepts traffic.
///
/// Runs at most once. Failure is reported to the caller, which is expected
/// to abort startup; this type never terminates the process itself.
pub struct StartupAuthenticator {
    backend: Arc<dyn LoginBackend>,
    identity: Option<String>,
    mode: RunMode,
    state: AuthState,
}

impl StartupAuthenticator {
    /// Creates an authenticator that has not run yet.
    ///
    /// # Arguments
    ///
    /// * `backend` - Store to log into
    /// * `identity` - Account to log in as (ignored in test mode)
    /// * `mode` - Test mode skips the login entirely
    pub fn new(backend: Arc<dyn LoginBackend>, identity: Option<String>, mode: RunMode) -> Self {
        Self {
            backend,
            identity,
            mode,
            state: AuthState::NotStarted,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Performs the login.
    ///
    /// # Errors
    ///
    /// * [`AuthError::AlreadyAttempted`] - Called more than once
    /// * [`AuthError::MissingIdentity`] - Live mode without an identity
    /// * [`AuthError::LoginFailed`] - The backend rejected the login
    pub async fn authenticate(&mut self) -> Result<(), AuthError> {
        if self.state != AuthState::NotStarted {
            return Err(AuthError::AlreadyAttempted(self.state));
        }

        if self.mode.is_test() {
            warn!("Test mode enabled - skipping credential store authentication");
            self.state = AuthState::Authenticated;
            return Ok(());
        }

        let identity = match self.identity.as_deref().map(str::trim) {
            Some(identity) if !identity.is_empty() => identity.to_string(),
            _ => {
                error!("No login identity configured for the credential store");
                self.state = AuthState::Failed;
                return Err(AuthError::MissingIdentity);
            },
        };

        self.state = AuthState::Authenticating;
        info!(backend = self.backend.name(), identity = %identity, "Authenticating with credential store");

        match self.backend.login(&identity).await {
            Ok(()) => {
                self.state = AuthState::Authenticated;
                info!(backend = self.backend.name(), "Authenticated with credential store");
                Ok(())
            },
            Err(e) => {
                self.state = AuthState::Failed;
                error!(backend = self.backend.name(), error = %e, "Credential store authentication failed");
                Err(e)
            },
        }
    }
}
