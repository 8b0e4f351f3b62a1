//! # Coffer Credential Gateway
//!
//! Resolves secret names to values through an external credential store.
//!
//! ## Behaviour
//!
//! - Live mode queries a [`CredentialBackend`] (the Proton Pass CLI in production)
//! - Test mode answers from fixed fixtures and never touches the backend
//! - The password field is preferred over the text field
//! - No caching: every lookup reaches the backend

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod pass_cli;
pub mod secret;

use std::sync::Arc;

use tracing::{debug, info};

pub use backend::{CredentialBackend, CredentialRecord, RecordContent};
pub use error::{BackendError, GatewayError};
pub use pass_cli::PassCli;
pub use secret::{RunMode, SecretName, SecretValue};

/// Name answered with [`TEST_API_KEY`] in test mode.
pub const TEST_API_KEY_NAME: &str = "openrouter-api-key";

/// Fixture value returned in test mode.
pub const TEST_API_KEY: &str = "test-api-key-12345";

/// Resolves `name` against the test-mode fixtures.
///
/// Unknown names resolve to the empty string rather than failing, so
/// integration runs stay deterministic.
fn test_fixture(name: &SecretName) -> SecretValue {
    match name.as_str() {
        TEST_API_KEY_NAME => SecretValue::new(TEST_API_KEY),
        _ => SecretValue::new(""),
    }
}

/// Picks the usable value out of a record, preferring the password.
fn extract_value(record: CredentialRecord) -> Option<SecretValue> {
    let content = record.content?;
    content.password.or(content.text).map(SecretValue::new)
}

/// Front door for secret lookups.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
#[derive(Clone)]
pub struct CredentialGateway {
    backend: Arc<dyn CredentialBackend>,
    mode: RunMode,
}

impl CredentialGateway {
    /// Creates a gateway over `backend` in the given run mode.
    pub fn new(backend: Arc<dyn CredentialBackend>, mode: RunMode) -> Self {
        info!(backend = backend.name(), mode = ?mode, "Credential gateway initialized");
        Self { backend, mode }
    }

    /// Returns the run mode this gateway was built with.
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Returns the value stored under `name`.
    ///
    /// # Errors
    ///
    /// * [`GatewayError::SecretNotFound`] - No record, or a record without a
    ///   password or text field
    /// * [`GatewayError::ExternalTool`] - The backend invocation failed
    pub async fn get_secret(&self, name: &SecretName) -> Result<SecretValue, GatewayError> {
        if self.mode.is_test() {
            debug!(secret = %name, "Resolving secret from test fixtures");
            return Ok(test_fixture(name));
        }

        let record = self
            .backend
            .lookup(name)
            .await
            .map_err(|e| GatewayError::external(name.as_str(), &e))?
            .ok_or_else(|| GatewayError::SecretNotFound(name.to_string()))?;

        extract_value(record).ok_or_else(|| GatewayError::SecretNotFound(name.to_string()))
    }
}

impl std::fmt::Debug for CredentialGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGateway")
            .field("backend", &self.backend.name())
            .field("mode", &self.mode)
            .finish()
    }
}
