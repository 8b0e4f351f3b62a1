//! Credential backend trait and the record it returns.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{BackendError, SecretName};

/// Structured response of the credential tool for one name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialRecord {
    /// Nested content payload, absent when the record carries no data.
    #[serde(default)]
    pub content: Option<RecordContent>,
}

/// Fields of a record's content payload the gateway understands.
#[derive(Clone, Default, Deserialize)]
pub struct RecordContent {
    /// Login password.
    #[serde(default)]
    pub password: Option<String>,
    /// Free-form note text.
    #[serde(default)]
    pub text: Option<String>,
}

impl std::fmt::Debug for RecordContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordContent")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("text", &self.text.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Trait for credential stores the gateway can query.
///
/// The production implementation shells out to the Proton Pass CLI
/// ([`PassCli`](crate::PassCli)); tests substitute in-memory fakes.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Looks up the record stored under `name`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - The tool returned a record
    /// * `Ok(None)` - The tool reported that no record exists
    /// * `Err(BackendError)` - The invocation itself failed
    async fn lookup(&self, name: &SecretName) -> Result<Option<CredentialRecord>, BackendError>;

    /// Returns the name of this backend for logging/debugging.
    fn name(&self) -> &'static str;
}
