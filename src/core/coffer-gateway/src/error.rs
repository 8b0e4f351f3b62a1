//! Credential gateway error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`CredentialBackend`](crate::CredentialBackend).
///
/// Messages are short summaries. They never carry the tool's raw output,
/// so they are safe to hand back to HTTP callers.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The external tool could not be launched.
    #[error("failed to launch {program}: {reason}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        reason: String,
    },

    /// The external tool exited unsuccessfully.
    #[error("{program} exited with status {}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    ExitStatus {
        /// Program that was invoked.
        program: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },

    /// The external tool produced output that could not be parsed.
    #[error("malformed output from {program}")]
    MalformedOutput {
        /// Program that was invoked.
        program: String,
    },

    /// The external tool did not finish in time.
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Program that was invoked.
        program: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

/// Errors returned by [`CredentialGateway::get_secret`](crate::CredentialGateway::get_secret).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The record is absent or exposes neither a password nor a text field.
    #[error("Secret '{0}' not found in Proton Pass")]
    SecretNotFound(String),

    /// The credential tool itself failed.
    #[error("Failed to read secret '{name}' from Proton Pass: {reason}")]
    ExternalTool {
        /// Secret that was requested.
        name: String,
        /// Summarized failure.
        reason: String,
    },
}

impl GatewayError {
    pub(crate) fn external(name: &str, err: &BackendError) -> Self {
        GatewayError::ExternalTool {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}
