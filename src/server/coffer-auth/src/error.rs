//! Authentication error types.

use thiserror::Error;

use crate::AuthState;

/// Errors that can occur during startup authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No login identity was configured.
    #[error("no login identity configured")]
    MissingIdentity,

    /// The credential store rejected the login or the tool failed.
    #[error("login via {backend} failed: {reason}")]
    LoginFailed {
        /// Backend that attempted the login.
        backend: String,
        /// Summarized failure.
        reason: String,
    },

    /// Authentication was already attempted for this process.
    #[error("authentication already attempted (state: {0:?})")]
    AlreadyAttempted(AuthState),
}
