//! # Coffer Auth
//!
//! Startup authentication against the credential store.
//!
//! The broker logs in exactly once, before it binds its listener. A failed
//! login is fatal to startup; test mode skips the login altogether.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authenticator;
pub mod backend;
pub mod error;

pub use authenticator::{AuthState, StartupAuthenticator};
pub use backend::LoginBackend;
pub use error::AuthError;
