//! # Coffer API
//!
//! HTTP surface of the broker.
//!
//! ## Routes
//!
//! - `/config.js` - the prebuilt configuration bundle
//! - `/api/secrets/{name}` - secret lookup through the credential gateway
//! - anything else - `404 Not Found`
//!
//! Routing is by path only; every method reaches the same handler.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::any;
use axum::Router;
use coffer_gateway::CredentialGateway;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};

/// State shared by all handlers. Immutable after startup.
#[derive(Debug)]
pub struct AppState {
    /// Secret lookups.
    pub gateway: CredentialGateway,
    /// Location of the externally built bundle.
    pub bundle_path: PathBuf,
}

impl AppState {
    /// Creates the shared state.
    pub fn new(gateway: CredentialGateway, bundle_path: impl Into<PathBuf>) -> Self {
        Self {
            gateway,
            bundle_path: bundle_path.into(),
        }
    }
}

/// Builds the request dispatcher.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/config.js", any(handlers::bundle::get_bundle))
        .route("/api/secrets/", any(handlers::secrets::get_secret))
        .route("/api/secrets/{*rest}", any(handlers::secrets::get_secret))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
