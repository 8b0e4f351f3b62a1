//! `GET /config.js`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use tracing::error;

use crate::{ApiError, AppState};

/// MIME type the extension expects for the bundle.
pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript";

/// Serves the prebuilt bundle byte-for-byte.
///
/// The file is read on every request so a rebuild is visible without a
/// restart.
pub async fn get_bundle(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let bytes = tokio::fs::read(&state.bundle_path).await.map_err(|e| {
        error!(path = %state.bundle_path.display(), error = %e, "Failed to read configuration bundle");
        ApiError::BundleUnavailable
    })?;

    Ok(([(header::CONTENT_TYPE, JAVASCRIPT_CONTENT_TYPE)], bytes))
}
