//! `GET /api/secrets/{name}`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use axum::Json;
use coffer_gateway::{SecretName, SecretValue};
use serde::Serialize;
use tracing::error;

use crate::{ApiError, AppState};

/// Successful lookup body.
#[derive(Debug, Serialize)]
pub struct SecretResponse {
    /// The resolved secret.
    pub value: SecretValue,
}

/// Returns the final `/`-delimited token of a raw (still encoded) path.
///
/// A trailing slash yields the empty string.
pub(crate) fn final_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Extracts the secret name from the request path.
///
/// The path is split before percent-decoding, so `%2F` stays part of the
/// name instead of acting as a separator.
pub(crate) fn secret_name_from_path(path: &str) -> Result<SecretName, ApiError> {
    let decoded =
        urlencoding::decode(final_segment(path)).map_err(|_| ApiError::InvalidSecretName)?;
    SecretName::new(decoded.into_owned()).ok_or(ApiError::MissingSecretName)
}

/// Handles `/api/secrets/` and everything below it.
pub async fn get_secret(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Json<SecretResponse>, ApiError> {
    let name = secret_name_from_path(uri.path())?;

    match state.gateway.get_secret(&name).await {
        Ok(value) => Ok(Json(SecretResponse { value })),
        Err(e) => {
            error!(secret = %name, error = %e, "Error retrieving secret");
            Err(e.into())
        },
    }
}
