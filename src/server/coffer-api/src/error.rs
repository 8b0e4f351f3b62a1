//! API error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coffer_gateway::GatewayError;
use serde::Serialize;
use thiserror::Error;

/// JSON body returned on every failure except the plain-text 404.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description.
    pub error: String,
}

/// Errors surfaced by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The secret name path segment was empty.
    #[error("Secret name is required")]
    MissingSecretName,

    /// The secret name was not valid UTF-8 once decoded.
    #[error("Secret name is not valid UTF-8")]
    InvalidSecretName,

    /// The gateway could not resolve the secret.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The configuration bundle could not be read.
    #[error("Configuration bundle is not available")]
    BundleUnavailable,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingSecretName | ApiError::InvalidSecretName => StatusCode::BAD_REQUEST,
            ApiError::Gateway(_) | ApiError::BundleUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
