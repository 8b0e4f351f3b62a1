//! Request handlers.

pub mod bundle;
pub mod secrets;

use axum::http::StatusCode;

/// Fallback for every unrouted path.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
