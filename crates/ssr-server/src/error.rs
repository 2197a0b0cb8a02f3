//! Request-level errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use ssr_loader::EntryLoadError;

/// Message sent to clients for unclassified render failures.
pub const RENDER_FAILURE_MESSAGE: &str = "Could not render component";

/// Errors produced while handling a render request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The body is not valid JSON (dev hook only; `/render` reports it as a schema error).
    #[error("Invalid JSON")]
    InvalidJson,

    /// The body does not match the request schema.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Unknown entry or an entry that failed to load.
    #[error(transparent)]
    Entry(#[from] EntryLoadError),

    /// Failure raised by application or component code.
    #[error("Could not render component")]
    Render(#[source] anyhow::Error),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::InvalidBody(_) | Self::Entry(_) => StatusCode::BAD_REQUEST,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::InvalidJson => (status, "Invalid JSON").into_response(),
            Self::InvalidBody(e) => (
                status,
                Json(json!({
                    "error": "invalid request body",
                    "detail": e.to_string(),
                })),
            )
                .into_response(),
            Self::Entry(e) => {
                tracing::debug!(error = %e, "Rejected render request");
                (status, e.to_string()).into_response()
            }
            Self::Render(e) => {
                tracing::error!(error = ?e, "Render failed");
                (status, RENDER_FAILURE_MESSAGE).into_response()
            }
        }
    }
}
