//! Render endpoint routes.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use ssr_loader::Manifest;
use ssr_observability::{request_span, RequestId};
use tracing::Instrument;

use crate::body::stream_body;
use crate::error::ApiError;
use crate::request::RenderRequest;

/// Path of the render endpoint.
pub const RENDER_PATH: &str = "/render";

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the render service router.
///
/// Only `POST` is routed on [`RENDER_PATH`]; other methods get a 405 before
/// the manifest is consulted.
pub fn router(manifest: Arc<Manifest>) -> Router {
    Router::new()
        .route(RENDER_PATH, post(render))
        .with_state(manifest)
        .route("/health", get(health_check))
        .layer(middleware::from_fn(trace_request))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn render(
    State(manifest): State<Arc<Manifest>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = RenderRequest::from_slice(&body)?;
    let app = manifest.require(&request.entry_name)?;
    tracing::debug!(entry = %request.entry_name, "Rendering entry");

    let stream = ssr_core::render(&app, request.props).map_err(ApiError::Render)?;
    stream_body(stream).await
}

/// Run each request inside a span carrying its request ID.
pub(crate) async fn trace_request(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(RequestId::from_header)
        .unwrap_or_else(RequestId::generate);
    let span = request_span(&request_id, request.method().as_str(), request.uri().path());

    async move {
        let mut response = next.run(request).await;
        tracing::info!(status = response.status().as_u16(), "Request handled");

        if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}
