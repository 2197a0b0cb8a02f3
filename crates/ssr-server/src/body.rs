//! Streaming response bodies.

use std::io;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::channel::mpsc;
use futures::{future, stream, SinkExt, StreamExt};
use ssr_core::RenderStream;
use ssr_streaming::{relay, RelayError};
use tracing::Instrument;

use crate::error::ApiError;

/// Chunks buffered between the relay task and the socket.
const BODY_BUFFER: usize = 1;

/// Turn a render stream into a `text/html` response.
///
/// The first chunk is pulled before the status line is committed, so a
/// renderer that fails immediately still produces a 500. After that the
/// stream is relayed into a bounded channel feeding the body: the renderer
/// only advances as fast as the client drains the socket. A failure after
/// the headers are sent is logged and aborts the body.
pub async fn stream_body(mut stream: RenderStream) -> Result<Response, ApiError> {
    let first = match stream.next().await {
        Some(Ok(chunk)) => Some(chunk),
        Some(Err(error)) => return Err(ApiError::Render(error)),
        None => None,
    };

    let (mut tx, rx) = mpsc::channel::<Result<String, io::Error>>(BODY_BUFFER);
    let rest = stream::iter(first.map(Ok)).chain(stream);

    tokio::spawn(
        async move {
            let sink = (&mut tx)
                .with(|text: String| future::ready(Ok::<_, mpsc::SendError>(Ok(text))));
            let result = relay(rest, sink).await;

            match result {
                Ok(()) => tracing::debug!("Render stream complete"),
                Err(RelayError::Source(error)) => {
                    tracing::error!(error = ?error, "Render failed mid-stream");
                    // Receiver may already be gone
                    let _ = tx.send(Err(io::Error::other("render aborted"))).await;
                }
                Err(RelayError::Sink(_)) => {
                    tracing::debug!("Client disconnected before render completed");
                }
            }
        }
        .in_current_span(),
    );

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        Body::from_stream(rx),
    )
        .into_response())
}
