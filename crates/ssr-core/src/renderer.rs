//! Streaming server renderer.

use bytes::Bytes;
use futures::channel::mpsc;
use futures::stream::{self, BoxStream, StreamExt};
use futures::{future, FutureExt, SinkExt};

use crate::app::{AppInstance, SsrApp};
use crate::props::Props;

/// An asynchronous, finite sequence of UTF-8 markup chunks.
///
/// Produced once per render and meant to be consumed exactly once.
pub type RenderStream = BoxStream<'static, anyhow::Result<Bytes>>;

/// Chunks the renderer may run ahead of its consumer, on top of the
/// producer's own slot.
const RENDER_BUFFER: usize = 0;

/// Render an application instance to a stream.
///
/// The component runs as a producer polled together with the returned
/// stream: rendering starts on the first poll and is suspended whenever the
/// consumer falls behind. Markup written before a component failure is
/// delivered first, then the failure surfaces as the stream's error item.
/// Dropping the stream drops the render.
pub fn render_to_stream(instance: AppInstance) -> RenderStream {
    let (mut tx, rx) = mpsc::channel(RENDER_BUFFER);
    let component = instance.root().name().to_string();

    let producer = async move {
        match instance.render_into(&mut tx).await {
            Ok(chunks) => tracing::debug!(component = %component, chunks, "Render complete"),
            Err(error) => {
                // Receiver may already be gone
                let _ = tx.send(Err(error)).await;
            }
        }
    };

    stream::select(rx.map(Some), producer.into_stream().map(|()| None))
        .filter_map(future::ready)
        .boxed()
}

/// Render an application with the given props.
///
/// Builds a fresh instance (running the configure hook once) and hands it to
/// the streaming renderer. Nothing is cached between calls.
pub fn render(app: &SsrApp, props: Props) -> anyhow::Result<RenderStream> {
    let instance = app.create_app(props)?;
    tracing::debug!(component = instance.root().name(), "Rendering application");
    Ok(render_to_stream(instance))
}
