//! Relay rendered byte streams into text sinks.

use std::io;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::decoder::Utf8Decoder;

/// Failure while relaying a stream.
#[derive(Debug, thiserror::Error)]
pub enum RelayError<S, K> {
    /// The source stream failed. Carried through unchanged.
    #[error("{0}")]
    Source(S),

    /// The sink rejected a write.
    #[error("sink rejected write: {0}")]
    Sink(K),
}

/// Drain `stream` into `sink`, decoding each chunk as UTF-8.
///
/// Chunks are forwarded in order. The next chunk is only pulled after the
/// previous write has been accepted (and flushed), so a slow sink slows the
/// producer instead of growing a buffer. The sink is never closed.
///
/// Dropping the returned future stops the relay and drops the stream; there
/// is no further cancellation signal to the producer.
pub async fn relay<St, B, E, Si>(
    mut stream: St,
    mut sink: Si,
) -> Result<(), RelayError<E, <Si as Sink<String>>::Error>>
where
    St: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    Si: Sink<String> + Unpin,
{
    let mut decoder = Utf8Decoder::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(RelayError::Source)?;
        let text = decoder.decode(chunk.as_ref());
        if !text.is_empty() {
            sink.send(text).await.map_err(RelayError::Sink)?;
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        sink.send(tail).await.map_err(RelayError::Sink)?;
    }

    Ok(())
}

/// Collect a byte stream into a single string.
pub async fn collect<St, B, E>(stream: St) -> Result<String, E>
where
    St: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut pieces: Vec<String> = Vec::new();

    relay(stream, &mut pieces).await.map_err(|e| match e {
        RelayError::Source(e) => e,
        RelayError::Sink(never) => match never {},
    })?;

    Ok(pieces.concat())
}

/// Sink writing each piece of text to an async writer, flushing after each.
pub fn writer_sink<W>(writer: W) -> impl Sink<String, Error = io::Error> + Unpin
where
    W: AsyncWrite + Unpin,
{
    Box::pin(futures::sink::unfold(
        writer,
        |mut writer, text: String| async move {
            writer.write_all(text.as_bytes()).await?;
            writer.flush().await?;
            Ok::<_, io::Error>(writer)
        },
    ))
}
