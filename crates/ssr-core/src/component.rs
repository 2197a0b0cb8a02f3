//! Component trait and render context.

use std::fmt;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::SinkExt;
use serde_json::Value;

use crate::props::Props;

/// Sending half of a render stream.
pub type ChunkSender = mpsc::Sender<anyhow::Result<Bytes>>;

/// A UI component that can render itself to markup on the server.
///
/// Components are shared between renders and must not keep per-render state
/// on `self`. Mutable state belongs in the instance data returned by
/// [`Component::data`], which is created fresh for every application instance.
#[async_trait]
pub trait Component: Send + Sync + fmt::Debug {
    /// Component name (used in logs).
    fn name(&self) -> &str {
        "Anonymous"
    }

    /// Names of the props this component requires.
    fn props(&self) -> &[String] {
        &[]
    }

    /// Initial reactive state for a new instance.
    fn data(&self) -> Props {
        Props::new()
    }

    /// Render markup into the context.
    ///
    /// Each write is handed to the consumer before the next one is accepted,
    /// so a slow reader suspends the render at its current write.
    async fn render(&self, cx: &mut RenderContext<'_>) -> anyhow::Result<()>;
}

/// Everything a component can see while rendering one instance.
pub struct RenderContext<'a> {
    props: &'a Props,
    data: &'a mut Props,
    globals: &'a Props,
    sink: &'a mut ChunkSender,
    written: usize,
}

impl<'a> RenderContext<'a> {
    /// Create a render context over an instance's state, writing into `sink`.
    pub fn new(
        props: &'a Props,
        data: &'a mut Props,
        globals: &'a Props,
        sink: &'a mut ChunkSender,
    ) -> Self {
        Self {
            props,
            data,
            globals,
            sink,
            written: 0,
        }
    }

    /// Input props of the instance.
    pub fn props(&self) -> &Props {
        self.props
    }

    /// Get a prop by name.
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Instance state.
    pub fn data(&self) -> &Props {
        self.data
    }

    /// Mutable instance state.
    pub fn data_mut(&mut self) -> &mut Props {
        self.data
    }

    /// Application-wide properties installed by the configure hook.
    pub fn globals(&self) -> &Props {
        self.globals
    }

    /// Emit raw markup as one chunk.
    ///
    /// Waits until the stream has room. Fails once the consumer has dropped
    /// the stream.
    pub async fn write(&mut self, markup: impl Into<String>) -> anyhow::Result<()> {
        let markup = markup.into();
        if markup.is_empty() {
            return Ok(());
        }
        self.sink
            .send(Ok(Bytes::from(markup)))
            .await
            .map_err(|_| anyhow!("render stream closed"))?;
        self.written += 1;
        Ok(())
    }

    /// Emit text, escaping HTML special characters.
    pub async fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.write(escape_html(text)).await
    }

    /// Number of chunks written so far.
    pub fn chunk_count(&self) -> usize {
        self.written
    }
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_render_context_skips_empty_chunks() {
        let props = Props::new();
        let mut data = Props::new();
        let globals = Props::new();
        let (mut tx, rx) = mpsc::channel(8);

        let mut cx = RenderContext::new(&props, &mut data, &globals, &mut tx);
        cx.write("<p>").await.unwrap();
        cx.write("").await.unwrap();
        cx.write_text("a<b").await.unwrap();
        cx.write("</p>").await.unwrap();
        assert_eq!(cx.chunk_count(), 3);
        drop(tx);

        let chunks: Vec<Bytes> = rx.map(|chunk| chunk.unwrap()).collect().await;
        assert_eq!(chunks, vec!["<p>", "a&lt;b", "</p>"]);
    }

    #[tokio::test]
    async fn test_render_context_write_fails_after_consumer_drops() {
        let props = Props::new();
        let mut data = Props::new();
        let globals = Props::new();
        let (mut tx, rx) = mpsc::channel(8);
        drop(rx);

        let mut cx = RenderContext::new(&props, &mut data, &globals, &mut tx);
        let err = cx.write("<p>").await.unwrap_err();

        assert_eq!(err.to_string(), "render stream closed");
        assert_eq!(cx.chunk_count(), 0);
    }

    #[test]
    fn test_render_context_data_is_mutable() {
        let props = Props::new();
        let mut data = Props::new();
        let globals = Props::new();
        let (mut tx, _rx) = mpsc::channel(1);

        {
            let mut cx = RenderContext::new(&props, &mut data, &globals, &mut tx);
            cx.data_mut().insert("count".into(), Value::from(1));
        }

        assert_eq!(data.get("count"), Some(&Value::from(1)));
    }
}
