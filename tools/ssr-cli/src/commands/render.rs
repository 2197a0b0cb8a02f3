//! Render one entry module to stdout.

use anyhow::{Context as _, Result};
use ssr_core::{props_from_json, Props};
use ssr_loader::EntryLoader;
use ssr_streaming::{relay, writer_sink, RelayError};

use super::RenderArgs;
use crate::context::Context;

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let props = match args.props.as_deref() {
        Some(json) => props_from_json(json).context("Invalid --props")?,
        None => Props::new(),
    };

    let entry = ctx.resolve_path(&args.entry);
    ctx.output.debug(&format!("Loading {}", entry.display()));

    let app = EntryLoader::filesystem()
        .load(&entry.to_string_lossy())
        .await?;
    let stream = ssr_core::render(&app, props)?;

    relay(stream, writer_sink(tokio::io::stdout()))
        .await
        .map_err(|e| match e {
            RelayError::Source(e) => e,
            RelayError::Sink(e) => anyhow::Error::new(e).context("Failed to write to stdout"),
        })
}
