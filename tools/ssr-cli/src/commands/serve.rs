//! Serve a build manifest over HTTP.

use anyhow::{Context as _, Result};
use ssr_server::{Bind, ServeOptions};

use super::{shutdown_signal, ServeArgs};
use crate::context::Context;

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let server = &ctx.config.server;
    let bind = Bind::new(
        args.host.unwrap_or_else(|| server.host.clone()),
        args.port.unwrap_or(server.port),
        args.socket.or_else(|| server.socket.clone()),
    );
    let manifest = ctx.resolve_path(&args.manifest.to_string_lossy());

    ctx.output.debug(&format!("Manifest: {}", manifest.display()));
    ctx.output.debug(&format!("Bind: {}", bind));

    let spinner = ctx.output.spinner("Resolving manifest...");
    let started = ssr_server::start(&manifest, &ServeOptions::new(bind)).await;
    spinner.finish_and_clear();

    let handle = started
        .with_context(|| format!("Failed to start server for {}", manifest.display()))?;
    ctx.output.success(&format!("Listening on {}", handle.local_addr()));
    ctx.output.info("Press Ctrl+C to stop");

    let signal = shutdown_signal().await;
    ctx.output.info("Shutting down");
    handle.stop().await?;
    signal
}
