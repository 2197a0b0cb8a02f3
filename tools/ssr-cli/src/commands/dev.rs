//! Serve the development render hook.

use anyhow::{Context as _, Result};
use ssr_server::{serve_dev, Bind, DevMiddleware, DEV_RENDER_PATH};

use super::{shutdown_signal, DevArgs};
use crate::context::Context;

/// Run the dev command.
pub async fn run(args: DevArgs, ctx: &Context) -> Result<()> {
    let dev = &ctx.config.dev;
    let root = match args.root {
        Some(root) => ctx.resolve_path(&root.to_string_lossy()),
        None => ctx.resolve_path(&dev.root.to_string_lossy()),
    };
    let bind = Bind::new(
        args.host.unwrap_or_else(|| ctx.config.server.host.clone()),
        args.port.unwrap_or(ctx.config.server.port),
        None,
    );

    ctx.output.kv("Root", &root.display().to_string());
    for (name, specifier) in &dev.inputs {
        ctx.output.kv(name, specifier);
    }

    let middleware = DevMiddleware::new(&root).with_inputs(dev.inputs.clone());
    let handle = serve_dev(middleware, &bind)
        .await
        .context("Failed to start dev render hook")?;
    ctx.output.success(&format!(
        "Dev render hook at {}{}",
        handle.local_addr(),
        DEV_RENDER_PATH
    ));

    let signal = shutdown_signal().await;
    handle.stop().await?;
    signal
}
