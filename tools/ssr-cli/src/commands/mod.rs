//! CLI command implementations.

pub mod dev;
pub mod render;
pub mod serve;

use std::path::PathBuf;

use clap::Args;
use ssr_observability::{LogFormat, LogLevel};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Path to the server manifest.json file.
    pub manifest: PathBuf,

    /// Port to run the server on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to run the server on.
    #[arg(long)]
    pub host: Option<String>,

    /// Unix socket to run the server on (overrides host and port).
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Log format (human, json).
    #[arg(long)]
    pub log_format: Option<LogFormat>,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Entry module to render.
    pub entry: String,

    /// JSON object of props passed to the root component.
    #[arg(long, visible_alias = "context")]
    pub props: Option<String>,
}

/// Arguments for the dev command.
#[derive(Args)]
pub struct DevArgs {
    /// Source root to resolve modules from.
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Port to run the dev hook on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to run the dev hook on.
    #[arg(long)]
    pub host: Option<String>,
}

/// Wait for Ctrl+C or SIGTERM.
pub(crate) async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = ctrl_c => result?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await?;

    Ok(())
}
