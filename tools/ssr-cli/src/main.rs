//! SSR CLI - Render entry components and run the render service.
//!
//! Commands:
//! - `ssr serve` - Serve a build manifest over HTTP
//! - `ssr render` - Render one entry module to stdout
//! - `ssr dev` - Serve the development render hook

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{DevArgs, RenderArgs, ServeArgs};

/// SSR CLI - Render components to HTML
#[derive(Parser)]
#[command(name = "ssr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the entries of a build manifest over HTTP
    Serve(ServeArgs),

    /// Render an entry module to stdout and exit
    Render(RenderArgs),

    /// Serve the development render hook
    Dev(DevArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    let ctx = match context::Context::load(cli.config.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let (level, format) = match &cli.command {
        Commands::Serve(args) => (args.log_level, args.log_format),
        _ => (None, None),
    };
    if let Err(e) = ctx.init_logging(level, format) {
        ctx.output.warn(&format!("{:#}", e));
    }

    // Execute command
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args, &ctx).await,
        Commands::Render(args) => commands::render::run(args, &ctx).await,
        Commands::Dev(args) => commands::dev::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
