//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use ssr_observability::{init_logging, LogFormat, LogLevel};

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = match config_path {
            Some(path) => CliConfig::load(path)?,
            // Try to find config in current directory or parent directories
            None => match find_config(&cwd) {
                Some(path) => {
                    output.debug(&format!("Using config {}", path.display()));
                    CliConfig::load(&path.to_string_lossy())?
                }
                None => CliConfig::default(),
            },
        };

        Ok(Self {
            config,
            output,
            cwd,
        })
    }

    /// Install the log subscriber.
    ///
    /// Precedence: explicit flag, then `--verbose`, then the config file.
    pub fn init_logging(&self, level: Option<LogLevel>, format: Option<LogFormat>) -> Result<()> {
        let level = level
            .or(self.output.is_verbose().then_some(LogLevel::Debug))
            .unwrap_or(self.config.server.log_level);
        init_logging(level, format.unwrap_or(self.config.server.log_format))
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

/// Find the nearest config file, walking up from `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    })
}
