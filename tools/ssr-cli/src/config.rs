//! CLI configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ssr_observability::{LogFormat, LogLevel};
use ssr_server::{DEFAULT_HOST, DEFAULT_PORT};

/// File names searched for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["ssr.toml", ".ssr.toml", "ssr.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Render server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Dev render hook configuration.
    #[serde(default)]
    pub dev: DevConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Render server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default: 127.0.0.1).
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (default: 3123).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Unix socket path; overrides host and port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<PathBuf>,

    /// Log level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            socket: None,
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
        }
    }
}

/// Dev render hook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Source root modules are resolved from.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Symbolic entry name to module specifier.
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            inputs: BTreeMap::new(),
        }
    }
}
