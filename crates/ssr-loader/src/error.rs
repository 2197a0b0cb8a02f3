//! Error types for entry and manifest loading.

use std::io;
use std::path::{Path, PathBuf};

use ssr_core::DescriptorError;
use thiserror::Error;

/// The manifest file could not be read or parsed.
#[derive(Debug, Error)]
#[error("could not load manifest at {}", .path.display())]
pub struct ManifestLoadError {
    path: PathBuf,
    #[source]
    source: ManifestCause,
}

/// Underlying cause of a [`ManifestLoadError`].
#[derive(Debug, Error)]
pub enum ManifestCause {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ManifestLoadError {
    /// Create an error for the manifest at `path`.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<ManifestCause>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// The manifest path that failed to load.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying cause.
    pub fn cause(&self) -> &ManifestCause {
        &self.source
    }
}

/// An entry could not be turned into a render-capable application.
#[derive(Debug, Error)]
pub enum EntryLoadError {
    /// The module could not be imported (missing, malformed, failed to evaluate).
    #[error("could not import module at {specifier}. Does it exist?")]
    Import {
        specifier: String,
        #[source]
        source: anyhow::Error,
    },

    /// The module has no usable `ssrApp` export.
    #[error("entry at {specifier} does not export an application instance")]
    MissingExport { specifier: String },

    /// The export exists but is not an application descriptor.
    #[error("export of {specifier} is not an instance of the SSR application wrapper")]
    NotAnApp { specifier: String },

    /// The export is tagged as an application but cannot be built.
    #[error("application exported by {specifier} is invalid: {source}")]
    InvalidApp {
        specifier: String,
        #[source]
        source: DescriptorError,
    },

    /// No manifest entry matches the requested name.
    #[error("entry {name} not found in manifest")]
    UnknownEntry { name: String },
}

/// Failure while resolving a manifest.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Manifest(#[from] ManifestLoadError),

    #[error(transparent)]
    Entry(#[from] EntryLoadError),
}
