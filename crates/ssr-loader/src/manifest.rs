//! Build manifest resolution.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use ssr_core::SsrApp;

use crate::entry::EntryLoader;
use crate::error::{EntryLoadError, ManifestLoadError, ResolveError};

/// One record of the build manifest.
///
/// Extra fields emitted by the build tool (imports, css, assets) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestRecord {
    /// Whether the record is directly renderable.
    #[serde(rename = "isEntry", default)]
    pub is_entry: bool,
    /// Output file, relative to the manifest's directory.
    pub file: String,
    /// Symbolic entry name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Parsed manifest document: source key to record.
pub type ManifestFile = BTreeMap<String, ManifestRecord>;

/// A fully resolved manifest of render-ready entries.
///
/// Every entry is loaded during [`Manifest::resolve`]; a manifest value
/// therefore never holds a half-loaded table. It is immutable afterwards and
/// safe to share between concurrent requests.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    by_name: HashMap<String, Arc<SsrApp>>,
    by_source_key: HashMap<String, Arc<SsrApp>>,
}

impl Manifest {
    /// Read the manifest at `path` and load every entry it declares.
    pub async fn resolve(
        path: impl AsRef<Path>,
        loader: &EntryLoader,
    ) -> Result<Self, ResolveError> {
        let path = path.as_ref().to_path_buf();
        let records = read_manifest(&path).await?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let mut by_name = HashMap::new();
        let mut by_source_key = HashMap::new();

        for (source_key, record) in records.into_iter().filter(|(_, r)| r.is_entry) {
            let entry_path = base.join(&record.file);
            let specifier = entry_path.to_string_lossy();
            tracing::debug!(%source_key, specifier = %specifier, "Loading manifest entry");

            let app = loader.load(&specifier).await?;

            if let Some(name) = record.name {
                if by_name.insert(name.clone(), Arc::clone(&app)).is_some() {
                    tracing::warn!(%name, %source_key, "Duplicate entry name in manifest; last one wins");
                }
            }
            by_source_key.insert(source_key, app);
        }

        tracing::info!(
            manifest = %path.display(),
            entries = by_source_key.len(),
            "Resolved manifest"
        );

        Ok(Self {
            path,
            by_name,
            by_source_key,
        })
    }

    /// Find an entry by name, falling back to its source key.
    pub fn lookup(&self, name: &str) -> Option<&Arc<SsrApp>> {
        self.by_name
            .get(name)
            .or_else(|| self.by_source_key.get(name))
    }

    /// Like [`Manifest::lookup`], but an unknown name is an error.
    pub fn require(&self, name: &str) -> Result<Arc<SsrApp>, EntryLoadError> {
        self.lookup(name)
            .cloned()
            .ok_or_else(|| EntryLoadError::UnknownEntry {
                name: name.to_string(),
            })
    }

    /// Path the manifest was resolved from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.by_source_key.len()
    }

    /// Check if the manifest declares no entries.
    pub fn is_empty(&self) -> bool {
        self.by_source_key.is_empty()
    }

    /// Symbolic names of all entries, sorted.
    pub fn entry_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Source keys of all entries, sorted.
    pub fn source_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.by_source_key.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

async fn read_manifest(path: &Path) -> Result<ManifestFile, ManifestLoadError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ManifestLoadError::new(path, e))?;

    serde_json::from_str(&json).map_err(|e| ManifestLoadError::new(path, e))
}
