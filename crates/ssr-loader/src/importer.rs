//! Built-in module importers.

use std::collections::HashMap;

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;

use crate::module::{ModuleImporter, ModuleNamespace};

/// Imports modules by reading and evaluating files from disk.
///
/// The specifier is a filesystem path. Every import reads the file again.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImporter;

#[async_trait]
impl ModuleImporter for FsImporter {
    async fn import(&self, specifier: &str) -> anyhow::Result<ModuleNamespace> {
        let source = tokio::fs::read_to_string(specifier)
            .await
            .with_context(|| format!("failed to read module {}", specifier))?;

        ModuleNamespace::parse(&source)
            .with_context(|| format!("failed to evaluate module {}", specifier))
    }
}

/// In-process module table keyed by specifier.
///
/// Useful for entries compiled into the host binary. The table is built up
/// front and never changes while serving.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleNamespace>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under a specifier.
    pub fn with_module(mut self, specifier: impl Into<String>, module: ModuleNamespace) -> Self {
        self.insert(specifier, module);
        self
    }

    /// Register a module under a specifier, replacing any previous one.
    pub fn insert(&mut self, specifier: impl Into<String>, module: ModuleNamespace) {
        self.modules.insert(specifier.into(), module);
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[async_trait]
impl ModuleImporter for ModuleRegistry {
    async fn import(&self, specifier: &str) -> anyhow::Result<ModuleNamespace> {
        self.modules
            .get(specifier)
            .cloned()
            .ok_or_else(|| anyhow!("no module registered for {}", specifier))
    }
}
