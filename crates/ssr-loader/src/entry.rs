//! Entry module loading and validation.

use std::fmt;
use std::sync::Arc;

use ssr_core::SsrApp;

use crate::error::EntryLoadError;
use crate::importer::FsImporter;
use crate::module::{Export, ModuleImporter, APP_EXPORT};

/// Loads entry modules and validates their `ssrApp` export.
///
/// The import strategy is injected, so the same validation runs against
/// build output on disk or a dev server's module graph.
#[derive(Clone)]
pub struct EntryLoader {
    importer: Arc<dyn ModuleImporter>,
}

impl EntryLoader {
    /// Create a loader using the given import strategy.
    pub fn new(importer: impl ModuleImporter + 'static) -> Self {
        Self {
            importer: Arc::new(importer),
        }
    }

    /// Create a loader that imports modules from the filesystem.
    pub fn filesystem() -> Self {
        Self::new(FsImporter)
    }

    /// Load the application exported by the module at `specifier`.
    pub async fn load(&self, specifier: &str) -> Result<Arc<SsrApp>, EntryLoadError> {
        let module = match self.importer.import(specifier).await {
            Ok(module) => module,
            Err(error) => {
                tracing::error!(specifier, error = ?error, "Failed to import entry module");
                return Err(EntryLoadError::Import {
                    specifier: specifier.to_string(),
                    source: error,
                });
            }
        };

        let export = match module.get(APP_EXPORT) {
            Some(export) if export.is_truthy() => export,
            _ => {
                return Err(EntryLoadError::MissingExport {
                    specifier: specifier.to_string(),
                })
            }
        };

        match export {
            Export::App(app) => Ok(Arc::clone(app)),
            Export::Value(value) if SsrApp::is_descriptor(value) => SsrApp::from_descriptor(value)
                .map(Arc::new)
                .map_err(|source| EntryLoadError::InvalidApp {
                    specifier: specifier.to_string(),
                    source,
                }),
            Export::Value(_) => Err(EntryLoadError::NotAnApp {
                specifier: specifier.to_string(),
            }),
        }
    }
}

impl Default for EntryLoader {
    fn default() -> Self {
        Self::filesystem()
    }
}

impl fmt::Debug for EntryLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use ssr_core::TemplateComponent;

    use super::*;
    use crate::importer::ModuleRegistry;
    use crate::module::ModuleNamespace;

    fn registry_loader(specifier: &str, module: ModuleNamespace) -> EntryLoader {
        EntryLoader::new(ModuleRegistry::new().with_module(specifier, module))
    }

    fn data_module(export: serde_json::Value) -> ModuleNamespace {
        ModuleNamespace::new().with_export(APP_EXPORT, Export::Value(export))
    }

    #[tokio::test]
    async fn test_load_missing_module() {
        let loader = EntryLoader::new(ModuleRegistry::new());

        let err = loader.load("fixtures/does-not-exist.js").await.unwrap_err();

        assert!(matches!(err, EntryLoadError::Import { .. }));
        assert!(err
            .to_string()
            .contains("could not import module at fixtures/does-not-exist.js"));
    }

    #[tokio::test]
    async fn test_load_module_without_export() {
        let module = ModuleNamespace::new().with_export("component", Export::Value(json!({})));
        let loader = registry_loader("empty.js", module);

        let err = loader.load("empty.js").await.unwrap_err();

        assert!(matches!(err, EntryLoadError::MissingExport { .. }));
        assert!(err.to_string().contains("does not export"));
    }

    #[tokio::test]
    async fn test_load_falsy_export() {
        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            let loader = registry_loader("falsy.js", data_module(falsy));

            let err = loader.load("falsy.js").await.unwrap_err();

            assert!(matches!(err, EntryLoadError::MissingExport { .. }));
        }
    }

    #[tokio::test]
    async fn test_load_export_of_wrong_shape() {
        let loader = registry_loader("not-an-app.js", data_module(json!({"template": "<div/>"})));

        let err = loader.load("not-an-app.js").await.unwrap_err();

        assert!(matches!(err, EntryLoadError::NotAnApp { .. }));
        assert!(err.to_string().contains("not an instance"));
    }

    #[tokio::test]
    async fn test_load_tagged_but_invalid_descriptor() {
        let loader = registry_loader(
            "broken.js",
            data_module(json!({"$type": "SsrApp", "component": {"template": "{{"}})),
        );

        let err = loader.load("broken.js").await.unwrap_err();

        assert!(matches!(err, EntryLoadError::InvalidApp { .. }));
    }

    #[tokio::test]
    async fn test_load_data_descriptor() {
        let loader = registry_loader(
            "basic.js",
            data_module(json!({
                "$type": "SsrApp",
                "component": {"name": "Basic", "template": "<div>{{ msg }}</div>"}
            })),
        );

        let app = loader.load("basic.js").await.unwrap();

        assert_eq!(app.root_component().name(), "Basic");
    }

    #[tokio::test]
    async fn test_load_in_process_app_keeps_identity() {
        let app = Arc::new(SsrApp::new(TemplateComponent::parse("x").unwrap()));
        let module = ModuleNamespace::new().with_export(APP_EXPORT, Export::App(Arc::clone(&app)));
        let loader = registry_loader("native", module);

        let loaded = loader.load("native").await.unwrap();

        assert!(Arc::ptr_eq(&app, &loaded));
    }
}
