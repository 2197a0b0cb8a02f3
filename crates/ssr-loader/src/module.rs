//! Module namespaces and the importer seam.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use ssr_core::{json_kind, SsrApp};

/// Well-known export holding an entry's application.
pub const APP_EXPORT: &str = "ssrApp";

/// A single value exported by a module.
#[derive(Debug, Clone)]
pub enum Export {
    /// Plain data, as evaluated from a module file.
    Value(Value),
    /// An application constructed in-process.
    App(Arc<SsrApp>),
}

impl Export {
    /// Truthiness of the export (`null`, `false`, `0` and `""` are falsy).
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::App(_) => true,
            Self::Value(Value::Null) => false,
            Self::Value(Value::Bool(b)) => *b,
            Self::Value(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::Value(Value::String(s)) => !s.is_empty(),
            Self::Value(_) => true,
        }
    }
}

/// Errors produced while evaluating a module source.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("module is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("module must evaluate to an object of exports, got {0}")]
    NotAnObject(&'static str),
}

/// The exports of an imported module.
#[derive(Debug, Clone, Default)]
pub struct ModuleNamespace {
    exports: HashMap<String, Export>,
}

impl ModuleNamespace {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an export.
    pub fn with_export(mut self, name: impl Into<String>, export: Export) -> Self {
        self.exports.insert(name.into(), export);
        self
    }

    /// Add an application under the well-known `ssrApp` export.
    pub fn with_app(self, app: SsrApp) -> Self {
        self.with_export(APP_EXPORT, Export::App(Arc::new(app)))
    }

    /// Evaluate a module from its JSON export table.
    pub fn from_json(value: Value) -> Result<Self, ModuleError> {
        match value {
            Value::Object(map) => Ok(Self {
                exports: map
                    .into_iter()
                    .map(|(name, value)| (name, Export::Value(value)))
                    .collect(),
            }),
            other => Err(ModuleError::NotAnObject(json_kind(&other))),
        }
    }

    /// Parse and evaluate a module source.
    pub fn parse(source: &str) -> Result<Self, ModuleError> {
        Self::from_json(serde_json::from_str(source)?)
    }

    /// Get an export by name.
    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    /// Names of all exports.
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }
}

/// Strategy for loading a module from a specifier.
///
/// Production loads build output directly from disk; development resolves
/// specifiers through the dev server's module graph. Resolution logic never
/// depends on which one is in use.
#[async_trait]
pub trait ModuleImporter: Send + Sync {
    /// Import the module identified by `specifier`.
    async fn import(&self, specifier: &str) -> anyhow::Result<ModuleNamespace>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use ssr_core::TemplateComponent;

    use super::*;

    #[test]
    fn test_export_truthiness() {
        assert!(!Export::Value(json!(null)).is_truthy());
        assert!(!Export::Value(json!(false)).is_truthy());
        assert!(!Export::Value(json!(0)).is_truthy());
        assert!(!Export::Value(json!("")).is_truthy());
        assert!(Export::Value(json!({})).is_truthy());
        assert!(Export::Value(json!([])).is_truthy());
        assert!(Export::Value(json!("x")).is_truthy());
        assert!(Export::Value(json!(-1)).is_truthy());
    }

    #[test]
    fn test_parse_module() {
        let module = ModuleNamespace::parse(r#"{"ssrApp": {"$type": "SsrApp"}, "component": 1}"#)
            .unwrap();

        let mut names: Vec<_> = module.export_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["component", "ssrApp"]);
        assert!(matches!(module.get(APP_EXPORT), Some(Export::Value(_))));
        assert!(module.get("missing").is_none());
    }

    #[test]
    fn test_parse_module_rejects_non_object() {
        assert!(matches!(
            ModuleNamespace::parse("[]"),
            Err(ModuleError::NotAnObject("an array"))
        ));
        assert!(matches!(
            ModuleNamespace::parse("export const x = 1"),
            Err(ModuleError::Syntax(_))
        ));
    }

    #[test]
    fn test_with_app() {
        let app = SsrApp::new(TemplateComponent::parse("x").unwrap());
        let module = ModuleNamespace::new().with_app(app);

        assert!(matches!(module.get(APP_EXPORT), Some(Export::App(_))));
    }
}
