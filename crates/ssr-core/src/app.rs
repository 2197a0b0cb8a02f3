//! Application descriptors and instances.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::component::{ChunkSender, Component, RenderContext};
use crate::props::Props;
use crate::template::{TemplateComponent, TemplateError};

/// Hook run once against every fresh instance before it renders.
pub type ConfigureHook = Arc<dyn Fn(&mut AppInstance) -> anyhow::Result<()> + Send + Sync>;

/// Errors produced while decoding an application descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("descriptor is not tagged as {}", SsrApp::TYPE_TAG)]
    MissingTag,

    #[error("malformed descriptor: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),
}

/// A render-capable application: a root component plus an optional
/// configure hook.
///
/// The descriptor is immutable and cheap to clone. Every render starts from
/// [`SsrApp::create_app`], so state never carries over between requests.
#[derive(Clone)]
pub struct SsrApp {
    root: Arc<dyn Component>,
    configure: Option<ConfigureHook>,
}

#[derive(Deserialize)]
struct AppDescriptor {
    component: ComponentDescriptor,
    #[serde(default)]
    globals: Props,
}

#[derive(Deserialize)]
struct ComponentDescriptor {
    #[serde(default)]
    name: Option<String>,
    template: String,
    #[serde(default)]
    props: Vec<String>,
    #[serde(default)]
    data: Props,
}

impl SsrApp {
    /// Field holding the structural discriminant of a data descriptor.
    pub const TAG_FIELD: &'static str = "$type";

    /// Discriminant value identifying an application descriptor.
    pub const TYPE_TAG: &'static str = "SsrApp";

    /// Create an application around a root component.
    pub fn new(root: impl Component + 'static) -> Self {
        Self::from_component(Arc::new(root))
    }

    /// Create an application around a shared root component.
    pub fn from_component(root: Arc<dyn Component>) -> Self {
        Self {
            root,
            configure: None,
        }
    }

    /// Install a configure hook (plugins, global properties, ...).
    pub fn with_configure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut AppInstance) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.configure = Some(Arc::new(hook));
        self
    }

    /// The root component.
    pub fn root_component(&self) -> &Arc<dyn Component> {
        &self.root
    }

    /// Whether a configure hook is installed.
    pub fn has_configure(&self) -> bool {
        self.configure.is_some()
    }

    /// Build a fresh instance for one render.
    pub fn create_app(&self, props: Props) -> anyhow::Result<AppInstance> {
        let mut instance = AppInstance::new(Arc::clone(&self.root), props);
        if let Some(configure) = &self.configure {
            configure(&mut instance)?;
        }
        Ok(instance)
    }

    /// Check whether a data value carries the application descriptor tag.
    ///
    /// This is a structural check: the value only has to look like a
    /// descriptor, wherever it was produced.
    pub fn is_descriptor(value: &Value) -> bool {
        value
            .get(Self::TAG_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|tag| tag == Self::TYPE_TAG)
    }

    /// Decode an application from a tagged data descriptor.
    ///
    /// ```json
    /// {
    ///   "$type": "SsrApp",
    ///   "component": { "template": "<div>{{ msg }}</div>", "props": ["msg"] },
    ///   "globals": { "siteName": "Shop" }
    /// }
    /// ```
    pub fn from_descriptor(value: &Value) -> Result<Self, DescriptorError> {
        if !Self::is_descriptor(value) {
            return Err(DescriptorError::MissingTag);
        }

        let descriptor = AppDescriptor::deserialize(value)?;
        let spec = descriptor.component;

        let mut component = TemplateComponent::parse(&spec.template)?
            .with_props(spec.props)
            .with_data(spec.data);
        if let Some(name) = spec.name {
            component = component.with_name(name);
        }

        let app = Self::new(component);
        if descriptor.globals.is_empty() {
            return Ok(app);
        }

        let globals = descriptor.globals;
        Ok(app.with_configure(move |instance| {
            for (key, value) in &globals {
                instance.set_global(key.clone(), value.clone());
            }
            Ok(())
        }))
    }
}

impl fmt::Debug for SsrApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrApp")
            .field("root", &self.root.name())
            .field("configure", &self.configure.is_some())
            .finish()
    }
}

/// A single-use application instance holding per-render state.
#[derive(Debug)]
pub struct AppInstance {
    root: Arc<dyn Component>,
    props: Props,
    data: Props,
    globals: Props,
}

impl AppInstance {
    /// Create an instance of `root` with the given props.
    pub fn new(root: Arc<dyn Component>, props: Props) -> Self {
        for required in root.props() {
            if !props.contains_key(required) {
                tracing::warn!(
                    component = root.name(),
                    prop = %required,
                    "Missing required prop"
                );
            }
        }

        let data = root.data();
        Self {
            root,
            props,
            data,
            globals: Props::new(),
        }
    }

    /// The root component.
    pub fn root(&self) -> &Arc<dyn Component> {
        &self.root
    }

    /// Input props.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Instance state.
    pub fn data(&self) -> &Props {
        &self.data
    }

    /// Mutable instance state.
    pub fn data_mut(&mut self) -> &mut Props {
        &mut self.data
    }

    /// Application-wide properties.
    pub fn globals(&self) -> &Props {
        &self.globals
    }

    /// Set an application-wide property.
    pub fn set_global(&mut self, key: impl Into<String>, value: Value) {
        self.globals.insert(key.into(), value);
    }

    /// Render the root component into `sink`, consuming the instance.
    ///
    /// Returns the number of chunks written.
    pub async fn render_into(mut self, sink: &mut ChunkSender) -> anyhow::Result<usize> {
        let root = Arc::clone(&self.root);
        let mut cx = RenderContext::new(&self.props, &mut self.data, &self.globals, sink);
        root.render(&mut cx).await?;
        Ok(cx.chunk_count())
    }
}
