//! Development render hook.
//!
//! Mounted into a dev server, the hook renders entries straight from source
//! without a build manifest. Modules are imported again on every request so
//! edits show up on the next render.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use axum::extract::State;
use axum::middleware::from_fn;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use serde_json::Value;
use ssr_loader::{EntryLoader, FsImporter, ModuleImporter, ModuleNamespace};

use crate::body::stream_body;
use crate::error::ApiError;
use crate::request::RenderRequest;
use crate::routes::trace_request;
use crate::server::{serve, Bind, ServerHandle, StartError};

/// Path the render hook is mounted at.
pub const DEV_RENDER_PATH: &str = "/__ssr";

/// Extensions tried, in order, when a specifier has none.
const MODULE_EXTENSIONS: &[&str] = &["json"];

/// Resolves specifiers against a source root, the way a dev server's module
/// graph would.
///
/// Relative specifiers are joined onto `root`; a specifier without an
/// extension also tries each known module extension. Specifiers never
/// resolve outside `root`: `..` segments are rejected and an absolute path
/// outside `root` is read as root-relative.
#[derive(Debug, Clone)]
pub struct DevImporter {
    root: PathBuf,
}

impl DevImporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn candidates(&self, specifier: &str) -> anyhow::Result<Vec<PathBuf>> {
        let trimmed = specifier.trim_start_matches("./");
        let path = Path::new(trimmed);
        if path.components().any(|c| c == Component::ParentDir) {
            bail!("{} escapes {}", specifier, self.root.display());
        }

        let mut bases = Vec::with_capacity(2);
        if path.is_absolute() && path.starts_with(&self.root) {
            bases.push(path.to_path_buf());
        }
        // `/src/x` is root-relative in a dev server
        bases.push(self.root.join(trimmed.trim_start_matches('/')));

        let mut candidates = Vec::new();
        for base in bases {
            let with_ext: Vec<PathBuf> = match base.extension() {
                Some(_) => Vec::new(),
                None => MODULE_EXTENSIONS
                    .iter()
                    .map(|ext| base.with_extension(ext))
                    .collect(),
            };
            candidates.push(base);
            candidates.extend(with_ext);
        }
        Ok(candidates)
    }
}

#[async_trait]
impl ModuleImporter for DevImporter {
    async fn import(&self, specifier: &str) -> anyhow::Result<ModuleNamespace> {
        for candidate in self.candidates(specifier)? {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                tracing::debug!(specifier, path = %candidate.display(), "Resolved dev module");
                return FsImporter.import(&candidate.to_string_lossy()).await;
            }
        }

        Err(anyhow!(
            "cannot resolve {} from {}",
            specifier,
            self.root.display()
        ))
    }
}

/// Dev-server middleware rendering entries at [`DEV_RENDER_PATH`].
///
/// `inputs` maps symbolic entry names to module specifiers (the build's
/// input table). Names not in the table are used as specifiers directly.
#[derive(Debug, Clone)]
pub struct DevMiddleware {
    root: PathBuf,
    inputs: HashMap<String, String>,
}

impl DevMiddleware {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            inputs: HashMap::new(),
        }
    }

    /// Map a symbolic entry name to a module specifier.
    pub fn with_input(mut self, name: impl Into<String>, specifier: impl Into<String>) -> Self {
        self.inputs.insert(name.into(), specifier.into());
        self
    }

    /// Add a whole input table.
    pub fn with_inputs<I, K, V>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inputs
            .extend(inputs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Specifier an entry name resolves to.
    pub fn resolve_input<'a>(&'a self, entry_name: &'a str) -> &'a str {
        self.inputs
            .get(entry_name)
            .map(String::as_str)
            .unwrap_or(entry_name)
    }

    /// Router to merge into a dev server.
    pub fn router(self) -> Router {
        let state = Arc::new(DevState {
            loader: EntryLoader::new(DevImporter::new(self.root.clone())),
            middleware: self,
        });

        Router::new()
            .route(DEV_RENDER_PATH, post(dev_render))
            .with_state(state)
    }
}

struct DevState {
    middleware: DevMiddleware,
    loader: EntryLoader,
}

async fn dev_render(
    State(dev): State<Arc<DevState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let value: Value = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidJson)?;
    let request = RenderRequest::from_value(value)?;

    let specifier = dev.middleware.resolve_input(&request.entry_name);
    tracing::debug!(entry = %request.entry_name, specifier, "Dev render");
    let app = dev.loader.load(specifier).await?;

    let stream = ssr_core::render(&app, request.props).map_err(ApiError::Render)?;
    stream_body(stream).await
}

/// Serve the dev hook standalone.
pub async fn serve_dev(
    middleware: DevMiddleware,
    bind: &Bind,
) -> Result<ServerHandle, StartError> {
    tracing::info!(
        root = %middleware.root().display(),
        "Starting dev render hook at {}",
        DEV_RENDER_PATH
    );
    let app = middleware.router().layer(from_fn(trace_request));
    serve(app, bind).await
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;

    const BASIC_MODULE: &str = r#"{
        "ssrApp": {
            "$type": "SsrApp",
            "component": { "name": "Basic", "template": "<div>{{ msg }}</div>", "props": ["msg"] }
        }
    }"#;

    fn source_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("basic.json"), BASIC_MODULE).unwrap();
        fs::write(dir.path().join("src/basic.json"), BASIC_MODULE).unwrap();
        dir
    }

    async fn start_dev(root: &Path) -> (ServerHandle, String) {
        let middleware = DevMiddleware::new(root).with_input("testComponent", "src/basic.json");
        let handle = serve_dev(middleware, &Bind::new("127.0.0.1", 0, None))
            .await
            .unwrap();
        let url = format!("http://{}{}", handle.local_addr().tcp().unwrap(), DEV_RENDER_PATH);
        (handle, url)
    }

    async fn post(url: &str, body: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(url)
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }

    #[test]
    fn test_resolve_input() {
        let middleware = DevMiddleware::new(".").with_inputs([("a", "src/a.json")]);

        assert_eq!(middleware.resolve_input("a"), "src/a.json");
        assert_eq!(middleware.resolve_input("b"), "b");
    }

    #[tokio::test]
    async fn test_dev_importer_resolves_without_extension() {
        let dir = source_root();
        let importer = DevImporter::new(dir.path());

        assert!(importer.import("basic").await.is_ok());
        assert!(importer.import("./src/basic.json").await.is_ok());
        assert!(importer.import("/src/basic").await.is_ok());

        let err = importer.import("missing").await.unwrap_err();
        assert!(err.to_string().starts_with("cannot resolve missing"));
    }

    #[tokio::test]
    async fn test_dev_importer_stays_inside_root() {
        let dir = source_root();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.json"), BASIC_MODULE).unwrap();
        let importer = DevImporter::new(dir.path().join("src"));

        let err = importer.import("../basic.json").await.unwrap_err();
        assert!(err.to_string().starts_with("../basic.json escapes"));
        assert!(importer.import("./nested/../../basic").await.is_err());

        let secret = outside.path().join("secret.json");
        let err = importer.import(&secret.to_string_lossy()).await.unwrap_err();
        assert!(err.to_string().starts_with("cannot resolve"));

        let inside = dir.path().join("src/basic.json");
        assert!(importer.import(&inside.to_string_lossy()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dev_render_valid_requests() {
        let dir = source_root();
        let (handle, url) = start_dev(dir.path()).await;

        for entry in ["basic", "testComponent"] {
            let body = json!({"entryName": entry, "context": {"msg": "Hello, world!"}});
            let res = post(&url, &body.to_string()).await;

            assert_eq!(res.status(), 200);
            assert_eq!(res.text().await.unwrap(), "<div>Hello, world!</div>");
        }

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_dev_render_invalid_requests() {
        let dir = source_root();
        let (handle, url) = start_dev(dir.path()).await;

        let res = reqwest::get(&url).await.unwrap();
        assert_eq!(res.status(), 405);

        let res = post(&url, "{ nope").await;
        assert_eq!(res.status(), 400);
        assert_eq!(res.text().await.unwrap(), "Invalid JSON");

        let res = post(&url, "{}").await;
        assert_eq!(res.status(), 400);

        let res = post(&url, r#"{"entryName": "../basic", "context": {}}"#).await;
        assert_eq!(res.status(), 400);

        let res = post(&url, r#"{"entryName": "nonExistent", "context": {}}"#).await;
        assert_eq!(res.status(), 400);
        assert!(res
            .text()
            .await
            .unwrap()
            .contains("could not import module at nonExistent"));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_dev_render_picks_up_edits() {
        let dir = source_root();
        let (handle, url) = start_dev(dir.path()).await;
        let body = json!({"entryName": "basic", "props": {"msg": "x"}}).to_string();

        assert_eq!(post(&url, &body).await.text().await.unwrap(), "<div>x</div>");

        let edited = BASIC_MODULE.replace("<div>", "<section>").replace("</div>", "</section>");
        fs::write(dir.path().join("basic.json"), edited).unwrap();

        assert_eq!(
            post(&url, &body).await.text().await.unwrap(),
            "<section>x</section>"
        );
        handle.stop().await.unwrap();
    }
}
