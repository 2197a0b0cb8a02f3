//! Server lifecycle: bind, serve, stop.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use ssr_loader::{EntryLoader, Manifest, ResolveError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::routes::router;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 3123;

/// Default TCP host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    /// TCP host and port. Port `0` picks a free port.
    Tcp { host: String, port: u16 },
    /// Unix domain socket path.
    Unix(PathBuf),
}

impl Bind {
    /// Pick a bind target. A socket path, when given, wins over host and port.
    pub fn new(host: impl Into<String>, port: u16, socket: Option<PathBuf>) -> Self {
        match socket {
            Some(path) => Self::Unix(path),
            None => Self::Tcp {
                host: host.into(),
                port,
            },
        }
    }
}

impl Default for Bind {
    fn default() -> Self {
        Self::Tcp {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for Bind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "http://{}:{}", host, port),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Options for [`start`].
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Listen address.
    pub bind: Bind,
    /// Loader used to resolve manifest entries.
    pub loader: EntryLoader,
}

impl ServeOptions {
    /// Create options for the given bind target with the filesystem loader.
    pub fn new(bind: Bind) -> Self {
        Self {
            bind,
            loader: EntryLoader::filesystem(),
        }
    }

    /// Use a different entry loader.
    pub fn with_loader(mut self, loader: EntryLoader) -> Self {
        self.loader = loader;
        self
    }
}

/// Address a running server is reachable at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAddr {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl LocalAddr {
    /// TCP address, if bound over TCP.
    pub fn tcp(&self) -> Option<SocketAddr> {
        match self {
            Self::Tcp(addr) => Some(*addr),
            Self::Unix(_) => None,
        }
    }
}

impl fmt::Display for LocalAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "http://{}", addr),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Failure to bring a server up.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The manifest could not be fully resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The listener could not be bound.
    #[error("failed to bind {bind}")]
    Bind {
        bind: String,
        #[source]
        source: io::Error,
    },
}

/// Handle to a running server.
///
/// Dropping the handle leaves the server running; call [`ServerHandle::stop`]
/// to shut it down.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: LocalAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    /// Address the server is listening on.
    pub fn local_addr(&self) -> &LocalAddr {
        &self.local_addr
    }

    /// Stop accepting connections, wait for in-flight requests, and release
    /// the listener.
    pub async fn stop(self) -> anyhow::Result<()> {
        // Err only if the server already exited
        let _ = self.shutdown.send(());
        let result = self.task.await;

        if let LocalAddr::Unix(path) = &self.local_addr {
            remove_socket_file(path)?;
        }

        result??;
        tracing::info!(addr = %self.local_addr, "Server stopped");
        Ok(())
    }
}

/// Resolve the manifest at `manifest_path` and serve it.
///
/// Resolution finishes before anything is bound: a manifest with a broken
/// entry never produces a listening server.
pub async fn start(
    manifest_path: impl AsRef<Path>,
    options: &ServeOptions,
) -> Result<ServerHandle, StartError> {
    let manifest = Manifest::resolve(manifest_path, &options.loader).await?;
    tracing::debug!(
        manifest = %manifest.path().display(),
        entries = ?manifest.entry_names(),
        "Serving entries"
    );
    serve(router(Arc::new(manifest)), &options.bind).await
}

/// Serve an arbitrary router on `bind`.
pub async fn serve(app: Router, bind: &Bind) -> Result<ServerHandle, StartError> {
    let bind_error = |source: io::Error| StartError::Bind {
        bind: bind.to_string(),
        source,
    };
    let (shutdown, signal) = oneshot::channel::<()>();
    let signal = async move {
        let _ = signal.await;
    };

    let (local_addr, task) = match bind {
        Bind::Tcp { host, port } => {
            let listener = tokio::net::TcpListener::bind((host.as_str(), *port))
                .await
                .map_err(bind_error)?;
            let addr = listener.local_addr().map_err(bind_error)?;
            tracing::info!("Server running at http://{}:{}", host, addr.port());

            let task = tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(signal)
                    .await
            });
            (LocalAddr::Tcp(addr), task)
        }
        Bind::Unix(path) => {
            let task = serve_unix(app, path, signal).map_err(bind_error)?;
            tracing::info!("Server running at unix://{}", path.display());
            (LocalAddr::Unix(path.clone()), task)
        }
    };

    Ok(ServerHandle {
        local_addr,
        shutdown,
        task,
    })
}

#[cfg(unix)]
fn serve_unix(
    app: Router,
    path: &Path,
    signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> io::Result<JoinHandle<io::Result<()>>> {
    remove_socket_file(path)?;
    let listener = tokio::net::UnixListener::bind(path)?;

    Ok(tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
    }))
}

#[cfg(not(unix))]
fn serve_unix(
    _app: Router,
    _path: &Path,
    _signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> io::Result<JoinHandle<io::Result<()>>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets are not supported on this platform",
    ))
}

/// Remove a leftover socket file. Regular files are left alone.
#[cfg(unix)]
fn remove_socket_file(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::FileTypeExt;

    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            tracing::debug!(path = %path.display(), "Removing stale socket");
            std::fs::remove_file(path)
        }
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a socket", path.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn remove_socket_file(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const BASIC_MODULE: &str = r#"{
        "ssrApp": {
            "$type": "SsrApp",
            "component": { "name": "Basic", "template": "<div>{{ msg }}</div>", "props": ["msg"] }
        }
    }"#;

    const BROKEN_MODULE: &str = r#"{ "component": {} }"#;

    fn fixture(manifest: serde_json::Value, modules: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("manifest.json"), manifest.to_string()).unwrap();
        for (name, contents) in modules {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn basic_manifest() -> TempDir {
        fixture(
            json!({
                "basic.ts": {"isEntry": true, "file": "basic.js", "name": "testComponent"},
                "_chunk.js": {"file": "chunk.js"}
            }),
            &[("basic.js", BASIC_MODULE)],
        )
    }

    fn ephemeral() -> ServeOptions {
        ServeOptions::new(Bind::new(DEFAULT_HOST, 0, None))
    }

    fn render_url(handle: &ServerHandle) -> String {
        let addr = handle.local_addr().tcp().unwrap();
        format!("http://{}/render", addr)
    }

    async fn post(url: &str, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(url)
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .unwrap()
    }

    #[test]
    fn test_bind_socket_takes_precedence() {
        let bind = Bind::new("0.0.0.0", 8080, Some(PathBuf::from("/tmp/ssr.sock")));

        assert_eq!(bind, Bind::Unix(PathBuf::from("/tmp/ssr.sock")));
        assert_eq!(bind.to_string(), "unix:///tmp/ssr.sock");
        assert_eq!(Bind::default().to_string(), "http://127.0.0.1:3123");
    }

    #[tokio::test]
    async fn test_render_by_source_key_and_name() {
        let dir = basic_manifest();
        let handle = start(dir.path().join("manifest.json"), &ephemeral())
            .await
            .unwrap();
        let url = render_url(&handle);

        for entry in ["basic.ts", "testComponent"] {
            let res = post(
                &url,
                json!({"entryName": entry, "context": {"msg": "Hello, World!"}}),
            )
            .await;

            assert_eq!(res.status(), 200);
            assert_eq!(res.headers()["content-type"], "text/html");
            assert!(res.headers().contains_key("x-request-id"));
            assert_eq!(res.text().await.unwrap(), "<div>Hello, World!</div>");
        }

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_entry_is_client_error() {
        let dir = basic_manifest();
        let handle = start(dir.path().join("manifest.json"), &ephemeral())
            .await
            .unwrap();

        let res = post(
            &render_url(&handle),
            json!({"entryName": "nonExistent.ts", "props": {}}),
        )
        .await;

        assert_eq!(res.status(), 400);
        assert_eq!(
            res.text().await.unwrap(),
            "entry nonExistent.ts not found in manifest"
        );
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_body_is_client_error() {
        let dir = basic_manifest();
        let handle = start(dir.path().join("manifest.json"), &ephemeral())
            .await
            .unwrap();
        let url = render_url(&handle);

        let res = post(&url, json!({"entryName": "testComponent", "props": [1]})).await;
        assert_eq!(res.status(), 400);
        let body: serde_json::Value = serde_json::from_str(&res.text().await.unwrap()).unwrap();
        assert_eq!(body["error"], "invalid request body");
        assert!(body["detail"].is_string());

        let res = reqwest::Client::new()
            .post(&url)
            .body("{ not json")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_post_is_method_not_allowed() {
        let dir = basic_manifest();
        let handle = start(dir.path().join("manifest.json"), &ephemeral())
            .await
            .unwrap();

        let res = reqwest::get(render_url(&handle)).await.unwrap();

        assert_eq!(res.status(), 405);
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = basic_manifest();
        let handle = start(dir.path().join("manifest.json"), &ephemeral())
            .await
            .unwrap();
        let addr = handle.local_addr().tcp().unwrap();

        let res = reqwest::get(format!("http://{}/health", addr)).await.unwrap();

        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "OK");
        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_broken_entry_prevents_start() {
        let dir = fixture(
            json!({"broken.ts": {"isEntry": true, "file": "broken.js", "name": "broken"}}),
            &[("broken.js", BROKEN_MODULE)],
        );

        let err = start(dir.path().join("manifest.json"), &ephemeral())
            .await
            .unwrap_err();

        assert!(matches!(err, StartError::Resolve(ResolveError::Entry(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_serve_over_unix_socket() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let dir = basic_manifest();
        let socket = dir.path().join("ssr.sock");
        let options = ServeOptions::new(Bind::new(DEFAULT_HOST, 0, Some(socket.clone())));
        let handle = start(dir.path().join("manifest.json"), &options)
            .await
            .unwrap();
        assert_eq!(handle.local_addr(), &LocalAddr::Unix(socket.clone()));

        let body = json!({"entryName": "testComponent", "props": {"msg": "sock"}}).to_string();
        let request = format!(
            "POST /render HTTP/1.1\r\nhost: localhost\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let mut stream = tokio::net::UnixStream::connect(&socket).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        // Body arrives chunk-encoded, one render chunk per frame
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("content-type: text/html"));
        assert!(response.contains("sock"));

        handle.stop().await.unwrap();
        assert!(!socket.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unix_socket_refuses_to_replace_regular_file() {
        let dir = basic_manifest();
        let path = dir.path().join("not-a-socket");
        fs::write(&path, "keep me").unwrap();

        let err = serve(Router::new(), &Bind::Unix(path.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, StartError::Bind { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");
    }
}
