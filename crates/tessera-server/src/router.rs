use std::path::{Path, PathBuf};
use std::time::Instant;

use axum::extract::Request;
use axum::http::{header, HeaderName, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ENTRY_PAGE: &str = "index.html";

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, PUT, DELETE"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

/// Directories the router serves from.
#[derive(Debug, Clone)]
pub struct SiteDirs {
    pub root: PathBuf,
    pub chunks: PathBuf,
}

impl SiteDirs {
    pub fn new(root: impl Into<PathBuf>, chunks: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunks: chunks.into(),
        }
    }

    pub fn entry_page(&self) -> PathBuf {
        self.root.join(ENTRY_PAGE)
    }
}

/// `GET /` is the entry page, `/chunks/*` the chunk directory, anything else
/// a file under the root. Every response carries permissive CORS headers.
pub fn build_router(dirs: &SiteDirs) -> Router {
    let mut router = Router::new()
        .route_service("/", ServeFile::new(dirs.entry_page()))
        .nest_service("/chunks", ServeDir::new(&dirs.chunks))
        .fallback_service(ServeDir::new(&dirs.root));

    for (name, value) in CORS_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    router.layer(middleware::from_fn(log_requests))
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if status.is_client_error() || status.is_server_error() {
        log::warn!("{} {} -> {} ({:.1} ms)", method, uri, status, elapsed_ms);
    } else {
        log::info!("{} {} -> {} ({:.1} ms)", method, uri, status, elapsed_ms);
    }
    response
}

/// Absolute form of `path` for log output, when it resolves.
pub fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;
    use std::fs;
    use tower::ServiceExt;

    fn site() -> (tempfile::TempDir, SiteDirs) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("web");
        let chunks = dir.path().join("chunks");
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::create_dir_all(&chunks).unwrap();
        fs::write(root.join(ENTRY_PAGE), "<canvas id=\"tessera-canvas\"></canvas>").unwrap();
        fs::write(root.join("pkg").join("tessera_web.js"), "export default 1;").unwrap();
        fs::write(chunks.join("0_0.glb"), [0x67u8, 0x6c, 0x54, 0x46]).unwrap();
        let dirs = SiteDirs::new(root, chunks);
        (dir, dirs)
    }

    async fn get(dirs: &SiteDirs, uri: &str) -> Response {
        build_router(dirs)
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn assert_cors(response: &Response) {
        for (name, value) in CORS_HEADERS {
            assert_eq!(response.headers().get(&name).unwrap(), value);
        }
    }

    #[tokio::test]
    async fn test_root_serves_entry_page() {
        let (_tmp, dirs) = site();
        let response = get(&dirs, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"<canvas"));
    }

    #[tokio::test]
    async fn test_chunk_route_serves_chunk_dir() {
        let (_tmp, dirs) = site();
        let response = get(&dirs, "/chunks/0_0.glb").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"glTF");
    }

    #[tokio::test]
    async fn test_fallback_serves_root_files() {
        let (_tmp, dirs) = site();
        let response = get(&dirs, "/pkg/tessera_web.js").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_chunk_is_not_found_with_cors() {
        let (_tmp, dirs) = site();
        let response = get(&dirs, "/chunks/9_9.glb").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_cors(&response);
    }
}
