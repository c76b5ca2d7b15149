//! HTTP front end (feature `server`).
//!
//! A thin axum shell over [`crate::generate`]: uploads are stored in
//! `upload_dir`, later requests refer to them by file name, and published
//! dashboards are served statically from `dashboard_dir` under
//! `url_prefix`.
//!
//! Errors are returned as `{"kind": ..., "message": ...}` so a UI can tell
//! "no table in this document" apart from "document unreadable" and
//! "storage failure".

use crate::config::DashboardConfig;
use crate::error::{DashboardError, ErrorKind};
use crate::generate::{ask, generate_comparison, generate_dashboard};
use crate::output::Answer;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

type AppState = Arc<DashboardConfig>;

/// Build the application router.
pub fn router(config: DashboardConfig) -> Router {
    let dashboards = ServeDir::new(&config.dashboard_dir);
    let prefix = config.url_prefix.clone();
    let body_limit = config.max_upload_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_document))
        .route("/ask", post(ask_question))
        .route("/dashboard", post(create_dashboard))
        .route("/compare", post(create_comparison))
        .nest_service(&prefix, dashboards)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, config: DashboardConfig) -> std::io::Result<()> {
    let app = router(config);
    let listener = TcpListener::bind(&addr).await?;
    info!("pdf-dashboard listening on {}", addr);
    axum::serve(listener, app).await
}

// ── Error mapping ────────────────────────────────────────────────────────────

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Wrapper turning [`DashboardError`] into an HTTP response.
pub struct ApiError(DashboardError);

impl From<DashboardError> for ApiError {
    fn from(e: DashboardError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match (&self.0, self.0.kind()) {
            (DashboardError::FileNotFound { .. }, _) => StatusCode::NOT_FOUND,
            (_, ErrorKind::UnreadablePdf) | (_, ErrorKind::NoTableFound) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            (_, ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::LlmError) => StatusCode::BAD_GATEWAY,
            (_, ErrorKind::StorageError) | (_, ErrorKind::ConfigError) | (_, ErrorKind::Internal) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self.0);
        }
        let body = ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "pdf-dashboard",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub size_bytes: usize,
}

/// Store the multipart field `file` (or the first field carrying a file
/// name) into the upload directory.
async fn upload_document(
    State(config): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DashboardError::InvalidInput(format!("Upload error: {e}")))?
    {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| DashboardError::InvalidInput("upload has no file name".into()))?;
        let path = upload_path(&config.upload_dir, &filename)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| DashboardError::InvalidInput(format!("Read error: {e}")))?;

        store_upload(&config.upload_dir, &path, &data).await?;
        info!("Stored upload {} ({} bytes)", path.display(), data.len());

        return Ok(Json(UploadResponse {
            filename: file_name_of(&path),
            size_bytes: data.len(),
        }));
    }

    Err(DashboardError::InvalidInput("No file provided".into()).into())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub filename: String,
    pub question: String,
}

async fn ask_question(
    State(config): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<Answer>, ApiError> {
    let path = upload_path(&config.upload_dir, &req.filename)?;
    let answer = ask(path_str(&path), &req.question, &config).await?;
    Ok(Json(answer))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub url: String,
    pub columns: usize,
    pub rows: usize,
}

async fn create_dashboard(
    State(config): State<AppState>,
    Json(req): Json<DashboardRequest>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let path = upload_path(&config.upload_dir, &req.filename)?;
    let output = generate_dashboard(path_str(&path), &config).await?;
    Ok(Json(DashboardResponse {
        url: output.published.url,
        columns: output.table.column_count(),
        rows: output.table.row_count(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompareRequest {
    pub filenames: Vec<String>,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompareResponse {
    pub url: String,
}

async fn create_comparison(
    State(config): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    let paths = req
        .filenames
        .iter()
        .map(|name| upload_path(&config.upload_dir, name).map(|p| path_str(&p).to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let published = generate_comparison(&paths, &req.prompt, &config).await?;
    Ok(Json(CompareResponse { url: published.url }))
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Map a client-supplied file name to a path inside `upload_dir`.
///
/// Only bare file names are accepted; anything that would leave the
/// directory is rejected.
fn upload_path(upload_dir: &Path, filename: &str) -> Result<PathBuf, DashboardError> {
    let bare = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| *n == filename && !n.trim().is_empty())
        .ok_or_else(|| DashboardError::InvalidInput(format!("invalid file name '{filename}'")))?;
    Ok(upload_dir.join(bare))
}

async fn store_upload(dir: &Path, path: &Path, data: &[u8]) -> Result<(), DashboardError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DashboardError::StorageError {
            path: dir.to_path_buf(),
            source: e,
        })?;
    tokio::fs::write(path, data)
        .await
        .map_err(|e| DashboardError::StorageError {
            path: path.to_path_buf(),
            source: e,
        })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::{ExtractError, TextExtractor};
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    /// Treats the bytes after the `%PDF` magic as the document text.
    struct BodyAsText;

    impl TextExtractor for BodyAsText {
        fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
            Ok(String::from_utf8_lossy(&bytes[4..]).into_owned())
        }
    }

    fn test_config(tmp: &tempfile::TempDir) -> DashboardConfig {
        DashboardConfig::builder()
            .upload_dir(tmp.path().join("uploads"))
            .dashboard_dir(tmp.path().join("dashboards"))
            .extractor(Arc::new(BodyAsText))
            .build()
            .unwrap()
    }

    fn store(tmp: &tempfile::TempDir, name: &str, text: &str) {
        let dir = tmp.path().join("uploads");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), format!("%PDF{text}")).unwrap();
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn send_json(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = send(app, req).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_service() {
        let tmp = tempfile::tempdir().unwrap();
        let req = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send_json(router(test_config(&tmp)), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "pdf-dashboard");
    }

    #[tokio::test]
    async fn upload_stores_file_in_upload_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let multipart = "--XBOUNDARY\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"report.pdf\"\r\n\
Content-Type: application/pdf\r\n\r\n\
%PDFA  B\n1  2\r\n\
--XBOUNDARY--\r\n";
        let req = Request::post("/upload")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(multipart))
            .unwrap();

        let (status, body) = send_json(router(test_config(&tmp)), req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["filename"], "report.pdf");
        let stored = std::fs::read(tmp.path().join("uploads/report.pdf")).unwrap();
        assert_eq!(stored, b"%PDFA  B\n1  2");
    }

    #[tokio::test]
    async fn dashboard_is_published_and_served() {
        let tmp = tempfile::tempdir().unwrap();
        store(&tmp, "Q3 report#1.pdf", "Item  Qty\napples  3\npears  7");
        let app = router(test_config(&tmp));

        let (status, body) = send_json(
            app.clone(),
            post_json("/dashboard", serde_json::json!({ "filename": "Q3 report#1.pdf" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["columns"], 2);
        assert_eq!(body["rows"], 2);
        let url = body["url"].as_str().unwrap().to_string();
        assert_eq!(url, "/dashboards/Q3%20report%231.html");

        let (status, page) = send(app, Request::get(url).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(page).unwrap().contains("<td>pears</td>"));
    }

    #[tokio::test]
    async fn prose_document_is_unprocessable_with_kind() {
        let tmp = tempfile::tempdir().unwrap();
        store(&tmp, "essay.pdf", "Just prose.\nNothing tabular here.");

        let (status, body) = send_json(
            router(test_config(&tmp)),
            post_json("/dashboard", serde_json::json!({ "filename": "essay.pdf" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "no_table_found");
        assert!(body["message"].as_str().unwrap().contains("too few tabular lines"));
    }

    #[tokio::test]
    async fn missing_upload_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = send_json(
            router(test_config(&tmp)),
            post_json("/dashboard", serde_json::json!({ "filename": "ghost.pdf" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "unreadable_pdf");
    }

    #[tokio::test]
    async fn traversal_in_request_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = send_json(
            router(test_config(&tmp)),
            post_json("/dashboard", serde_json::json!({ "filename": "../secret.pdf" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn compare_publishes_fresh_documents() {
        let tmp = tempfile::tempdir().unwrap();
        store(&tmp, "a.pdf", "alpha");
        store(&tmp, "b.pdf", "beta");
        let app = router(test_config(&tmp));
        let req = || {
            post_json(
                "/compare",
                serde_json::json!({ "filenames": ["a.pdf", "b.pdf"], "prompt": "Differences?" }),
            )
        };

        let (s1, first) = send_json(app.clone(), req()).await;
        let (s2, second) = send_json(app.clone(), req()).await;
        assert_eq!((s1, s2), (StatusCode::OK, StatusCode::OK));
        assert_ne!(first["url"], second["url"]);

        let url = first["url"].as_str().unwrap().to_string();
        let (_, page) = send(app, Request::get(url).body(Body::empty()).unwrap()).await;
        let page = String::from_utf8(page).unwrap();
        assert!(page.contains("Document 1: a\nalpha"));
        assert!(page.contains("Differences?"));
    }

    #[tokio::test]
    async fn empty_question_is_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        store(&tmp, "a.pdf", "alpha");
        let (status, body) = send_json(
            router(test_config(&tmp)),
            post_json("/ask", serde_json::json!({ "filename": "a.pdf", "question": " " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "invalid_input");
    }

    #[test]
    fn upload_path_accepts_bare_names() {
        let p = upload_path(Path::new("uploads"), "report.pdf").unwrap();
        assert_eq!(p, PathBuf::from("uploads/report.pdf"));
    }

    #[test]
    fn upload_path_rejects_traversal() {
        for bad in ["../secret.pdf", "a/b.pdf", "/etc/passwd", "", "..", "  "] {
            assert!(
                upload_path(Path::new("uploads"), bad).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn status_codes_follow_error_kind() {
        use crate::error::NoTableReason;
        let cases = [
            (
                DashboardError::NoTableFound(NoTableReason::TooFewTabularLines { found: 0 }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                DashboardError::FileNotFound {
                    path: PathBuf::from("x.pdf"),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                DashboardError::StorageError {
                    path: PathBuf::from("d"),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DashboardError::InvalidInput("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                DashboardError::LlmApiError {
                    retries: 3,
                    message: "503".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
