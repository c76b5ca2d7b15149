//! Input resolution: load a stored PDF (or download one) into memory.
//!
//! Documents are small enough to hold in memory for one request, and the
//! extractor works on bytes, so no temp files are involved. The `%PDF`
//! magic bytes are checked up front so a mislabelled upload is reported as
//! "not a PDF" instead of as an opaque extraction failure.

use crate::error::DashboardError;
use crate::pipeline::publish::dashboard_name;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A PDF loaded into memory.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// Local path, or the URL's last path segment for downloads.
    pub path: PathBuf,
    /// Name used for dashboards and prompts (file stem).
    pub name: String,
    pub bytes: Arc<[u8]>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP/HTTPS URL to PDF bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, DashboardError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input)).await
    }
}

/// Read a local file, mapping I/O failures onto input errors.
pub async fn resolve_local(path: &Path) -> Result<ResolvedInput, DashboardError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DashboardError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DashboardError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    check_magic(path, &bytes)?;
    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());

    Ok(ResolvedInput {
        path: path.to_path_buf(),
        name: dashboard_name(path),
        bytes: Arc::from(bytes),
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, DashboardError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DashboardError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DashboardError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DashboardError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DashboardError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let path = PathBuf::from(filename_from_url(url));
    let bytes = response
        .bytes()
        .await
        .map_err(|e| DashboardError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_magic(&path, &bytes)?;
    info!("Downloaded {} bytes from {}", bytes.len(), url);

    Ok(ResolvedInput {
        name: dashboard_name(&path),
        path,
        bytes: Arc::from(bytes.as_ref()),
    })
}

fn check_magic(path: &Path, bytes: &[u8]) -> Result<(), DashboardError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(DashboardError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Last non-empty path segment of the URL, or `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
