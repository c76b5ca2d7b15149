//! Publishing rendered documents into the dashboard directory.
//!
//! The directory is flat: one `.html` file per dashboard, no index and no
//! sidecar files. Table dashboards are named after their source document and
//! overwrite each other on re-publish (last write wins). Comparison documents
//! get a fresh `compare-<millis>.html` name every time.
//!
//! Each write lands in a temp file inside the target directory and is then
//! renamed over the final name, so a concurrent reader (the static file
//! server) sees either the old page or the new one, never a torn write.

use crate::error::DashboardError;
use crate::pipeline::render::Document;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use url::Url;

/// Extension given to every published document.
pub const EXTENSION: &str = "html";

/// Scratch base used only to percent-encode a single path segment.
static SEGMENT_BASE: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/").unwrap());

/// Where a document was written and how to fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedDashboard {
    /// File written on disk.
    pub path: PathBuf,
    /// URL path for static serving, e.g. `/dashboards/report.html`.
    pub url: String,
}

/// Writes documents into one directory.
#[derive(Debug, Clone)]
pub struct DashboardPublisher {
    dir: PathBuf,
    url_prefix: String,
}

impl DashboardPublisher {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let url_prefix: String = url_prefix.into();
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Publish a table dashboard as `<base_name>.html`.
    ///
    /// Publishing the same `base_name` again overwrites the file and returns
    /// the same reference.
    pub async fn publish(
        &self,
        document: &Document,
        base_name: &str,
    ) -> Result<PublishedDashboard, DashboardError> {
        validate_base_name(base_name)?;
        self.write(document, &format!("{base_name}.{EXTENSION}")).await
    }

    /// Publish a comparison document under a name that has not been handed
    /// out before in this process.
    pub async fn publish_comparison(
        &self,
        document: &Document,
    ) -> Result<PublishedDashboard, DashboardError> {
        let name = format!("compare-{}.{EXTENSION}", next_stamp());
        self.write(document, &name).await
    }

    async fn write(
        &self,
        document: &Document,
        file_name: &str,
    ) -> Result<PublishedDashboard, DashboardError> {
        let path = self.dir.join(file_name);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            error!("Cannot create dashboard directory {}: {}", self.dir.display(), e);
            DashboardError::StorageError {
                path: self.dir.clone(),
                source: e,
            }
        })?;

        let dir = self.dir.clone();
        let target = path.clone();
        let html = document.as_str().to_owned();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, html.as_bytes()))
            .await
            .map_err(|e| DashboardError::Internal(format!("Publish task panicked: {e}")))?
            .map_err(|e| {
                error!("Cannot write dashboard {}: {}", path.display(), e);
                DashboardError::StorageError {
                    path: path.clone(),
                    source: e,
                }
            })?;

        let url = format!("{}{}", self.url_prefix, encode_segment(file_name));
        info!("Published {} ({} bytes) → {}", path.display(), document.as_str().len(), url);

        Ok(PublishedDashboard { path, url })
    }
}

/// `/` followed by `segment` percent-encoded, so names with spaces, `#` or
/// `?` still resolve to the published file.
fn encode_segment(segment: &str) -> String {
    let mut url = SEGMENT_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(segment);
    }
    url.path().to_string()
}

/// Write to a temp file in `dir`, then rename it over `target`.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".publish-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// The dashboard name for a source document: its file name without the
/// extension. Falls back to `dashboard` when nothing usable remains.
pub fn dashboard_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| validate_base_name(s).is_ok())
        .unwrap_or_else(|| "dashboard".to_string())
}

fn validate_base_name(name: &str) -> Result<(), DashboardError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(DashboardError::InvalidInput(format!(
            "'{name}' is not a usable dashboard name"
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(DashboardError::InvalidInput(format!(
            "dashboard name '{name}' must not contain path separators"
        )));
    }
    Ok(())
}

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Current unix time in milliseconds, bumped past the previous stamp when
/// two calls land in the same millisecond (or the clock steps back).
fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut prev = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_STAMP.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}
