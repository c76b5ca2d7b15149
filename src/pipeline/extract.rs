//! Text extraction: PDF bytes → plain text.
//!
//! The default backend is `pdf-extract`, which lays glyph runs out with
//! spaces and tabs approximating their horizontal positions. That spacing is
//! the only signal the table heuristic has, so swapping the backend changes
//! which documents yield dashboards.
//!
//! Extraction is CPU-bound and the parser underneath is synchronous, so it
//! runs inside `spawn_blocking`. `pdf-extract` has been known to panic on
//! malformed input; a panicked extraction task is reported as an unreadable
//! document rather than taking the request down.

use crate::error::DashboardError;
use std::error::Error as StdError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Error type returned by extraction backends.
pub type ExtractError = Box<dyn StdError + Send + Sync>;

/// A backend that turns raw PDF bytes into plain text.
///
/// Implementations must be cheap to share across requests; they are held in
/// an `Arc` inside [`crate::DashboardConfig`].
pub trait TextExtractor: Send + Sync {
    /// Extract the document's text. Fails for corrupt or encrypted input.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// [`TextExtractor`] backed by the `pdf-extract` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string().into())
    }
}

/// Run `extractor` on `bytes` off the async executor.
///
/// `source` is only used to label errors and log lines.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    source: &Path,
    bytes: Arc<[u8]>,
) -> Result<String, DashboardError> {
    let path = source.to_path_buf();

    let joined = tokio::task::spawn_blocking(move || extractor.extract_text(&bytes)).await;

    match joined {
        Ok(Ok(text)) => {
            debug!("Extracted {} chars from {}", text.len(), path.display());
            Ok(text)
        }
        Ok(Err(e)) => {
            warn!("Text extraction failed for {}: {}", path.display(), e);
            Err(DashboardError::UnreadablePdf {
                path,
                detail: e.to_string(),
            })
        }
        Err(join_err) if join_err.is_panic() => {
            warn!("Text extraction panicked for {}", path.display());
            Err(DashboardError::UnreadablePdf {
                path,
                detail: "PDF parser aborted on malformed input".to_string(),
            })
        }
        Err(join_err) => Err(DashboardError::Internal(format!(
            "Extraction task failed: {join_err}"
        ))),
    }
}
