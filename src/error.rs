//! Error types for the pdf-dashboard library.
//!
//! Every entry point returns [`DashboardError`]. Failures are local to one
//! request: nothing here is retried automatically (except LLM calls, inside
//! [`crate::pipeline::llm`]) and nothing aborts the process.
//!
//! Callers that need to react differently to "the document could not be
//! read", "the document has no table" and "the dashboard could not be
//! stored" should match on [`DashboardError::kind`] rather than on message
//! text. The HTTP server uses it to pick status codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf-dashboard library.
#[derive(Debug, Error)]
pub enum DashboardError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The caller supplied something unusable (empty question, bad name, …).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// Text extraction failed: corrupt, encrypted, or otherwise unreadable.
    #[error("Could not read text from PDF '{path}': {detail}")]
    UnreadablePdf { path: PathBuf, detail: String },

    /// The extracted text carries no usable tabular structure.
    #[error("Cannot build a dashboard for this document: {0}")]
    NoTableFound(NoTableReason),

    // ── Storage errors ────────────────────────────────────────────────────
    /// The dashboard directory could not be created or the file written.
    #[error("Failed to store dashboard '{path}': {source}")]
    StorageError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API kept failing after all retries.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { retries: u32, message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why the table parser gave up on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoTableReason {
    /// Fewer than two lines looked tabular (need a header and one row).
    TooFewTabularLines { found: usize },
    /// A header was found but no row had the same number of cells.
    NoValidDataRows { columns: usize },
}

impl fmt::Display for NoTableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoTableReason::TooFewTabularLines { found } => write!(
                f,
                "too few tabular lines (found {found}, need at least 2)"
            ),
            NoTableReason::NoValidDataRows { columns } => {
                write!(f, "no valid data rows (none had {columns} columns)")
            }
        }
    }
}

/// Coarse error category, stable across releases and safe to show callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The document was missing, not a PDF, or its text could not be read.
    UnreadablePdf,
    /// The document was read but holds no table the heuristic recognises.
    NoTableFound,
    /// Writing the dashboard failed; retrying later may help.
    StorageError,
    /// The request itself was malformed.
    InvalidInput,
    /// The LLM provider was missing or kept failing.
    LlmError,
    ConfigError,
    Internal,
}

impl DashboardError {
    /// Category used by the CLI and HTTP layer to choose a remediation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DashboardError::FileNotFound { .. }
            | DashboardError::PermissionDenied { .. }
            | DashboardError::DownloadFailed { .. }
            | DashboardError::DownloadTimeout { .. }
            | DashboardError::NotAPdf { .. }
            | DashboardError::UnreadablePdf { .. } => ErrorKind::UnreadablePdf,
            DashboardError::NoTableFound(_) => ErrorKind::NoTableFound,
            DashboardError::StorageError { .. } => ErrorKind::StorageError,
            DashboardError::InvalidInput(_) => ErrorKind::InvalidInput,
            DashboardError::ProviderNotConfigured { .. } | DashboardError::LlmApiError { .. } => {
                ErrorKind::LlmError
            }
            DashboardError::InvalidConfig(_) => ErrorKind::ConfigError,
            DashboardError::Internal(_) => ErrorKind::Internal,
        }
    }
}
