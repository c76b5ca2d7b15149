//! Result types returned by the top-level entry points.

use crate::pipeline::publish::PublishedDashboard;
use crate::pipeline::table::ExtractedTable;
use serde::{Deserialize, Serialize};

/// A table dashboard that was extracted, rendered and published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOutput {
    /// Name derived from the source document (also the file stem).
    pub name: String,
    pub table: ExtractedTable,
    pub published: PublishedDashboard,
}

/// An LLM answer about one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    /// Failed attempts before the successful one.
    pub retries: u32,
    /// Whether the document text was cut to `max_context_chars`.
    pub truncated: bool,
}
