//! # pdf-dashboard
//!
//! Ask questions about PDF documents, compare several documents, and turn
//! tables found in a PDF's text into static HTML dashboards.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      read the stored file (or download a URL), check %PDF
//!  ├─ 2. Extract    pdf-extract → plain text (spawn_blocking)
//!  ├─ 3. Normalise  line endings, page breaks, invisible characters
//!  ├─ 4. Table      tab / wide-gap heuristic → headers + typed rows
//!  ├─ 5. Render     self-contained, fully escaped HTML
//!  └─ 6. Publish    <dashboard_dir>/<stem>.html → /dashboards/<stem>.html
//! ```
//!
//! Question answering shares steps 1–3 and then calls an LLM through
//! `edgequake-llm`. Comparison shares steps 1–3 and renders the assembled
//! document texts plus the user's prompt verbatim; it does not call a model.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_dashboard::{generate_dashboard, DashboardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::builder()
//!         .dashboard_dir("public/dashboards")
//!         .build()?;
//!     let out = generate_dashboard("uploads/report.pdf", &config).await?;
//!     println!("{} ({} rows)", out.published.url, out.table.row_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdfdash` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | Enables [`server`], an axum HTTP front end |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DashboardConfig, DashboardConfigBuilder};
pub use error::{DashboardError, ErrorKind, NoTableReason};
pub use generate::{
    ask, comparison_from_texts, dashboard_from_text, extract_table, generate_comparison,
    generate_dashboard, generate_dashboard_sync,
};
pub use output::{Answer, DashboardOutput};
pub use pipeline::extract::{PdfTextExtractor, TextExtractor};
pub use pipeline::publish::{DashboardPublisher, PublishedDashboard};
pub use pipeline::render::{render_comparison, render_table, Document};
pub use pipeline::table::{
    parse_table, CellValue, ExtractedTable, LineHeuristic, TableParser, WhitespaceHeuristic,
};
