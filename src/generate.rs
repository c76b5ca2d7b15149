//! Request-level entry points.
//!
//! Each function handles one request from start to finish: resolve the
//! stored PDF, extract and normalise its text, then either build a
//! dashboard, assemble a comparison document, or ask the LLM. Nothing is
//! shared between calls except the dashboard directory on disk.

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::output::{Answer, DashboardOutput};
use crate::pipeline::input::{self, ResolvedInput};
use crate::pipeline::publish::PublishedDashboard;
use crate::pipeline::table::{parse_table, ExtractedTable};
use crate::pipeline::{extract, llm, normalise, render};
use crate::prompts::comparison_text;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the table from a PDF without rendering or publishing it.
///
/// # Errors
/// Input errors, [`DashboardError::UnreadablePdf`], or
/// [`DashboardError::NoTableFound`].
pub async fn extract_table(
    input_str: impl AsRef<str>,
    config: &DashboardConfig,
) -> Result<ExtractedTable, DashboardError> {
    let (_, text) = load_text(input_str.as_ref(), config).await?;
    parse_table(&text)
}

/// Build a table dashboard for a PDF and publish it as `<stem>.html`.
///
/// Re-running for the same document overwrites the previous dashboard.
///
/// # Example
/// ```rust,no_run
/// use pdf_dashboard::{generate_dashboard, DashboardConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DashboardConfig::default();
/// let out = generate_dashboard("uploads/report.pdf", &config).await?;
/// println!("{}", out.published.url); // /dashboards/report.html
/// # Ok(())
/// # }
/// ```
pub async fn generate_dashboard(
    input_str: impl AsRef<str>,
    config: &DashboardConfig,
) -> Result<DashboardOutput, DashboardError> {
    let start = Instant::now();
    let (resolved, text) = load_text(input_str.as_ref(), config).await?;
    let output = dashboard_from_text(&resolved.name, &text, config).await?;
    info!(
        "Dashboard for {} ready in {}ms: {}",
        resolved.path.display(),
        start.elapsed().as_millis(),
        output.published.url
    );
    Ok(output)
}

/// Parse, render and publish a dashboard from already-extracted text.
pub async fn dashboard_from_text(
    name: &str,
    text: &str,
    config: &DashboardConfig,
) -> Result<DashboardOutput, DashboardError> {
    let table = parse_table(text)?;
    debug!(
        "{}: {} columns × {} rows",
        name,
        table.column_count(),
        table.row_count()
    );
    let document = render::render_table(&table, &config.table_title);
    let published = config.publisher().publish(&document, name).await?;
    Ok(DashboardOutput {
        name: name.to_string(),
        table,
        published,
    })
}

/// Build a comparison document from several PDFs and a free-text prompt.
///
/// The published page holds each document's text followed by the prompt,
/// exactly as assembled. No LLM is called on this path.
pub async fn generate_comparison<S: AsRef<str>>(
    inputs: &[S],
    prompt: &str,
    config: &DashboardConfig,
) -> Result<PublishedDashboard, DashboardError> {
    if inputs.is_empty() {
        return Err(DashboardError::InvalidInput(
            "comparison needs at least one document".into(),
        ));
    }

    let loads: Vec<_> = inputs
        .iter()
        .map(|i| load_named_text(i.as_ref(), config))
        .collect();
    let documents: Vec<(String, String)> = stream::iter(loads)
        .buffered(config.extract_concurrency)
        .try_collect()
        .await?;

    comparison_from_texts(&documents, prompt, config).await
}

/// Load one comparison input as a `(name, text)` pair.
async fn load_named_text(
    input: &str,
    config: &DashboardConfig,
) -> Result<(String, String), DashboardError> {
    let (resolved, text) = load_text(input, config).await?;
    Ok((resolved.name, text))
}

/// Render and publish a comparison from `(name, text)` pairs.
pub async fn comparison_from_texts(
    documents: &[(String, String)],
    prompt: &str,
    config: &DashboardConfig,
) -> Result<PublishedDashboard, DashboardError> {
    let text = comparison_text(documents, prompt);
    let document = render::render_comparison(&text, &config.comparison_title);
    let published = config.publisher().publish_comparison(&document).await?;
    info!(
        "Comparison of {} document(s) published: {}",
        documents.len(),
        published.url
    );
    Ok(published)
}

/// Ask a natural-language question about a PDF.
///
/// # Errors
/// Input and extraction errors, [`DashboardError::ProviderNotConfigured`],
/// or [`DashboardError::LlmApiError`] after all retries.
pub async fn ask(
    input_str: impl AsRef<str>,
    question: &str,
    config: &DashboardConfig,
) -> Result<Answer, DashboardError> {
    if question.trim().is_empty() {
        return Err(DashboardError::InvalidInput("question must not be empty".into()));
    }
    let (resolved, text) = load_text(input_str.as_ref(), config).await?;
    let provider = resolve_provider(config)?;
    llm::ask_document(&provider, &resolved.name, &text, question, config).await
}

/// Synchronous wrapper around [`generate_dashboard`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_dashboard_sync(
    input_str: impl AsRef<str>,
    config: &DashboardConfig,
) -> Result<DashboardOutput, DashboardError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DashboardError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_dashboard(input_str, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve, extract and normalise one document.
async fn load_text(
    input_str: &str,
    config: &DashboardConfig,
) -> Result<(ResolvedInput, String), DashboardError> {
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let raw = extract::extract_text(
        Arc::clone(&config.extractor),
        &resolved.path,
        Arc::clone(&resolved.bytes),
    )
    .await?;
    let text = normalise::normalise_text(&raw);
    Ok((resolved, text))
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. Pre-built provider (`config.provider`)
/// 2. Named provider + model (`config.provider_name`, `config.model`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set
/// 4. `ProviderFactory::from_env` auto-detection
pub fn resolve_provider(config: &DashboardConfig) -> Result<Arc<dyn LLMProvider>, DashboardError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DashboardError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DashboardError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DashboardError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
