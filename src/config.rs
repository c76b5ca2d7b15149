//! Configuration for dashboard generation and question answering.
//!
//! All behaviour is controlled through [`DashboardConfig`], built via
//! [`DashboardConfigBuilder`]. Directories live here rather than in
//! process-wide statics so that tests (and multiple servers in one process)
//! can each point at their own temporary directories.

use crate::error::DashboardError;
use crate::pipeline::extract::{PdfTextExtractor, TextExtractor};
use crate::pipeline::publish::DashboardPublisher;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration shared by every entry point.
///
/// # Example
/// ```rust
/// use pdf_dashboard::DashboardConfig;
///
/// let config = DashboardConfig::builder()
///     .dashboard_dir("/tmp/dashboards")
///     .max_retries(1)
///     .build()
///     .unwrap();
/// assert_eq!(config.url_prefix, "/dashboards");
/// ```
#[derive(Clone)]
pub struct DashboardConfig {
    /// Directory uploaded PDFs are stored in. Default: `uploads`.
    pub upload_dir: PathBuf,

    /// Directory rendered dashboards are written to. Default: `dashboards`.
    ///
    /// Created on first publish, including parents.
    pub dashboard_dir: PathBuf,

    /// URL path under which `dashboard_dir` is served. Default: `/dashboards`.
    pub url_prefix: String,

    /// `<title>` and heading of table dashboards. Default: "PDF Dashboard".
    pub table_title: String,

    /// `<title>` and heading of comparison documents. Default: "Document Comparison".
    pub comparison_title: String,

    /// Upper bound on document characters sent to the LLM. Default: 100 000.
    ///
    /// Longer documents are cut at a character boundary; the question is
    /// always sent in full.
    pub max_context_chars: usize,

    /// Largest accepted upload body in bytes (HTTP server). Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Maximum documents extracted at once for a comparison. Default: 4.
    pub extract_concurrency: usize,

    /// Text extraction backend. Default: [`PdfTextExtractor`].
    pub extractor: Arc<dyn TextExtractor>,

    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for answers. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens per answer. Default: 1024.
    pub max_tokens: usize,

    /// Retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-attempt LLM timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            dashboard_dir: PathBuf::from("dashboards"),
            url_prefix: "/dashboards".to_string(),
            table_title: "PDF Dashboard".to_string(),
            comparison_title: "Document Comparison".to_string(),
            max_context_chars: 100_000,
            max_upload_bytes: 50 * 1024 * 1024,
            extract_concurrency: 4,
            extractor: Arc::new(PdfTextExtractor),
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 1024,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            system_prompt: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("upload_dir", &self.upload_dir)
            .field("dashboard_dir", &self.dashboard_dir)
            .field("url_prefix", &self.url_prefix)
            .field("table_title", &self.table_title)
            .field("comparison_title", &self.comparison_title)
            .field("max_context_chars", &self.max_context_chars)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("extract_concurrency", &self.extract_concurrency)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl DashboardConfig {
    /// Create a new builder for `DashboardConfig`.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder {
            config: Self::default(),
        }
    }

    /// Publisher writing into this config's dashboard directory.
    pub fn publisher(&self) -> DashboardPublisher {
        DashboardPublisher::new(&self.dashboard_dir, &self.url_prefix)
    }
}

/// Builder for [`DashboardConfig`].
pub struct DashboardConfigBuilder {
    config: DashboardConfig,
}

impl fmt::Debug for DashboardConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl DashboardConfigBuilder {
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn dashboard_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dashboard_dir = dir.into();
        self
    }

    /// Trailing slashes are dropped so URLs never contain `//`.
    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        self.config.url_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn table_title(mut self, title: impl Into<String>) -> Self {
        self.config.table_title = title.into();
        self
    }

    pub fn comparison_title(mut self, title: impl Into<String>) -> Self {
        self.config.comparison_title = title.into();
        self
    }

    pub fn max_context_chars(mut self, n: usize) -> Self {
        self.config.max_context_chars = n;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn extract_concurrency(mut self, n: usize) -> Self {
        self.config.extract_concurrency = n.max(1);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = extractor;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DashboardConfig, DashboardError> {
        let c = &self.config;
        if c.dashboard_dir.as_os_str().is_empty() {
            return Err(DashboardError::InvalidConfig(
                "dashboard directory must not be empty".into(),
            ));
        }
        if c.upload_dir.as_os_str().is_empty() {
            return Err(DashboardError::InvalidConfig(
                "upload directory must not be empty".into(),
            ));
        }
        if !c.url_prefix.starts_with('/') {
            return Err(DashboardError::InvalidConfig(format!(
                "URL prefix must be a path such as '/dashboards', got '{}'",
                c.url_prefix
            )));
        }
        if c.max_context_chars == 0 {
            return Err(DashboardError::InvalidConfig(
                "max_context_chars must be ≥ 1".into(),
            ));
        }
        if c.extract_concurrency == 0 {
            return Err(DashboardError::InvalidConfig(
                "extract_concurrency must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(DashboardError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = DashboardConfig::default();
        assert_eq!(c.dashboard_dir, PathBuf::from("dashboards"));
        assert_eq!(c.upload_dir, PathBuf::from("uploads"));
        assert_eq!(c.url_prefix, "/dashboards");
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.max_tokens, 1024);
    }

    #[test]
    fn url_prefix_trailing_slash_is_dropped() {
        let c = DashboardConfig::builder()
            .url_prefix("/static/dash/")
            .build()
            .unwrap();
        assert_eq!(c.url_prefix, "/static/dash");
    }

    #[test]
    fn relative_url_prefix_is_rejected() {
        let err = DashboardConfig::builder()
            .url_prefix("dashboards")
            .build()
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));
    }

    #[test]
    fn root_url_prefix_is_rejected() {
        // "/" trims to "", which cannot be mounted.
        assert!(DashboardConfig::builder().url_prefix("/").build().is_err());
    }

    #[test]
    fn empty_dashboard_dir_is_rejected() {
        let err = DashboardConfig::builder()
            .dashboard_dir("")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("dashboard directory"));
    }

    #[test]
    fn zero_extract_concurrency_is_rejected() {
        let mut builder = DashboardConfig::builder();
        builder.config.extract_concurrency = 0;
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("extract_concurrency"));

        let c = DashboardConfig::builder().extract_concurrency(0).build().unwrap();
        assert_eq!(c.extract_concurrency, 1);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = DashboardConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_hides_provider() {
        let c = DashboardConfig::default();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("dashboard_dir"));
        assert!(!dbg.contains("extractor"));
    }
}
