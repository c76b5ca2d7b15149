//! LLM interaction: answer a question about one document's text.
//!
//! Prompt wording lives in [`crate::prompts`]; this module owns context
//! budgeting, retries and timeouts.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors and timeouts are usually transient. Each attempt is
//! bounded by `api_timeout_secs`; failed attempts back off exponentially
//! (`retry_backoff_ms * 2^(attempt-1)`), so with the defaults the waits are
//! 500 ms → 1 s → 2 s.

use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::output::Answer;
use crate::prompts::{question_message, DEFAULT_SYSTEM_PROMPT, TRUNCATION_NOTE};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Ask `question` about a document whose text has already been extracted.
///
/// # Errors
/// [`DashboardError::InvalidInput`] for an empty question;
/// [`DashboardError::LlmApiError`] once every attempt has failed.
pub async fn ask_document(
    provider: &Arc<dyn LLMProvider>,
    document_name: &str,
    document_text: &str,
    question: &str,
    config: &DashboardConfig,
) -> Result<Answer, DashboardError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(DashboardError::InvalidInput("question must not be empty".into()));
    }

    let start = Instant::now();
    let (context, truncated) = truncate_chars(document_text, config.max_context_chars);
    if truncated {
        debug!(
            "{}: document cut to {} chars for the LLM",
            document_name, config.max_context_chars
        );
    }
    let context = if truncated {
        format!("{context}{TRUNCATION_NOTE}")
    } else {
        context.to_string()
    };

    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(question_message(document_name, &context, question)),
    ];
    let options = build_options(config);
    let per_attempt = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                document_name, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(per_attempt, provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    document_name, response.prompt_tokens, response.completion_tokens, duration
                );
                return Ok(Answer {
                    answer: response.content.trim().to_string(),
                    input_tokens: response.prompt_tokens,
                    output_tokens: response.completion_tokens,
                    duration_ms: duration.as_millis() as u64,
                    retries: attempt,
                    truncated,
                });
            }
            Ok(Err(e)) => {
                let err_msg = e.to_string();
                warn!("{}: attempt {} failed: {}", document_name, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
            Err(_) => {
                let err_msg = format!("timed out after {}s", config.api_timeout_secs);
                warn!("{}: attempt {} {}", document_name, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(DashboardError::LlmApiError {
        retries: config.max_retries,
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// saturating instead of overflowing for large retry counts.
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
///
/// Returns the kept prefix and whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}

/// Build `CompletionOptions` from the config.
fn build_options(config: &DashboardConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
