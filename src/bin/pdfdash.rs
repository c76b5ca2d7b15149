//! CLI binary for pdf-dashboard.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `DashboardConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf_dashboard::{
    ask, extract_table, generate_comparison, generate_dashboard, DashboardConfig, DashboardError,
    ErrorKind, ExtractedTable,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Build a dashboard from the first table in a PDF
  pdfdash dashboard uploads/report.pdf

  # Print the recovered table as JSON
  pdfdash table uploads/report.pdf --json

  # Assemble a comparison document from two PDFs
  pdfdash compare a.pdf b.pdf --prompt "Which quarter grew faster?"

  # Ask a question (needs an LLM API key)
  pdfdash ask uploads/report.pdf "What was total revenue?"

  # Run the HTTP server
  pdfdash serve --addr 0.0.0.0:8080

HOW TABLES ARE FOUND:
  Lines whose columns are separated by a tab or by two or more spaces are
  treated as table lines. The first one is the header; later lines with the
  same number of cells become rows. Numbers are recognised with a strict
  grammar (optional sign, digits, one optional decimal point).

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter (overrides --verbose / --quiet)
"#;

/// Build HTML dashboards from PDF tables, compare PDFs, and ask questions about them.
#[derive(Parser, Debug)]
#[command(
    name = "pdfdash",
    version,
    about = "Build HTML dashboards from PDF tables, compare PDFs, and ask questions about them",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory dashboards are written to.
    #[arg(long, global = true, env = "PDFDASH_DASHBOARD_DIR", default_value = "dashboards")]
    dashboard_dir: PathBuf,

    /// Directory uploads are stored in (server).
    #[arg(long, global = true, env = "PDFDASH_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// URL path dashboards are served under.
    #[arg(long, global = true, env = "PDFDASH_URL_PREFIX", default_value = "/dashboards")]
    url_prefix: String,

    /// LLM model ID (e.g. gpt-4.1-nano, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "PDFDASH_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens per answer.
    #[arg(long, global = true, env = "PDFDASH_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PDFDASH_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, global = true, env = "PDFDASH_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-attempt LLM timeout in seconds.
    #[arg(long, global = true, env = "PDFDASH_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Most document characters sent to the LLM.
    #[arg(long, global = true, env = "PDFDASH_MAX_CONTEXT_CHARS", default_value_t = 100_000)]
    max_context_chars: usize,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "PDFDASH_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFDASH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true, env = "PDFDASH_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the first table from a PDF and publish it as an HTML dashboard.
    Dashboard {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
    },

    /// Print the table recovered from a PDF.
    Table {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Output JSON instead of a plain-text grid.
        #[arg(long)]
        json: bool,
    },

    /// Publish a comparison document built from several PDFs and a prompt.
    Compare {
        /// PDFs to compare.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Free-text prompt appended after the document texts.
        #[arg(long, default_value = "")]
        prompt: String,
    },

    /// Ask a question about a PDF.
    Ask {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// The question.
        question: String,

        /// Output the full answer record as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP server.
    #[cfg(feature = "server")]
    Serve {
        /// Address to listen on.
        #[arg(long, env = "PDFDASH_ADDR", default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.common.verbose {
        "debug"
    } else if cli.common.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.common).await?;
    let quiet = cli.common.quiet;

    match cli.command {
        Command::Dashboard { input } => {
            let output = generate_dashboard(&input, &config)
                .await
                .map_err(explain)
                .context("Dashboard generation failed")?;
            if !quiet {
                eprintln!(
                    "{} {} columns × {} rows  →  {}",
                    green("✔"),
                    output.table.column_count(),
                    output.table.row_count(),
                    bold(&output.published.path.display().to_string()),
                );
            }
            println!("{}", output.published.url);
        }

        Command::Table { input, json } => {
            let table = extract_table(&input, &config)
                .await
                .map_err(explain)
                .context("Table extraction failed")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&table).context("Failed to serialise table")?
                );
            } else {
                print!("{}", format_grid(&table));
            }
        }

        Command::Compare { inputs, prompt } => {
            let published = generate_comparison(&inputs, &prompt, &config)
                .await
                .map_err(explain)
                .context("Comparison failed")?;
            if !quiet {
                eprintln!(
                    "{} {} document(s)  →  {}",
                    green("✔"),
                    inputs.len(),
                    bold(&published.path.display().to_string()),
                );
            }
            println!("{}", published.url);
        }

        Command::Ask {
            input,
            question,
            json,
        } => {
            let spinner = (!quiet && !json).then(|| waiting_spinner("Asking the model…"));
            let result = ask(&input, &question, &config).await;
            if let Some(bar) = spinner {
                bar.finish_and_clear();
            }
            let answer = result.map_err(explain).context("Question failed")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&answer).context("Failed to serialise answer")?
                );
            } else {
                println!("{}", answer.answer);
                if !quiet {
                    eprintln!(
                        "   {} tokens in  /  {} tokens out  —  {}ms{}",
                        dim(&answer.input_tokens.to_string()),
                        dim(&answer.output_tokens.to_string()),
                        answer.duration_ms,
                        if answer.truncated {
                            dim("  (document truncated)")
                        } else {
                            String::new()
                        },
                    );
                }
            }
        }

        #[cfg(feature = "server")]
        Command::Serve { addr } => {
            pdf_dashboard::server::serve(addr, config)
                .await
                .with_context(|| format!("Server on {addr} failed"))?;
        }
    }

    Ok(())
}

/// Map CLI args to `DashboardConfig`.
async fn build_config(args: &CommonArgs) -> Result<DashboardConfig> {
    let system_prompt = if let Some(ref path) = args.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = DashboardConfig::builder()
        .dashboard_dir(&args.dashboard_dir)
        .upload_dir(&args.upload_dir)
        .url_prefix(&args.url_prefix)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .max_context_chars(args.max_context_chars)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

/// Prefix library errors with a remediation hint based on their kind.
fn explain(e: DashboardError) -> anyhow::Error {
    let hint = match e.kind() {
        ErrorKind::NoTableFound => "the document was read, but no table layout was recognised",
        ErrorKind::UnreadablePdf => "the document could not be processed; try re-uploading it",
        ErrorKind::StorageError => "the dashboard could not be saved; try again later",
        ErrorKind::LlmError => "the language model could not answer",
        ErrorKind::InvalidInput | ErrorKind::ConfigError | ErrorKind::Internal => "",
    };
    if hint.is_empty() {
        anyhow::Error::new(e)
    } else {
        anyhow::Error::new(e).context(red(hint))
    }
}

fn waiting_spinner(msg: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Render a table as a left-aligned plain-text grid.
fn format_grid(table: &ExtractedTable) -> String {
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect();

    let widths: Vec<usize> = (0..table.column_count())
        .map(|i| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(table.headers[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{v:<w$}"))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&table.headers);
    out.push_str(&line(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
    ));
    for row in &cells {
        out.push_str(&line(row));
    }
    out
}
