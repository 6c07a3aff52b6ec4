//! # Docgen CLI
//!
//! The `docgen` binary aggregates a project's knowledge-base page, stored
//! documents, and tracked issues into one markdown summary.
//!
//! ## Usage
//!
//! ```bash
//! docgen --config ./config/docgen.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docgen run --project-id <id>` | Aggregate all sources and publish a summary |
//! | `docgen sources` | List sources and their credential status |
//! | `docgen extract <path>` | Extract a single local file to stdout |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect a run locally without publishing
//! docgen run --project-id 1a2b3c4d --dry-run --output-dir ./out
//!
//! # Cap the number of fetched documents
//! docgen run --project-id 1a2b3c4d --limit 3
//!
//! # Extract one spreadsheet to stdout
//! docgen extract ./reports/q3.xlsx
//! ```

mod aggregate;
mod config;
mod connector_drive;
mod connector_jira;
mod connector_notion;
mod dispatch;
mod error;
mod extractor_docx;
mod extractor_pdf;
mod extractor_pptx;
mod extractor_xlsx;
mod models;
mod ooxml;
mod sources;
mod summarize;
mod traits;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::dispatch::DispatchTable;

/// Docgen — aggregate project documentation from a knowledge base, a file
/// store, and an issue tracker into a single markdown summary.
#[derive(Parser)]
#[command(
    name = "docgen",
    about = "Aggregate project documentation into a single markdown summary",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Falls back to built-in defaults when the file does not exist.
    #[arg(long, global = true, default_value = "./config/docgen.toml")]
    config: PathBuf,

    /// Minimum log level (error, warn, info, debug, trace).
    ///
    /// `RUST_LOG` directives take precedence when set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Aggregate one project's sources and produce its summary.
    ///
    /// Fetches the overview from the knowledge base, downloads and extracts
    /// supported documents from the file store, pulls issues from the
    /// tracker referenced by the overview, and synthesizes one summary.
    /// By default the summary is published back to the knowledge base.
    Run {
        /// Knowledge-base page id identifying the project.
        #[arg(long)]
        project_id: String,

        /// Write the summary to a local file instead of publishing it.
        #[arg(long)]
        dry_run: bool,

        /// Directory for `--dry-run` output (overrides `[output].folder`).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Maximum number of files to fetch from the file store.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List sources and whether their credentials are present.
    Sources,

    /// Extract a single local file and print the result to stdout.
    ///
    /// The extractor is chosen from the file extension. Useful for checking
    /// what a given document contributes to a summary.
    Extract {
        /// Path to a .pdf, .docx, .pptx, or .xlsx file.
        path: PathBuf,

        /// Override the content type instead of inferring it from the
        /// file extension.
        #[arg(long)]
        content_type: Option<String>,
    },
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(parse_log_level(&cli.log_level).into())
                .from_env_lossy(),
        )
        .init();
    let cfg = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Run {
            project_id,
            dry_run,
            output_dir,
            limit,
        } => {
            let mut cfg = cfg;
            if let Some(dir) = output_dir {
                cfg.output.folder = dir;
            }
            run_project(&cfg, &project_id, limit, dry_run).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Extract { path, content_type } => {
            extract_one(&path, content_type.as_deref())?;
        }
    }

    Ok(())
}

/// Load config from `path`, falling back to defaults when the file is
/// absent. A present-but-invalid file is still an error.
fn load_or_default(path: &Path) -> Result<config::Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        Ok(config::Config::default())
    }
}

async fn run_project(
    cfg: &config::Config,
    project_id: &str,
    limit: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    let kb = connector_notion::NotionConnector::new(&cfg.knowledge_base)
        .context("Knowledge base connector unavailable")?;
    let files = connector_drive::DriveConnector::new(&cfg.file_store)
        .context("File store connector unavailable")?;
    let tracker = connector_jira::JiraProvider::new(cfg.issue_tracker.clone());

    let record = aggregate::collect_project(cfg, project_id, limit, &kb, &files, &tracker).await?;
    let summary = summarize::synthesize(&cfg.summarization, &record).await;

    let destination = aggregate::deliver_summary(cfg, &kb, project_id, &summary, dry_run).await?;
    println!("Summary for '{}' written to {}", project_id, destination);
    Ok(())
}

fn extract_one(path: &Path, content_type: Option<&str>) -> Result<()> {
    let content_type = match content_type {
        Some(ct) => ct,
        None => content_type_for_extension(path)?,
    };
    let table = DispatchTable::new()?;
    let Some(extractor) = table.resolve(content_type) else {
        return Err(error::HarvestError::DispatchMiss(content_type.to_string()).into());
    };

    let doc = extractor.extract(path);
    if doc.is_empty() {
        eprintln!("No content extracted from {}", path.display());
    } else {
        println!("{}", doc.to_plain_text());
    }
    Ok(())
}

fn content_type_for_extension(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => Ok(dispatch::MIME_PDF),
        "docx" => Ok(dispatch::MIME_DOCX),
        "pptx" => Ok(dispatch::MIME_PPTX),
        "xlsx" => Ok(dispatch::MIME_XLSX),
        other => bail!(
            "Unsupported file extension '{}' (expected pdf, docx, pptx, or xlsx)",
            other
        ),
    }
}
