//! Project aggregation: fan out across the configured sources and collect
//! one [`AggregateRecord`] per project.
//!
//! # Failure Isolation
//!
//! Only the overview fetch is fatal — without it there is no project to
//! describe. Every other step degrades: a failed file listing yields zero
//! documents, a failed download or unsupported content type skips that one
//! file, and an unreachable issue tracker yields zero issues. Each skip is
//! logged with enough context to chase down later.
//!
//! Downloads are staged in a [`tempfile::TempDir`] that is removed when the
//! run finishes, whether it succeeded or not.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::dispatch::DispatchTable;
use crate::models::{AggregateRecord, ExtractedDocument, IssueRecord, ProjectOverview};
use crate::traits::{FileStore, IssueTrackerProvider, KnowledgeBase};

/// Collect everything known about one project into a single record.
///
/// `limit` lowers the configured file cap but never raises it. Documents
/// and issues keep the order their source returned them in.
pub async fn collect_project(
    config: &Config,
    project_id: &str,
    limit: Option<usize>,
    kb: &dyn KnowledgeBase,
    files: &dyn FileStore,
    tracker_provider: &dyn IssueTrackerProvider,
) -> Result<AggregateRecord> {
    tracing::info!(project_id, "collecting project sources");

    let overview = kb
        .fetch_overview(project_id)
        .await
        .with_context(|| format!("Failed to fetch overview for project '{}'", project_id))?;

    let max_files = match limit {
        Some(limit) => limit.min(config.file_store.max_files),
        None => config.file_store.max_files,
    };
    let documents = collect_documents(files, project_id, max_files).await;
    let issues = collect_issues(config, &overview, project_id, tracker_provider).await;

    tracing::info!(
        project_id,
        documents = documents.len(),
        issues = issues.len(),
        "project collection complete"
    );

    Ok(AggregateRecord {
        project_id: project_id.to_string(),
        project_overview: overview,
        documents,
        issues,
    })
}

async fn collect_documents(
    files: &dyn FileStore,
    project_id: &str,
    max_files: usize,
) -> Vec<ExtractedDocument> {
    let candidates = match files.list_candidates(project_id).await {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(project_id, error = %e, "file listing failed; continuing without documents");
            return Vec::new();
        }
    };

    let table = match DispatchTable::new() {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!(error = %e, "extractor table unavailable; continuing without documents");
            return Vec::new();
        }
    };

    let staging = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "cannot create staging directory; continuing without documents");
            return Vec::new();
        }
    };

    let mut documents = Vec::new();

    for source in candidates.into_iter().take(max_files) {
        let Some(extractor) = table.resolve(&source.content_type) else {
            tracing::warn!(
                file = %source.name,
                content_type = %source.content_type,
                "no extractor for content type; skipping"
            );
            continue;
        };

        let local = match files.download(&source.id, staging.path()).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(file = %source.name, error = %e, "download failed; skipping");
                continue;
            }
        };

        tracing::debug!(file = %source.name, extractor = extractor.name(), "extracting");
        let canonical = extractor.extract(&local);
        let extraction_error = if canonical.is_empty() {
            Some(format!("No content extracted from '{}'", source.name))
        } else {
            None
        };

        documents.push(ExtractedDocument {
            source,
            canonical,
            extraction_error,
        });
    }

    // staging dir dropped here, downloads removed
    documents
}

async fn collect_issues(
    config: &Config,
    overview: &ProjectOverview,
    project_id: &str,
    tracker_provider: &dyn IssueTrackerProvider,
) -> Vec<IssueRecord> {
    let property = &config.knowledge_base.issue_tracker_property;
    let Some(base_url) = tracker_base_url(overview, property) else {
        tracing::info!(
            project_id,
            property,
            "overview carries no issue-tracker reference; skipping issues"
        );
        return Vec::new();
    };

    let tracker = match tracker_provider.connect(base_url) {
        Ok(tracker) => tracker,
        Err(e) => {
            tracing::warn!(project_id, error = %e, "issue tracker unavailable; continuing without issues");
            return Vec::new();
        }
    };

    let mut issues = match tracker.list_issues(project_id).await {
        Ok(issues) => issues,
        Err(e) => {
            tracing::warn!(project_id, error = %e, "issue listing failed; continuing without issues");
            return Vec::new();
        }
    };

    issues.truncate(config.issue_tracker.max_issues);
    issues
}

/// Read the issue-tracker base URL out of an overview property.
///
/// The knowledge base stores cross-references as URL-typed properties, so
/// the value of interest lives under the property's `url` key.
fn tracker_base_url<'a>(overview: &'a ProjectOverview, property: &str) -> Option<&'a str> {
    overview
        .properties
        .get(property)
        .and_then(|v| v.get("url"))
        .and_then(|v| v.as_str())
        .filter(|url| !url.is_empty())
}

/// Hand the finished summary off: publish to the knowledge base, or write it
/// under the configured output folder in dry-run mode. Returns a description
/// of where the summary landed.
pub async fn deliver_summary(
    config: &Config,
    kb: &dyn KnowledgeBase,
    project_id: &str,
    summary: &str,
    dry_run: bool,
) -> Result<String> {
    if dry_run {
        let path: PathBuf = config
            .output
            .folder
            .join(format!("{}_summary.md", project_id));
        std::fs::create_dir_all(&config.output.folder)
            .with_context(|| format!("Failed to create {}", config.output.folder.display()))?;
        std::fs::write(&path, summary)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "summary written");
        return Ok(path.display().to_string());
    }

    let destination = kb
        .publish_summary(project_id, summary)
        .await
        .with_context(|| format!("Failed to publish summary for project '{}'", project_id))?;
    tracing::info!(destination, "summary published");
    Ok(destination)
}
