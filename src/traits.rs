//! Connector contracts for the three external sources.
//!
//! Each source is a narrow interface with one method per external call, so
//! the orchestrator can be exercised against substitute implementations in
//! tests. The concrete HTTP connectors live in `connector_notion`,
//! `connector_drive`, and `connector_jira`.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ KnowledgeBase │   │  FileStore   │   │ IssueTracker │
//! │ overview /    │   │ list /       │   │ issues       │
//! │ publish       │   │ download     │   │              │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └─────────────┬────┴─────────────────┘
//!                      ▼
//!            collect_project() → AggregateRecord
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{IssueRecord, ProjectOverview, SourceFile};

/// The knowledge base holding the project page: the mandatory source.
///
/// [`fetch_overview`](KnowledgeBase::fetch_overview) is the only call in
/// the whole pipeline whose failure aborts a run.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Fetch the project overview record for `project_id`.
    async fn fetch_overview(&self, project_id: &str) -> Result<ProjectOverview, FetchError>;

    /// Publish the rendered summary back to the knowledge base.
    ///
    /// Returns the URL of the created page.
    async fn publish_summary(&self, project_id: &str, content: &str)
        -> Result<String, FetchError>;
}

/// The cloud file store holding candidate project documents.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List candidate files for the project, in the store's order.
    async fn list_candidates(&self, project_id: &str) -> Result<Vec<SourceFile>, FetchError>;

    /// Download one file into `dest_dir` and return its local path.
    async fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf, FetchError>;
}

/// An issue tracker reached through the URL cross-referenced on the
/// project overview.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// List the project's issues, already normalized.
    async fn list_issues(&self, project_id: &str) -> Result<Vec<IssueRecord>, FetchError>;
}

/// Builds an [`IssueTracker`] once the cross-reference URL is known.
///
/// The tracker client cannot exist before the overview has been read, so
/// the orchestrator receives this factory instead of a client.
pub trait IssueTrackerProvider: Send + Sync {
    fn connect(&self, base_url: &str) -> Result<Box<dyn IssueTracker>, FetchError>;
}
