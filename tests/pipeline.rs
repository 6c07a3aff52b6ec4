//! Aggregation pipeline tests over mock connectors.
//!
//! The mocks implement the source traits directly, so these tests exercise
//! the real orchestration (dispatch, staging, failure isolation) without
//! any network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use docgen::aggregate::{collect_project, deliver_summary};
use docgen::config::Config;
use docgen::error::FetchError;
use docgen::models::{IssueRecord, ProjectOverview, SourceFile};
use docgen::summarize::{format_summary, parse_summary};
use docgen::traits::{FileStore, IssueTracker, IssueTrackerProvider, KnowledgeBase};

// ============ Mocks ============

struct MockKb {
    overview: Option<ProjectOverview>,
    published: Mutex<Vec<(String, String)>>,
}

impl MockKb {
    fn with_overview(properties: serde_json::Value) -> Self {
        Self {
            overview: Some(ProjectOverview {
                id: "proj-9".to_string(),
                title: "Orion".to_string(),
                properties: properties.as_object().cloned().unwrap_or_default(),
                content: "Launch program overview.".to_string(),
            }),
            published: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            overview: None,
            published: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl KnowledgeBase for MockKb {
    async fn fetch_overview(&self, _project_id: &str) -> Result<ProjectOverview, FetchError> {
        self.overview
            .clone()
            .ok_or_else(|| FetchError::new("mock-kb", "page not found"))
    }

    async fn publish_summary(
        &self,
        project_id: &str,
        content: &str,
    ) -> Result<String, FetchError> {
        self.published
            .lock()
            .unwrap()
            .push((project_id.to_string(), content.to_string()));
        Ok(format!("mock://pages/{}", project_id))
    }
}

struct MockStore {
    candidates: Vec<SourceFile>,
    /// id -> file bytes; ids absent here fail to download.
    blobs: HashMap<String, Vec<u8>>,
    staging_dirs: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl FileStore for MockStore {
    async fn list_candidates(&self, _project_id: &str) -> Result<Vec<SourceFile>, FetchError> {
        Ok(self.candidates.clone())
    }

    async fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        self.staging_dirs
            .lock()
            .unwrap()
            .push(dest_dir.to_path_buf());
        let bytes = self
            .blobs
            .get(file_id)
            .ok_or_else(|| FetchError::new("mock-store", format!("download failed: {}", file_id)))?;
        let path = dest_dir.join(format!("{}.tmp", file_id));
        std::fs::write(&path, bytes)
            .map_err(|e| FetchError::new("mock-store", e.to_string()))?;
        Ok(path)
    }
}

struct MockTracker {
    issues: Vec<IssueRecord>,
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn list_issues(&self, _project_id: &str) -> Result<Vec<IssueRecord>, FetchError> {
        Ok(self.issues.clone())
    }
}

struct MockProvider {
    issues: Vec<IssueRecord>,
    connected_urls: Mutex<Vec<String>>,
}

impl IssueTrackerProvider for MockProvider {
    fn connect(&self, base_url: &str) -> Result<Box<dyn IssueTracker>, FetchError> {
        self.connected_urls
            .lock()
            .unwrap()
            .push(base_url.to_string());
        Ok(Box::new(MockTracker {
            issues: self.issues.clone(),
        }))
    }
}

// ============ Fixtures ============

fn docx_bytes(text: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let xml = format!(
            r#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>"#,
            text
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

fn source(id: &str, name: &str, content_type: &str) -> SourceFile {
    SourceFile {
        id: id.to_string(),
        name: name.to_string(),
        content_type: content_type.to_string(),
        origin_url: Some(format!("https://files.example/{}", id)),
    }
}

fn issue(key: &str, type_label: &str) -> IssueRecord {
    IssueRecord {
        key: key.to_string(),
        id: key.to_string(),
        title: format!("work on {}", key),
        description: String::new(),
        type_label: type_label.to_string(),
        status_label: "Open".to_string(),
        priority_label: "Medium".to_string(),
    }
}

fn no_tracker() -> MockProvider {
    MockProvider {
        issues: Vec::new(),
        connected_urls: Mutex::new(Vec::new()),
    }
}

// ============ Tests ============

#[tokio::test]
async fn overview_failure_aborts_the_run() {
    let config = Config::default();
    let kb = MockKb::failing();
    let store = MockStore {
        candidates: vec![source("f1", "a.docx", DOCX_MIME)],
        blobs: HashMap::new(),
        staging_dirs: Mutex::new(Vec::new()),
    };

    let result = collect_project(&config, "proj-9", None, &kb, &store, &no_tracker()).await;
    assert!(result.is_err());
    // Nothing was staged: the run stopped before touching the file store.
    assert!(store.staging_dirs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_download_skips_only_that_file() {
    let config = Config::default();
    let kb = MockKb::with_overview(serde_json::json!({}));

    let mut blobs = HashMap::new();
    blobs.insert("f1".to_string(), docx_bytes("first document"));
    blobs.insert("f3".to_string(), docx_bytes("third document"));
    // f2 has no blob, so its download fails
    let store = MockStore {
        candidates: vec![
            source("f1", "a.docx", DOCX_MIME),
            source("f2", "b.docx", DOCX_MIME),
            source("f3", "c.docx", DOCX_MIME),
        ],
        blobs,
        staging_dirs: Mutex::new(Vec::new()),
    };

    let record = collect_project(&config, "proj-9", None, &kb, &store, &no_tracker())
        .await
        .unwrap();

    assert_eq!(record.documents.len(), 2);
    assert_eq!(record.documents[0].source.name, "a.docx");
    assert_eq!(record.documents[1].source.name, "c.docx");
    assert!(record.documents[0]
        .canonical
        .to_plain_text()
        .contains("first document"));
}

#[tokio::test]
async fn staging_directory_is_removed_after_the_run() {
    let config = Config::default();
    let kb = MockKb::with_overview(serde_json::json!({}));
    let mut blobs = HashMap::new();
    blobs.insert("f1".to_string(), docx_bytes("contents"));
    let store = MockStore {
        candidates: vec![source("f1", "a.docx", DOCX_MIME)],
        blobs,
        staging_dirs: Mutex::new(Vec::new()),
    };

    collect_project(&config, "proj-9", None, &kb, &store, &no_tracker())
        .await
        .unwrap();

    let dirs = store.staging_dirs.lock().unwrap();
    assert_eq!(dirs.len(), 1);
    assert!(!dirs[0].exists(), "staging dir must be cleaned up");
}

#[tokio::test]
async fn unsupported_content_type_is_skipped_without_download() {
    let config = Config::default();
    let kb = MockKb::with_overview(serde_json::json!({}));
    let mut blobs = HashMap::new();
    blobs.insert("f1".to_string(), docx_bytes("keep me"));
    blobs.insert("f2".to_string(), b"GIF89a".to_vec());
    let store = MockStore {
        candidates: vec![
            source("f1", "a.docx", DOCX_MIME),
            source("f2", "logo.gif", "image/gif"),
        ],
        blobs,
        staging_dirs: Mutex::new(Vec::new()),
    };

    let record = collect_project(&config, "proj-9", None, &kb, &store, &no_tracker())
        .await
        .unwrap();

    assert_eq!(record.documents.len(), 1);
    assert_eq!(record.documents[0].source.name, "a.docx");
}

#[tokio::test]
async fn limit_caps_the_number_of_documents() {
    let config = Config::default();
    let kb = MockKb::with_overview(serde_json::json!({}));
    let mut blobs = HashMap::new();
    for i in 1..=5 {
        blobs.insert(format!("f{}", i), docx_bytes("doc"));
    }
    let store = MockStore {
        candidates: (1..=5)
            .map(|i| source(&format!("f{}", i), &format!("{}.docx", i), DOCX_MIME))
            .collect(),
        blobs,
        staging_dirs: Mutex::new(Vec::new()),
    };

    let record = collect_project(&config, "proj-9", Some(2), &kb, &store, &no_tracker())
        .await
        .unwrap();
    assert_eq!(record.documents.len(), 2);
    assert_eq!(record.documents[0].source.name, "1.docx");
    assert_eq!(record.documents[1].source.name, "2.docx");
}

#[tokio::test]
async fn issues_collected_from_tracker_referenced_by_the_overview() {
    let mut config = Config::default();
    config.issue_tracker.max_issues = 2;

    let kb = MockKb::with_overview(serde_json::json!({
        "jira-url": { "type": "url", "url": "https://acme.atlassian.net" }
    }));
    let store = MockStore {
        candidates: Vec::new(),
        blobs: HashMap::new(),
        staging_dirs: Mutex::new(Vec::new()),
    };
    let provider = MockProvider {
        issues: vec![issue("OR-1", "Bug"), issue("OR-2", "Task"), issue("OR-3", "Bug")],
        connected_urls: Mutex::new(Vec::new()),
    };

    let record = collect_project(&config, "proj-9", None, &kb, &store, &provider)
        .await
        .unwrap();

    assert_eq!(
        provider.connected_urls.lock().unwrap().as_slice(),
        ["https://acme.atlassian.net"]
    );
    // Truncated to max_issues, keeping arrival order.
    assert_eq!(record.issues.len(), 2);
    assert_eq!(record.issues[0].key, "OR-1");
    assert_eq!(record.issues[1].key, "OR-2");
}

#[tokio::test]
async fn missing_tracker_reference_yields_no_issues() {
    let config = Config::default();
    let kb = MockKb::with_overview(serde_json::json!({}));
    let store = MockStore {
        candidates: Vec::new(),
        blobs: HashMap::new(),
        staging_dirs: Mutex::new(Vec::new()),
    };
    let provider = MockProvider {
        issues: vec![issue("OR-1", "Bug")],
        connected_urls: Mutex::new(Vec::new()),
    };

    let record = collect_project(&config, "proj-9", None, &kb, &store, &provider)
        .await
        .unwrap();

    assert!(record.issues.is_empty());
    assert!(
        provider.connected_urls.lock().unwrap().is_empty(),
        "tracker must not be contacted without a reference"
    );
}

#[tokio::test]
async fn dry_run_writes_the_summary_locally() {
    let out = TempDir::new().unwrap();
    let mut config = Config::default();
    config.output.folder = out.path().to_path_buf();

    let kb = MockKb::with_overview(serde_json::json!({}));
    let store = MockStore {
        candidates: Vec::new(),
        blobs: HashMap::new(),
        staging_dirs: Mutex::new(Vec::new()),
    };

    let record = collect_project(&config, "proj-9", None, &kb, &store, &no_tracker())
        .await
        .unwrap();
    let summary = format_summary(&record, chrono::Utc::now());

    deliver_summary(&config, &kb, "proj-9", &summary, true)
        .await
        .unwrap();

    let path = out.path().join("proj-9_summary.md");
    let written = std::fs::read_to_string(&path).unwrap();
    let parsed = parse_summary(&written);
    assert_eq!(parsed.project_id.as_deref(), Some("proj-9"));
    assert_eq!(parsed.sections, vec!["Project Overview"]);
    assert!(kb.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn publish_sends_the_summary_to_the_knowledge_base() {
    let config = Config::default();
    let kb = MockKb::with_overview(serde_json::json!({}));

    let destination = deliver_summary(&config, &kb, "proj-9", "# Project Summary: proj-9", false)
        .await
        .unwrap();

    assert_eq!(destination, "mock://pages/proj-9");
    let published = kb.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "proj-9");
}

#[tokio::test]
async fn full_run_produces_a_structured_summary() {
    let config = Config::default();
    let kb = MockKb::with_overview(serde_json::json!({
        "jira-url": { "type": "url", "url": "https://acme.atlassian.net" }
    }));
    let mut blobs = HashMap::new();
    blobs.insert("f1".to_string(), docx_bytes("design notes"));
    let store = MockStore {
        candidates: vec![source("f1", "design.docx", DOCX_MIME)],
        blobs,
        staging_dirs: Mutex::new(Vec::new()),
    };
    let provider = MockProvider {
        issues: vec![issue("OR-1", "Bug"), issue("OR-2", "Task")],
        connected_urls: Mutex::new(Vec::new()),
    };

    let record = collect_project(&config, "proj-9", None, &kb, &store, &provider)
        .await
        .unwrap();
    let summary = format_summary(&record, chrono::Utc::now());

    let parsed = parse_summary(&summary);
    assert_eq!(parsed.project_id.as_deref(), Some("proj-9"));
    assert_eq!(
        parsed.sections,
        vec!["Project Overview", "Project Documents", "Project Tasks"]
    );
    assert!(summary.contains("## Orion"));
    assert!(summary.contains("### design.docx"));
    assert!(summary.contains("design notes"));
    assert!(summary.contains("- [OR-1] work on OR-1 (Status: Open)"));
}
