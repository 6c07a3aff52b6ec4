use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub file_store: FileStoreConfig,
    #[serde(default)]
    pub issue_tracker: IssueTrackerConfig,
    #[serde(default)]
    pub summarization: SummarizationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_kb_api_base")]
    pub api_base: String,
    /// Name of the overview property that carries the issue-tracker URL.
    #[serde(default = "default_issue_tracker_property")]
    pub issue_tracker_property: String,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            api_base: default_kb_api_base(),
            issue_tracker_property: default_issue_tracker_property(),
        }
    }
}

fn default_kb_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}
fn default_issue_tracker_property() -> String {
    "jira-url".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FileStoreConfig {
    #[serde(default = "default_fs_api_base")]
    pub api_base: String,
    /// Upper bound on candidate files fetched per run.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            api_base: default_fs_api_base(),
            max_files: default_max_files(),
        }
    }
}

fn default_fs_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}
fn default_max_files() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssueTrackerConfig {
    /// Upper bound on issues fetched per run.
    #[serde(default = "default_max_issues")]
    pub max_issues: usize,
    /// Status labels to keep. Empty means keep everything.
    #[serde(default)]
    pub include_statuses: Vec<String>,
}

impl Default for IssueTrackerConfig {
    fn default() -> Self {
        Self {
            max_issues: default_max_issues(),
            include_statuses: Vec::new(),
        }
    }
}

fn default_max_issues() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4".to_string()
}
fn default_temperature() -> f64 {
    0.2
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory for summaries written in inspection mode (`--dry-run`).
    #[serde(default = "default_output_folder")]
    pub folder: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: default_output_folder(),
        }
    }
}

fn default_output_folder() -> PathBuf {
    PathBuf::from(".")
}

impl SummarizationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.file_store.max_files == 0 {
        anyhow::bail!("file_store.max_files must be > 0");
    }

    if config.issue_tracker.max_issues == 0 {
        anyhow::bail!("issue_tracker.max_issues must be > 0");
    }

    if config.knowledge_base.issue_tracker_property.trim().is_empty() {
        anyhow::bail!("knowledge_base.issue_tracker_property must not be empty");
    }

    if config.summarization.is_enabled() && config.summarization.model.trim().is_empty() {
        anyhow::bail!(
            "summarization.model must be specified when provider is '{}'",
            config.summarization.provider
        );
    }

    match config.summarization.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown summarization provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.file_store.max_files, 10);
        assert_eq!(config.issue_tracker.max_issues, 50);
        assert_eq!(config.knowledge_base.issue_tracker_property, "jira-url");
        assert!(!config.summarization.is_enabled());
    }

    #[test]
    fn rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docgen.toml");
        std::fs::write(&path, "[summarization]\nprovider = \"anthropic\"\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn rejects_zero_max_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docgen.toml");
        std::fs::write(&path, "[file_store]\nmax_files = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docgen.toml");
        std::fs::write(
            &path,
            r#"
[knowledge_base]
issue_tracker_property = "tracker-url"

[file_store]
max_files = 3

[issue_tracker]
max_issues = 25
include_statuses = ["Done", "In Progress"]

[summarization]
provider = "openai"
model = "gpt-4"

[output]
folder = "/tmp/out"
"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.knowledge_base.issue_tracker_property, "tracker-url");
        assert_eq!(config.file_store.max_files, 3);
        assert_eq!(config.issue_tracker.include_statuses.len(), 2);
        assert!(config.summarization.is_enabled());
    }
}
