//! Issue-tracker connector (Jira REST API).
//!
//! Implements [`IssueTracker`] plus the [`IssueTrackerProvider`] factory:
//! the client only exists once the cross-reference URL has been read off
//! the project overview, so construction is deferred behind `connect`.
//!
//! # Environment Variables
//!
//! - `JIRA_EMAIL` — required account email.
//! - `JIRA_API_TOKEN` — required API token (basic auth password).

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::IssueTrackerConfig;
use crate::error::FetchError;
use crate::models::IssueRecord;
use crate::traits::{IssueTracker, IssueTrackerProvider};

const SERVICE: &str = "issue-tracker";

pub struct JiraConnector {
    base_url: String,
    email: String,
    api_token: String,
    max_issues: usize,
    include_statuses: Vec<String>,
    client: reqwest::Client,
}

/// Factory handed to the orchestrator; connects lazily once the overview
/// yields a tracker URL.
pub struct JiraProvider {
    config: IssueTrackerConfig,
}

impl JiraProvider {
    pub fn new(config: IssueTrackerConfig) -> Self {
        Self { config }
    }
}

impl IssueTrackerProvider for JiraProvider {
    fn connect(&self, base_url: &str) -> Result<Box<dyn IssueTracker>, FetchError> {
        let email = std::env::var("JIRA_EMAIL")
            .map_err(|_| FetchError::new(SERVICE, "JIRA_EMAIL environment variable not set"))?;
        let api_token = std::env::var("JIRA_API_TOKEN")
            .map_err(|_| FetchError::new(SERVICE, "JIRA_API_TOKEN environment variable not set"))?;
        Ok(Box::new(JiraConnector {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_token,
            max_issues: self.config.max_issues,
            include_statuses: self.config.include_statuses.clone(),
            client: reqwest::Client::new(),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    id: String,
    fields: JiraFields,
}

#[derive(Debug, Deserialize)]
struct JiraFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    issuetype: Option<NamedField>,
    #[serde(default)]
    status: Option<NamedField>,
    #[serde(default)]
    priority: Option<NamedField>,
}

#[derive(Debug, Deserialize)]
struct NamedField {
    #[serde(default)]
    name: String,
}

#[async_trait]
impl IssueTracker for JiraConnector {
    async fn list_issues(&self, project_id: &str) -> Result<Vec<IssueRecord>, FetchError> {
        let jql = format!("project = \"{}\" ORDER BY created ASC", project_id);
        let response = self
            .client
            .get(format!("{}/rest/api/2/search", self.base_url))
            .basic_auth(&self.email, Some(&self.api_token))
            .query(&[
                ("jql", jql.as_str()),
                ("maxResults", &self.max_issues.to_string()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(SERVICE, format!("HTTP {}: {}", status, body)));
        }
        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;

        let mut issues: Vec<IssueRecord> = search
            .issues
            .into_iter()
            .map(|issue| IssueRecord {
                key: issue.key,
                id: issue.id,
                title: issue.fields.summary,
                description: issue.fields.description.unwrap_or_default(),
                type_label: named(issue.fields.issuetype),
                status_label: named(issue.fields.status),
                priority_label: named(issue.fields.priority),
            })
            .collect();

        if !self.include_statuses.is_empty() {
            issues.retain(|issue| self.include_statuses.contains(&issue.status_label));
        }

        Ok(issues)
    }
}

fn named(field: Option<NamedField>) -> String {
    match field {
        Some(f) if !f.name.is_empty() => f.name,
        _ => "Unknown".to_string(),
    }
}
