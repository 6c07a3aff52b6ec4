//! Summary synthesis: deterministic formatting and the optional LLM backend.
//!
//! The deterministic formatter is the contract: it renders the aggregate
//! record into a fixed markdown structure and is also the skeleton fed to
//! the generative backend when one is configured. [`parse_summary`] is the
//! inverse for the structural parts (header and section order), so tests
//! can round-trip the format.
//!
//! # Backend Selection
//!
//! | Config value | Behavior |
//! |--------------|----------|
//! | `"disabled"` | deterministic formatter only |
//! | `"openai"` | chat completion over the skeleton, with retry/backoff |
//!
//! # Retry Strategy
//!
//! The OpenAI backend retries transient errors with exponential backoff
//! (1s, 2s, 4s, ... capped at 2^5): HTTP 429 and 5xx retry, other 4xx fail
//! immediately, network errors retry. Exhausted retries fall back to the
//! deterministic skeleton — a degraded summary, never a failed run.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::SummarizationConfig;
use crate::models::{AggregateRecord, ExtractedDocument, IssueRecord};

/// Characters of extracted content quoted per document.
const CONTENT_PREVIEW_CHARS: usize = 500;

/// Produce the final summary document for one aggregate record.
///
/// Never fails: missing credentials yield a short diagnostic document and
/// backend errors fall back to the deterministic format.
pub async fn synthesize(config: &SummarizationConfig, record: &AggregateRecord) -> String {
    match config.provider.as_str() {
        "openai" => synthesize_openai(config, record).await,
        _ => format_summary(record, Utc::now()),
    }
}

async fn synthesize_openai(config: &SummarizationConfig, record: &AggregateRecord) -> String {
    let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
        tracing::warn!("OPENAI_API_KEY not set; emitting diagnostic summary");
        return format!(
            "Error: summarization backend not initialized. Please provide an OpenAI API key.\n\nProject ID: {}",
            record.project_id
        );
    };

    let skeleton = format_summary(record, Utc::now());
    match chat_completion(config, &api_key, &skeleton).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "generative summarization failed; using deterministic fallback");
            skeleton
        }
    }
}

async fn chat_completion(
    config: &SummarizationConfig,
    api_key: &str,
    skeleton: &str,
) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": config.model,
        "temperature": config.temperature,
        "messages": [
            {
                "role": "system",
                "content": "You are a technical writer. Rewrite the following project \
                            summary into polished narrative prose. Keep every top-level \
                            markdown heading exactly as given and do not invent facts."
            },
            { "role": "user", "content": skeleton }
        ]
    });

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_chat_response(&json);
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "OpenAI API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                // Client error (not 429) — don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("OpenAI API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Summarization failed after retries")))
}

fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))
}

// ============ Deterministic formatter ============

/// Render the aggregate record into the fixed summary structure.
///
/// Sections appear in fixed order and are omitted entirely when their
/// source is empty. Block ordering inside documents follows extraction
/// order; issue groups follow first-seen type order.
pub fn format_summary(record: &AggregateRecord, generated_at: DateTime<Utc>) -> String {
    let mut parts = vec![format!(
        "# Project Summary: {}\nGenerated on: {}",
        record.project_id,
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )];

    let overview = &record.project_overview;
    if !overview.title.is_empty() || !overview.content.is_empty() {
        let mut section = vec![
            "# Project Overview".to_string(),
            format!("## {}", overview.title),
        ];
        if !overview.content.is_empty() {
            section.push(overview.content.clone());
        }
        parts.push(section.join("\n\n"));
    }

    if !record.documents.is_empty() {
        parts.push(format_documents(&record.documents));
    }

    if !record.issues.is_empty() {
        parts.push(format_issues(&record.issues));
    }

    parts.join("\n\n")
}

fn format_documents(documents: &[ExtractedDocument]) -> String {
    let mut lines = vec!["# Project Documents".to_string()];

    for doc in documents {
        lines.push(format!("### {}", doc.source.name));
        lines.push(format!("- Type: {}", doc.source.content_type));
        if let Some(url) = &doc.source.origin_url {
            lines.push(format!("- URL: {}", url));
        }

        let content = doc.canonical.to_plain_text();
        if !content.is_empty() {
            lines.push(String::new());
            lines.push("**Content Summary:**".to_string());
            lines.push(truncate_chars(&content, CONTENT_PREVIEW_CHARS));
        } else if let Some(error) = &doc.extraction_error {
            lines.push(format!("- Extraction error: {}", error));
        }

        lines.push(String::new());
    }

    lines.join("\n")
}

fn format_issues(issues: &[IssueRecord]) -> String {
    let mut lines = vec!["# Project Tasks".to_string()];

    for (type_label, group) in group_issues_by_type(issues) {
        lines.push(format!("## {}", type_label));
        for issue in group {
            lines.push(format!(
                "- [{}] {} (Status: {})",
                issue.key, issue.title, issue.status_label
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Group issues by type label, preserving first-seen type order and
/// arrival order within each type.
fn group_issues_by_type(issues: &[IssueRecord]) -> Vec<(&str, Vec<&IssueRecord>)> {
    let mut groups: Vec<(&str, Vec<&IssueRecord>)> = Vec::new();
    for issue in issues {
        match groups
            .iter_mut()
            .find(|(label, _)| *label == issue.type_label)
        {
            Some((_, group)) => group.push(issue),
            None => groups.push((issue.type_label.as_str(), vec![issue])),
        }
    }
    groups
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let cut: String = text.chars().take(limit).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

// ============ Structural re-parser ============

/// Structural skeleton recovered from a rendered summary.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedSummary {
    pub project_id: Option<String>,
    /// Top-level section titles, in rendered order.
    pub sections: Vec<String>,
}

/// The fixed section titles [`format_summary`] can emit.
const SECTION_TITLES: [&str; 3] = ["Project Overview", "Project Documents", "Project Tasks"];

/// Recover the header and top-level section boundaries of a rendered
/// summary. Inverse of [`format_summary`] for the structural parts only.
///
/// Only the fixed section titles count as boundaries: overview pages and
/// extracted documents can legitimately contain `# `-prefixed lines of
/// their own, and those are content, not structure.
pub fn parse_summary(text: &str) -> ParsedSummary {
    let mut project_id = None;
    let mut sections = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("# ") {
            if let Some(id) = rest.strip_prefix("Project Summary: ") {
                if project_id.is_none() {
                    project_id = Some(id.to_string());
                }
            } else if SECTION_TITLES.contains(&rest) {
                sections.push(rest.to_string());
            }
        }
    }

    ParsedSummary {
        project_id,
        sections,
    }
}
