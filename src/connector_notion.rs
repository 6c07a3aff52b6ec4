//! Knowledge-base connector (Notion API).
//!
//! Implements [`KnowledgeBase`]: fetches the project page plus its child
//! blocks flattened to text, and publishes the finished summary as a new
//! child page. One HTTP call per trait method; the page's raw property map
//! is passed through untouched so the orchestrator can read the
//! issue-tracker cross-reference out of it.
//!
//! # Environment Variables
//!
//! - `NOTION_API_KEY` — required integration token.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::config::KnowledgeBaseConfig;
use crate::error::FetchError;
use crate::models::ProjectOverview;
use crate::traits::KnowledgeBase;

const SERVICE: &str = "knowledge-base";
const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects block append payloads beyond this many children.
const MAX_PUBLISH_BLOCKS: usize = 100;

pub struct NotionConnector {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl NotionConnector {
    /// Create a connector from config and `NOTION_API_KEY`.
    pub fn new(config: &KnowledgeBaseConfig) -> Result<Self, FetchError> {
        let api_key = std::env::var("NOTION_API_KEY")
            .map_err(|_| FetchError::new(SERVICE, "NOTION_API_KEY environment variable not set"))?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(SERVICE, format!("HTTP {}: {}", status, body)));
        }
        response
            .json()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))
    }
}

#[async_trait]
impl KnowledgeBase for NotionConnector {
    async fn fetch_overview(&self, project_id: &str) -> Result<ProjectOverview, FetchError> {
        let page = self
            .get_json(&format!("{}/pages/{}", self.api_base, project_id))
            .await?;

        let properties = page
            .get("properties")
            .and_then(|p| p.as_object())
            .cloned()
            .unwrap_or_default();

        let blocks = self
            .get_json(&format!(
                "{}/blocks/{}/children?page_size=100",
                self.api_base, project_id
            ))
            .await?;
        let content = blocks
            .get("results")
            .and_then(|r| r.as_array())
            .map(|results| blocks_to_text(results))
            .unwrap_or_default();

        Ok(ProjectOverview {
            id: project_id.to_string(),
            title: page_title(&properties).unwrap_or_else(|| "Untitled Project".to_string()),
            properties,
            content,
        })
    }

    async fn publish_summary(
        &self,
        project_id: &str,
        content: &str,
    ) -> Result<String, FetchError> {
        let children: Vec<Value> = content
            .lines()
            .take(MAX_PUBLISH_BLOCKS)
            .map(|line| {
                json!({
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": {
                        "rich_text": [{ "type": "text", "text": { "content": line } }]
                    }
                })
            })
            .collect();

        let payload = json!({
            "parent": { "page_id": project_id },
            "properties": {
                "title": [{ "type": "text", "text": { "content": format!("Summary: {}", project_id) } }]
            },
            "children": children
        });

        let response = self
            .client
            .post(format!("{}/pages", self.api_base))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(SERVICE, format!("HTTP {}: {}", status, body)));
        }
        let created: Value = response
            .json()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;
        created
            .get("url")
            .and_then(|u| u.as_str())
            .map(|u| u.to_string())
            .ok_or_else(|| FetchError::new(SERVICE, "created page response carried no url"))
    }
}

/// Page title: the plain text of the single property of type `title`.
fn page_title(properties: &Map<String, Value>) -> Option<String> {
    for value in properties.values() {
        if value.get("type").and_then(|t| t.as_str()) == Some("title") {
            let text = rich_text_plain(value.get("title")?);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn rich_text_plain(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("plain_text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Flatten page blocks into markdown-ish text: headings, paragraphs,
/// bulleted/numbered list items, and to-dos. Unknown block types are
/// dropped rather than guessed at.
fn blocks_to_text(blocks: &[Value]) -> String {
    let mut parts = Vec::new();
    for block in blocks {
        let Some(block_type) = block.get("type").and_then(|t| t.as_str()) else {
            continue;
        };
        let rich_text = block
            .get(block_type)
            .and_then(|b| b.get("rich_text"))
            .map(rich_text_plain)
            .unwrap_or_default();

        match block_type {
            "heading_1" => parts.push(format!("# {}", rich_text)),
            "heading_2" => parts.push(format!("## {}", rich_text)),
            "heading_3" => parts.push(format!("### {}", rich_text)),
            "paragraph" => parts.push(rich_text),
            "bulleted_list_item" => parts.push(format!("- {}", rich_text)),
            "numbered_list_item" => parts.push(format!("1. {}", rich_text)),
            "to_do" => {
                let checked = block
                    .get("to_do")
                    .and_then(|b| b.get("checked"))
                    .and_then(|c| c.as_bool())
                    .unwrap_or(false);
                parts.push(format!("- [{}] {}", if checked { "x" } else { " " }, rich_text));
            }
            _ => {}
        }
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_block(block_type: &str, text: &str) -> Value {
        json!({
            "type": block_type,
            block_type: { "rich_text": [{ "plain_text": text }] }
        })
    }

    #[test]
    fn blocks_flatten_in_order() {
        let blocks = vec![
            text_block("heading_1", "Overview"),
            text_block("paragraph", "The plan."),
            text_block("bulleted_list_item", "first"),
            text_block("unsupported_widget", "ignored"),
        ];
        assert_eq!(
            blocks_to_text(&blocks),
            "# Overview\n\nThe plan.\n\n- first"
        );
    }

    #[test]
    fn todo_blocks_render_checkbox_state() {
        let mut block = text_block("to_do", "ship it");
        block["to_do"]["checked"] = json!(true);
        assert_eq!(blocks_to_text(&[block]), "- [x] ship it");
    }

    #[test]
    fn title_property_found_by_type() {
        let properties: Map<String, Value> = json!({
            "Status": { "type": "select" },
            "Name": { "type": "title", "title": [{ "plain_text": "Apollo" }] }
        })
        .as_object()
        .cloned()
        .unwrap();
        assert_eq!(page_title(&properties).as_deref(), Some("Apollo"));
    }
}
