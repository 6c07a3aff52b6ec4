//! File-store connector (Google Drive API).
//!
//! Implements [`FileStore`]: full-text search for candidate files
//! mentioning the project, and per-file media downloads into the run's
//! staging directory. The declared `mimeType` rides along on each
//! [`SourceFile`] so dispatch never has to sniff bytes.
//!
//! # Environment Variables
//!
//! - `DRIVE_API_TOKEN` — required OAuth bearer token.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::FileStoreConfig;
use crate::error::FetchError;
use crate::models::SourceFile;
use crate::traits::FileStore;

const SERVICE: &str = "file-store";

pub struct DriveConnector {
    api_base: String,
    token: String,
    max_files: usize,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl DriveConnector {
    /// Create a connector from config and `DRIVE_API_TOKEN`.
    pub fn new(config: &FileStoreConfig) -> Result<Self, FetchError> {
        let token = std::env::var("DRIVE_API_TOKEN")
            .map_err(|_| FetchError::new(SERVICE, "DRIVE_API_TOKEN environment variable not set"))?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token,
            max_files: config.max_files,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl FileStore for DriveConnector {
    async fn list_candidates(&self, project_id: &str) -> Result<Vec<SourceFile>, FetchError> {
        let query = format!("fullText contains '{}'", project_id.replace('\'', "\\'"));
        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("pageSize", &self.max_files.to_string()),
                ("fields", "files(id,name,mimeType,webViewLink)"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(SERVICE, format!("HTTP {}: {}", status, body)));
        }
        let listing: FileList = response
            .json()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;

        Ok(listing
            .files
            .into_iter()
            .map(|f| SourceFile {
                id: f.id,
                name: f.name,
                content_type: f.mime_type,
                origin_url: f.web_view_link,
            })
            .collect())
    }

    async fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let response = self
            .client
            .get(format!("{}/files/{}", self.api_base, file_id))
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(SERVICE, format!("HTTP {}: {}", status, body)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(SERVICE, e.to_string()))?;

        let dest = dest_dir.join(format!("{}.tmp", file_id));
        std::fs::write(&dest, &bytes).map_err(|e| FetchError::new(SERVICE, e.to_string()))?;
        Ok(dest)
    }
}
