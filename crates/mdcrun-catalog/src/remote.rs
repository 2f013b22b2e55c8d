//! Remote catalog client.
//!
//! The server exposes a list endpoint returning
//! `[{"name": "...", "url": "...", "description": "..."}]` plus raw script
//! downloads. Downloaded scripts are written into a local directory so the
//! execution bridge always receives a filesystem path.
//!
//! # Operations
//!
//! - **fetch_index**: read the list endpoint
//! - **fetch_listed**: index + download every listed script
//! - **fetch_direct**: download a fixed list of file names (servers without a list endpoint)

use crate::descriptor::{extract_description, AutomationDescriptor};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Path segment of the list endpoint
const LIST_SUFFIX: &str = "/list";

/// One entry of the remote list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Script file name
    pub name: String,
    /// Absolute or base-relative download location (defaults to `name`)
    #[serde(default)]
    pub url: Option<String>,
    /// Description supplied by the server
    #[serde(default)]
    pub description: Option<String>,
}

/// Remote catalog client
pub struct RemoteCatalog {
    base_url: String,
    list_url: String,
    download_dir: PathBuf,
    client: reqwest::Client,
}

impl RemoteCatalog {
    /// Create a client for `remote_url`, storing downloads in `download_dir`.
    ///
    /// `remote_url` may be the server base or the list endpoint itself.
    pub fn new(remote_url: &str, download_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let trimmed = remote_url.trim_end_matches('/');
        let base_url = trimmed.strip_suffix(LIST_SUFFIX).unwrap_or(trimmed).to_string();
        let list_url = format!("{base_url}{LIST_SUFFIX}");

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            list_url,
            download_dir: download_dir.into(),
            client,
        })
    }

    /// Server base URL (without the list suffix)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List endpoint URL
    pub fn list_url(&self) -> &str {
        &self.list_url
    }

    /// Resolve a download reference against the server base
    pub fn resolve(&self, reference: &str) -> String {
        if reference.starts_with("http") {
            reference.to_string()
        } else {
            format!("{}/{}", self.base_url, reference.trim_start_matches('/'))
        }
    }

    /// Fetch the list endpoint
    #[instrument(skip(self), fields(url = %self.list_url))]
    pub async fn fetch_index(&self) -> Result<Vec<RemoteEntry>> {
        let body = self.get_text(&self.list_url).await?;
        let entries: Vec<RemoteEntry> = serde_json::from_str(&body)
            .map_err(|e| Error::Serialization(format!("Failed to parse catalog index: {e}")))?;
        debug!(count = entries.len(), "Fetched remote catalog index");
        Ok(entries)
    }

    /// Download the raw content of one script
    pub async fn download(&self, reference: &str) -> Result<String> {
        self.get_text(&self.resolve(reference)).await
    }

    /// Fetch the index and download every listed script.
    ///
    /// All or nothing: a script that cannot be downloaded fails the whole
    /// listing so the caller can fall back.
    pub async fn fetch_listed(&self) -> Result<Vec<AutomationDescriptor>> {
        let entries = self.fetch_index().await?;
        let mut descriptors = Vec::with_capacity(entries.len());

        for entry in entries {
            let reference = entry.url.as_deref().unwrap_or(&entry.name);
            let (path, content) = self.fetch_entry(&entry.name, reference).await.map_err(|e| {
                warn!(name = %entry.name, error = %e, "Listed automation could not be downloaded");
                e
            })?;
            let description = entry
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| extract_description(&content));
            descriptors.push(
                AutomationDescriptor::remote(&entry.name, path, description)
                    .with_remote_url(entry.url),
            );
        }

        Ok(descriptors)
    }

    /// Download each of `names` directly, skipping failures.
    pub async fn fetch_direct(&self, names: &[String]) -> Vec<AutomationDescriptor> {
        let mut descriptors = Vec::new();

        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            match self.fetch_entry(name, name).await {
                Ok((path, content)) => descriptors.push(AutomationDescriptor::remote(
                    name,
                    path,
                    extract_description(&content),
                )),
                Err(e) => debug!(name, error = %e, "Direct download failed"),
            }
        }

        descriptors
    }

    async fn fetch_entry(&self, name: &str, reference: &str) -> Result<(String, String)> {
        let content = self.download(reference).await?;
        let path = self.store_local(name, &content)?;
        Ok((path.to_string_lossy().into_owned(), content))
    }

    /// Write downloaded content to the download directory.
    ///
    /// Only the final path component of `name` is used.
    fn store_local(&self, name: &str, content: &str) -> Result<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| Error::InvalidName(name.to_string()))?;
        fs::create_dir_all(&self.download_dir)?;
        let path = self.download_dir.join(file_name);
        fs::write(&path, content)?;
        Ok(path)
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(Error::Http {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        resp.text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read body from {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> RemoteCatalog {
        RemoteCatalog::new(url, "unused", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_list_url_appended() {
        let remote = client("https://mdc.example.com/files/");
        assert_eq!(remote.list_url(), "https://mdc.example.com/files/list");
        assert_eq!(remote.base_url(), "https://mdc.example.com/files");
    }

    #[test]
    fn test_list_url_kept_when_given() {
        let remote = client("https://mdc.example.com/files/list");
        assert_eq!(remote.list_url(), "https://mdc.example.com/files/list");
        assert_eq!(remote.base_url(), "https://mdc.example.com/files");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let remote = client("https://mdc.example.com/files");
        assert_eq!(
            remote.resolve("links.mdc"),
            "https://mdc.example.com/files/links.mdc"
        );
        assert_eq!(
            remote.resolve("/links.mdc"),
            "https://mdc.example.com/files/links.mdc"
        );
        assert_eq!(
            remote.resolve("https://cdn.example.com/x.mdc"),
            "https://cdn.example.com/x.mdc"
        );
    }

    #[test]
    fn test_entry_optional_fields() {
        let entry: RemoteEntry = serde_json::from_str(r#"{"name":"a.mdc"}"#).unwrap();
        assert_eq!(entry.name, "a.mdc");
        assert!(entry.url.is_none());
        assert!(entry.description.is_none());
    }

    #[test]
    fn test_store_local_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let remote = RemoteCatalog::new("https://x", dir.path(), Duration::from_secs(1)).unwrap();

        let path = remote.store_local("../../escape.mdc", "# hi").unwrap();
        assert_eq!(path, dir.path().join("escape.mdc"));
        assert_eq!(fs::read_to_string(path).unwrap(), "# hi");
        assert!(remote.store_local("..", "x").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_index_is_network_error() {
        let remote = client("http://127.0.0.1:9");
        let err = remote.fetch_index().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_direct_skips_failures() {
        let remote = client("http://127.0.0.1:9");
        let names = vec!["a.mdc".to_string(), " ".to_string()];
        assert!(remote.fetch_direct(&names).await.is_empty());
    }
}
