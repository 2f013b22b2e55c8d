//! Catalog loader: local scan, remote fetch, caching and fallbacks.
//!
//! ```text
//! list_descriptors()
//!     │
//!     ├─ no remote_url ───────────────────────────────▶ local scan
//!     │
//!     ├─ cache fresh ─────────────────────────────────▶ cached list
//!     ├─ list endpoint ok ──▶ store cache ────────────▶ remote list
//!     ├─ list endpoint failed ──▶ direct downloads ───▶ partial list
//!     └─ nothing fetched ──▶ warn ────────────────────▶ local scan
//! ```

use crate::cache::{CacheStatus, CatalogCache};
use crate::descriptor::AutomationDescriptor;
use crate::error::Result;
use crate::local::scan_directory;
use crate::remote::RemoteCatalog;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default cache time-to-live (30 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Default timeout for each remote request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can produce a catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Current descriptors. Never fails; unavailable sources yield fewer entries.
    async fn list_descriptors(&self) -> Vec<AutomationDescriptor>;
}

/// A fixed, in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog(pub Vec<AutomationDescriptor>);

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_descriptors(&self) -> Vec<AutomationDescriptor> {
        self.0.clone()
    }
}

/// Catalog loader configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Directory scanned in local mode
    pub catalog_dir: PathBuf,
    /// Script file extension (without the dot)
    pub extension: String,
    /// Remote catalog server; local mode when `None`
    pub remote_url: Option<String>,
    /// How long a remote listing stays valid
    pub cache_ttl: Duration,
    /// Location of the cache record
    pub cache_file: PathBuf,
    /// Where downloaded scripts are written
    pub remote_cache_dir: PathBuf,
    /// File names tried when the list endpoint fails
    pub expected_files: Vec<String>,
    /// Per-request timeout for remote calls
    pub request_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_dir: PathBuf::from("mdc_files"),
            extension: "mdc".to_string(),
            remote_url: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_file: PathBuf::from(".mdc_cache.json"),
            remote_cache_dir: PathBuf::from(".mdc_remote_cache"),
            expected_files: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl CatalogConfig {
    /// Set the local catalog directory
    #[must_use]
    pub fn with_catalog_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.catalog_dir = dir.into();
        self
    }

    /// Enable remote mode
    #[must_use]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Set the cache TTL
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the cache record location
    #[must_use]
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = path.into();
        self
    }

    /// Set the download directory for remote scripts
    #[must_use]
    pub fn with_remote_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.remote_cache_dir = dir.into();
        self
    }

    /// Set the direct-download fallback list
    #[must_use]
    pub fn with_expected_files(mut self, files: Vec<String>) -> Self {
        self.expected_files = files;
        self
    }

    /// Set the remote request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Loads the automation catalog from the configured source
pub struct CatalogLoader {
    config: CatalogConfig,
    cache: CatalogCache,
}

impl CatalogLoader {
    /// Create a loader
    pub fn new(config: CatalogConfig) -> Self {
        let cache = CatalogCache::new(&config.cache_file, config.cache_ttl);
        Self { config, cache }
    }

    /// Loader configuration
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Whether a remote source is configured
    pub fn is_remote(&self) -> bool {
        self.config.remote_url.is_some()
    }

    /// Scan the local catalog directory
    pub fn scan_local(&self) -> Vec<AutomationDescriptor> {
        scan_directory(&self.config.catalog_dir, &self.config.extension)
    }

    /// Drop the cached remote listing so the next load hits the network
    pub fn refresh(&self) -> Result<()> {
        info!(path = %self.cache.path().display(), "Invalidating catalog cache");
        self.cache.invalidate()
    }

    /// State of the remote listing cache
    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status(Utc::now())
    }

    /// Fetch from the remote catalog, honoring the cache.
    ///
    /// Only a complete listing is cached. Direct downloads may return a
    /// partial catalog and are never cached. Fails only when nothing could be
    /// fetched at all.
    #[instrument(skip(self))]
    pub async fn fetch_remote(&self, remote_url: &str) -> Result<Vec<AutomationDescriptor>> {
        if let Some(files) = self.cache.load_fresh(Utc::now()) {
            debug!(count = files.len(), "Using cached remote catalog");
            return Ok(files);
        }

        let remote = RemoteCatalog::new(
            remote_url,
            &self.config.remote_cache_dir,
            self.config.request_timeout,
        )?;

        match remote.fetch_listed().await {
            Ok(files) => {
                if let Err(e) = self.cache.store(&files, Utc::now()) {
                    warn!(error = %e, "Failed to write catalog cache");
                }
                Ok(files)
            }
            Err(list_err) => {
                info!(error = %list_err, "Remote listing failed, trying direct file access");
                let files = remote.fetch_direct(&self.config.expected_files).await;
                if files.is_empty() {
                    Err(list_err)
                } else {
                    Ok(files)
                }
            }
        }
    }
}

#[async_trait]
impl CatalogSource for CatalogLoader {
    async fn list_descriptors(&self) -> Vec<AutomationDescriptor> {
        let Some(remote_url) = self.config.remote_url.as_deref() else {
            return self.scan_local();
        };

        match self.fetch_remote(remote_url).await {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "Remote server unavailable, using local files");
                self.scan_local()
            }
        }
    }
}
