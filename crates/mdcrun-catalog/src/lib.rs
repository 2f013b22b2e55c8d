//! # mdcrun-catalog
//!
//! Discovers the automation scripts (`.mdc` files) available to mdcrun.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CatalogLoader`] | Local scan or remote fetch with fallbacks |
//! | [`CatalogCache`] | Single-record JSON cache with TTL |
//! | [`RemoteCatalog`] | HTTP client for the list endpoint and raw downloads |
//! | [`AutomationDescriptor`] | Name, path and description of one script |
//!
//! ## Quick Start
//!
//! ```ignore
//! use mdcrun_catalog::{CatalogConfig, CatalogLoader, CatalogSource};
//!
//! let loader = CatalogLoader::new(CatalogConfig::default().with_catalog_dir("mdc_files"));
//! for d in loader.list_descriptors().await {
//!     println!("{} ({}): {}", d.name, d.source, d.description);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod local;
pub mod remote;

pub use cache::{is_fresh, CacheRecord, CacheStatus, CatalogCache};
pub use descriptor::{extract_description, AutomationDescriptor, DescriptorSource, NO_DESCRIPTION};
pub use error::{Error, Result};
pub use loader::{
    CatalogConfig, CatalogLoader, CatalogSource, StaticCatalog, DEFAULT_CACHE_TTL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use local::scan_directory;
pub use remote::{RemoteCatalog, RemoteEntry};
