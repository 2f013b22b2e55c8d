//! Automation descriptors.
//!
//! A descriptor is the metadata of one automation script (name, location,
//! human-readable description) without its content. Descriptors are rebuilt
//! on every scan or cache refresh and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Description used when a script does not carry one in its header.
pub const NO_DESCRIPTION: &str = "No description available";

/// Number of leading lines inspected when looking for a description.
const DESCRIPTION_SCAN_LINES: usize = 10;

/// Where a descriptor was discovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorSource {
    /// Scanned from the local catalog directory
    #[default]
    Local,
    /// Downloaded from the remote catalog server
    Remote,
}

impl DescriptorSource {
    /// Lowercase label used in listings
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for DescriptorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one automation script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationDescriptor {
    /// File name, unique within one catalog load
    pub name: String,
    /// Local path handed to the execution bridge
    pub path: String,
    /// Human-readable description
    pub description: String,
    /// Discovery source
    #[serde(default)]
    pub source: DescriptorSource,
    /// URL reported by the remote list endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

impl AutomationDescriptor {
    /// Create a descriptor for a locally scanned script
    pub fn local(
        name: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            description: description.into(),
            source: DescriptorSource::Local,
            remote_url: None,
        }
    }

    /// Create a descriptor for a script downloaded from the remote catalog
    pub fn remote(
        name: impl Into<String>,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source: DescriptorSource::Remote,
            ..Self::local(name, path, description)
        }
    }

    /// Attach the remote URL the script was fetched from
    #[must_use]
    pub fn with_remote_url(mut self, url: Option<String>) -> Self {
        self.remote_url = url;
        self
    }

    /// Whether the script came from the remote catalog
    pub fn is_remote(&self) -> bool {
        self.source == DescriptorSource::Remote
    }

    /// Text the keyword matcher searches: `"{name} {description}"`, lowercased
    pub fn search_text(&self) -> String {
        format!("{} {}", self.name, self.description).to_lowercase()
    }
}

/// Derive a description from script content.
///
/// The first of the leading lines that mentions "description"
/// (case-insensitive) or starts with a `#` heading wins; surrounding `#` and
/// spaces are trimmed.
pub fn extract_description(content: &str) -> String {
    content
        .lines()
        .take(DESCRIPTION_SCAN_LINES)
        .find(|line| line.to_lowercase().contains("description") || line.starts_with('#'))
        .map(|line| {
            line.trim_matches(|c| c == '#' || c == ' ')
                .trim()
                .to_string()
        })
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}
