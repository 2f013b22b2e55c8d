//! Local catalog directory scan.

use crate::descriptor::{extract_description, AutomationDescriptor};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Scan `dir` for files ending in `.{extension}`.
///
/// Only the directory itself is searched. Results are ordered by file name.
/// A missing directory yields an empty catalog; unreadable files are skipped.
pub fn scan_directory(dir: &Path, extension: &str) -> Vec<AutomationDescriptor> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Catalog directory not readable");
            return Vec::new();
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    paths.sort();

    let mut descriptors = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(content) => descriptors.push(AutomationDescriptor::local(
                name,
                path.to_string_lossy(),
                extract_description(&content),
            )),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable automation file"),
        }
    }

    debug!(dir = %dir.display(), count = descriptors.len(), "Scanned local catalog");
    descriptors
}
