//! Path and URL conversion utilities
//!
//! This module provides consistent conversion between file paths and URLs,
//! handling platform-specific differences and encoding issues.

use std::path::{Path, PathBuf};
use url::Url;

/// Convert a `file://` URL to a [`PathBuf`].
///
/// Handles percent-encoding and platform-specific path formats (e.g., Windows drives).
#[must_use]
pub fn url_to_path(url: &Url) -> Option<PathBuf> {
    // Only handle file:// URLs
    if url.scheme() != "file" {
        return None;
    }

    decoded_path(url)
}

/// Extract the decoded path component of any URL, regardless of scheme.
///
/// Archive-member URLs (e.g. the `jdt` scheme) are not file URLs but still
/// carry a path-shaped component that cache tiers key on.
#[must_use]
pub fn decoded_path(url: &Url) -> Option<PathBuf> {
    let path = percent_encoding::percent_decode_str(url.path())
        .decode_utf8()
        .ok()?;

    #[cfg(windows)]
    let path = {
        // Remove leading '/' for paths like /C:/...
        path.strip_prefix('/').unwrap_or(&path)
    };

    Some(PathBuf::from(path.as_ref()))
}

/// Convert a [`Path`] to a `file://` URL
///
/// Handles both absolute and relative paths. Relative paths are resolved
/// to absolute paths before conversion.
#[must_use]
pub fn path_to_url(path: &Path) -> Option<Url> {
    // For absolute paths, convert directly
    if path.is_absolute() {
        return Url::from_file_path(path).ok();
    }

    // For relative paths, try to make them absolute first
    if let Ok(absolute_path) = std::fs::canonicalize(path) {
        return Url::from_file_path(absolute_path).ok();
    }

    // If canonicalization fails, try converting as-is (might fail)
    Url::from_file_path(path).ok()
}
