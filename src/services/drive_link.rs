//! Content-identifier extraction from stored file URLs.
//!
//! Materials keep the storage provider's share link; download and view
//! endpoints take the bare file id embedded in that link.

use once_cell::sync::Lazy;
use regex::Regex;

static DRIVE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"drive\.google\.com/file/d/([a-zA-Z0-9_-]+)|docs\.google\.com/[a-z]+/d/([a-zA-Z0-9_-]+)")
        .expect("drive link pattern is valid")
});

/// Extracts the file id from a `drive.google.com/file/d/{id}` or
/// `docs.google.com/{collection}/d/{id}` link.
pub fn extract_file_id(file_url: &str) -> Option<&str> {
    let captures = DRIVE_LINK.captures(file_url)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str())
}
