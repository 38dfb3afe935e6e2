//! URL modeling and name derivation.
//!
//! Derives safe local names for resource directories and persisted captures
//! from URLs and the Content-Disposition header.

mod content_disposition;
mod path;
mod sanitize;

use std::path::PathBuf;

pub use content_disposition::{parse_content_disposition_filename, DispositionError};
pub use path::filename_from_url_path;
pub use sanitize::{shorten_name, IllegalChars, NameSanitizer, DEFAULT_ILLEGAL_CHARS, NAME_MAX};

use crate::capture::CaptureTimestamp;
use crate::local_index::LIVE_MARKER;

/// Default filename when URL path and Content-Disposition yield nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Longest derived filename that still fits NAME_MAX once the
/// `<timestamp>live_` prefix is added.
pub const MAX_FILENAME_LEN: usize = NAME_MAX - (CaptureTimestamp::LEN + LIVE_MARKER.len() + 1);

/// Directory name used when a resource URL sanitizes to nothing.
const DEFAULT_DIRNAME: &str = "unnamed";

/// Derives the filename part of a persisted capture.
///
/// Prefers `disposition_filename` (already extracted from the response
/// headers), otherwise uses the last path segment of `resource_url`. Either
/// way the result goes through `sanitizer` and is shortened to
/// [`MAX_FILENAME_LEN`], keeping the extension.
///
/// # Examples
///
/// - `derive_filename(&s, "https://example.com/plan.pdf", None)` → `"plan.pdf"`
/// - `derive_filename(&s, "https://example.com/", Some("report.pdf"))` → `"report.pdf"`
pub fn derive_filename(
    sanitizer: &NameSanitizer,
    resource_url: &str,
    disposition_filename: Option<&str>,
) -> String {
    let candidate = disposition_filename
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| filename_from_url_path(resource_url));

    let raw = match candidate {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };

    let sanitized = shorten_name(&sanitizer.sanitize_name(&raw), MAX_FILENAME_LEN);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Relative directory (under the destination root) owned by one resource.
///
/// Stable for a given URL, so every run of the same resource lands in the
/// same directory.
pub fn resource_dir(sanitizer: &NameSanitizer, resource_url: &str) -> PathBuf {
    let rel = sanitizer.sanitize_path(resource_url);
    if rel.is_empty() {
        PathBuf::from(DEFAULT_DIRNAME)
    } else {
        PathBuf::from(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s() -> NameSanitizer {
        NameSanitizer::default()
    }

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(
            derive_filename(&s(), "https://example.com/archive.zip", None),
            "archive.zip"
        );
        assert_eq!(
            derive_filename(&s(), "https://cdn.example.com/path/to/netz.pdf", None),
            "netz.pdf"
        );
    }

    #[test]
    fn derive_filename_prefers_disposition() {
        assert_eq!(
            derive_filename(&s(), "https://example.com/archive.zip", Some("real-name.tar.gz")),
            "real-name.tar.gz"
        );
    }

    #[test]
    fn derive_filename_sanitizes_both_sources() {
        assert_eq!(
            derive_filename(&s(), "https://example.com/x", Some("a:b?.pdf")),
            "a_b_.pdf"
        );
        assert_eq!(
            derive_filename(&s(), "https://example.com/what%3Fnow.pdf", None),
            "what_now.pdf"
        );
    }

    #[test]
    fn derive_filename_empty_fallback() {
        assert_eq!(derive_filename(&s(), "https://example.com/", None), "download.bin");
        assert_eq!(derive_filename(&s(), "https://example.com", Some("  ")), "download.bin");
    }

    #[test]
    fn derive_filename_leaves_room_for_prefix() {
        let url = format!("https://example.com/{}.pdf", "n".repeat(246));
        let name = derive_filename(&s(), &url, None);
        assert_eq!(name.len(), MAX_FILENAME_LEN);
        assert!(name.ends_with(".pdf"));

        let ts = CaptureTimestamp::parse("20200101000000").unwrap();
        let live = crate::local_index::persisted_file_name(&ts, true, &name);
        assert_eq!(live.len(), NAME_MAX);

        let disposition = "d".repeat(240);
        assert_eq!(
            derive_filename(&s(), "https://example.com/x", Some(&disposition)).len(),
            MAX_FILENAME_LEN
        );
    }

    #[test]
    fn resource_dir_is_stable_and_nested() {
        let a = resource_dir(&s(), "https://www.bvg.de/de/Fahrinfo/Downloads/Netz.pdf");
        let b = resource_dir(&s(), "https://www.bvg.de/de/Fahrinfo/Downloads/Netz.pdf");
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("bvg.de/de/Fahrinfo/Downloads/Netz.pdf"));
        assert_eq!(resource_dir(&s(), "https://"), PathBuf::from("unnamed"));
    }
}
