//! Filename extraction from URL path.

use super::content_disposition::percent_decode;

/// Extracts the last path segment from a URL for use as a filename hint.
///
/// The segment is percent-decoded. Returns `None` if the URL cannot be parsed
/// or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode(segment);
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return None;
    }
    Some(decoded)
}
