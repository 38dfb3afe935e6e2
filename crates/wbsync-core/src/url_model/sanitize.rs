//! Filesystem-safe name derivation from URLs and titles.

/// Characters replaced by default, in addition to control characters 0x00–0x1F.
pub const DEFAULT_ILLEGAL_CHARS: &str = ":?\"*/\\<>|";

/// Linux NAME_MAX; longer segments are truncated on a char boundary.
pub const NAME_MAX: usize = 255;

/// Longest extension (dot included) kept intact when a name is shortened.
const MAX_KEPT_EXTENSION: usize = 16;

/// Set of characters that must not appear in a file or directory name.
///
/// Constructed once (from config) and handed to [`NameSanitizer`]. Control
/// characters 0x00–0x1F are always illegal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalChars {
    chars: Vec<char>,
}

impl IllegalChars {
    pub fn new(chars: &str) -> Self {
        let mut chars: Vec<char> = chars.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        Self { chars }
    }

    pub fn contains(&self, c: char) -> bool {
        c < ' ' || self.chars.binary_search(&c).is_ok()
    }
}

impl Default for IllegalChars {
    fn default() -> Self {
        Self::new(DEFAULT_ILLEGAL_CHARS)
    }
}

/// Maps URLs and titles to deterministic, filesystem-safe names.
///
/// - Strips a leading `https://` or `http://`, then a leading `www.`
/// - Replaces every illegal character with `_` (one for one, no collapsing)
/// - Limits each name to 255 bytes (Linux NAME_MAX)
#[derive(Debug, Clone, Default)]
pub struct NameSanitizer {
    illegal: IllegalChars,
}

impl NameSanitizer {
    pub fn new(illegal: IllegalChars) -> Self {
        Self { illegal }
    }

    /// Sanitize into a single path component; `/` is replaced like any other
    /// illegal character.
    pub fn sanitize_name(&self, input: &str) -> String {
        truncate(self.replace_illegal(strip_scheme_and_www(input)), NAME_MAX)
    }

    /// Sanitize into a relative path that keeps `/` as the separator.
    ///
    /// Each segment is sanitized on its own; empty, `.` and `..` segments are
    /// dropped so the result never escapes the directory it is joined onto.
    /// `https://www.example.com/a?b=c` becomes `example.com/a_b=c`.
    pub fn sanitize_path(&self, input: &str) -> String {
        strip_scheme_and_www(input)
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .map(|segment| truncate(self.replace_illegal(segment), NAME_MAX))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn replace_illegal(&self, s: &str) -> String {
        s.chars()
            .map(|c| if self.illegal.contains(c) { '_' } else { c })
            .collect()
    }
}

fn strip_scheme_and_www(input: &str) -> &str {
    let rest = strip_prefix_ignore_case(input, "https://")
        .or_else(|| strip_prefix_ignore_case(input, "http://"))
        .unwrap_or(input);
    strip_prefix_ignore_case(rest, "www.").unwrap_or(rest)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        s.truncate(floor_char_boundary(&s, max));
    }
    s
}

fn floor_char_boundary(s: &str, mut at: usize) -> usize {
    while at > 0 && !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

/// Shorten `name` to at most `max` bytes on a char boundary, cutting the stem
/// so a short extension (`.pdf`, `.tar.gz` counts as `.gz`) survives.
pub fn shorten_name(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }
    let extension = name
        .rfind('.')
        .filter(|&dot| dot > 0)
        .map(|dot| &name[dot..])
        .filter(|ext| ext.len() <= MAX_KEPT_EXTENSION && ext.len() < max);
    match extension {
        Some(ext) => {
            let stem = &name[..name.len() - ext.len()];
            let cut = floor_char_boundary(stem, max - ext.len());
            format!("{}{}", &stem[..cut], ext)
        }
        None => truncate(name.to_string(), max),
    }
}
