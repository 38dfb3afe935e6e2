//! Case-insensitive HTTP header map built from raw response header lines.

/// Response headers in arrival order, looked up case-insensitively.
///
/// Repeated names keep every value; `get` returns the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header; empty names are ignored.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.entries
            .push((name.to_string(), value.into().trim().to_string()));
    }

    /// First value of `name`, compared ASCII case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among `names`, in the given precedence order.
    pub fn first_of<'a>(&'a self, names: &[&'static str]) -> Option<(&'static str, &'a str)> {
        names.iter().find_map(|name| {
            self.get(name)
                .filter(|v| !v.is_empty())
                .map(|v| (*name, v))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse collected header lines (as delivered by libcurl's header callback).
    ///
    /// A status line (`HTTP/...`) starts a new response, so after redirects only
    /// the final response's headers remain.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut map = HeaderMap::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("HTTP/") {
                map.entries.clear();
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                map.insert(name, value);
            }
        }
        map
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
