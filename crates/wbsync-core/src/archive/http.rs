//! Blocking HTTP GET over libcurl that keeps the final response's headers.

use std::str;
use std::time::Duration;

use super::ArchiveError;
use crate::metadata::HeaderMap;

/// Per-call limits applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Upper bound for the whole transfer, so one stalled capture cannot block
    /// the rest of a timeline.
    pub request_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// A completed response.
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: u32,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a GET and returns status, headers, and body.
///
/// Follows redirects. Runs in the current thread; the curl handle and its
/// callbacks are dropped before returning on every path.
pub(crate) fn get(url: &str, opts: &HttpOptions) -> Result<HttpResponse, ArchiveError> {
    let mut header_lines: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.timeout(opts.request_timeout)?;
    easy.useragent(concat!("wbsync/", env!("CARGO_PKG_VERSION")))?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                header_lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(HttpResponse {
        status,
        headers: HeaderMap::from_lines(&header_lines),
        body,
    })
}
