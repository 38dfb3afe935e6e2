//! Capture metadata from response headers.
//!
//! Derives the server-suggested filename, the last-modified instant, and the
//! retrieval instant, preferring the `X-Archive-Orig-*` headers the archive
//! adds to preserve the original site's values.

mod date;
mod headers;

use chrono::{DateTime, Utc};

pub use date::parse_http_date;
pub use headers::HeaderMap;

use crate::url_model::{parse_content_disposition_filename, DispositionError};

pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// Last-modified headers in precedence order.
pub const LAST_MODIFIED_HEADERS: [&str; 2] = ["X-Archive-Orig-Last-Modified", "Last-Modified"];

/// Retrieval-time headers in precedence order.
pub const RETRIEVED_AT_HEADERS: [&str; 3] = ["X-Archive-Orig-Date", "Memento-Datetime", "Date"];

/// A header value that could not be interpreted. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed Content-Disposition {value:?}: {source}")]
    Disposition {
        value: String,
        #[source]
        source: DispositionError,
    },
    #[error("unparsable date in {header}: {value:?}")]
    Date { header: &'static str, value: String },
}

impl ParseError {
    /// False for retrieval-time headers, which no persisted attribute uses.
    pub fn affects_persistence(&self) -> bool {
        match self {
            ParseError::Disposition { .. } => true,
            ParseError::Date { header, .. } => LAST_MODIFIED_HEADERS.contains(header),
        }
    }
}

/// Everything derived from one capture's headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMetadata {
    pub filename: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub retrieved_at: Option<DateTime<Utc>>,
    /// Header values that were present but unusable; the matching field is `None`.
    pub problems: Vec<ParseError>,
}

/// Extract all metadata fields. Parse failures leave the field absent and are
/// collected in `problems` for the caller to report.
pub fn extract(headers: &HeaderMap) -> CaptureMetadata {
    let mut problems = Vec::new();
    let filename = extract_filename(headers).unwrap_or_else(|e| {
        problems.push(e);
        None
    });
    let last_modified = extract_last_modified(headers).unwrap_or_else(|e| {
        problems.push(e);
        None
    });
    let retrieved_at = extract_retrieved_at(headers).unwrap_or_else(|e| {
        problems.push(e);
        None
    });
    CaptureMetadata {
        filename,
        last_modified,
        retrieved_at,
        problems,
    }
}

/// Filename parameter of `Content-Disposition`, if the header is present.
pub fn extract_filename(headers: &HeaderMap) -> Result<Option<String>, ParseError> {
    let Some(value) = headers.get(CONTENT_DISPOSITION) else {
        return Ok(None);
    };
    parse_content_disposition_filename(value).map_err(|source| ParseError::Disposition {
        value: value.to_string(),
        source,
    })
}

/// Archive-original last-modified, else the direct `Last-Modified`.
pub fn extract_last_modified(headers: &HeaderMap) -> Result<Option<DateTime<Utc>>, ParseError> {
    extract_date(headers, &LAST_MODIFIED_HEADERS)
}

/// Archive-original date, else `Memento-Datetime`, else the direct `Date`.
pub fn extract_retrieved_at(headers: &HeaderMap) -> Result<Option<DateTime<Utc>>, ParseError> {
    extract_date(headers, &RETRIEVED_AT_HEADERS)
}

/// Only the highest-precedence header present is considered; a bad value there
/// is reported rather than silently falling through to a lower one.
fn extract_date(
    headers: &HeaderMap,
    precedence: &[&'static str],
) -> Result<Option<DateTime<Utc>>, ParseError> {
    let Some((header, value)) = headers.first_of(precedence) else {
        return Ok(None);
    };
    parse_http_date(value)
        .map(Some)
        .ok_or_else(|| ParseError::Date {
            header,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn direct_last_modified_only() {
        let h = headers(&[("Last-Modified", "Mon, 02 Jan 2006 15:04:05 GMT")]);
        assert_eq!(
            extract_last_modified(&h).unwrap(),
            Some(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap())
        );
    }

    #[test]
    fn archive_original_wins_over_direct() {
        let h = headers(&[
            ("Last-Modified", "Sat, 29 Feb 2020 21:21:00 GMT"),
            ("x-archive-orig-last-modified", "Mon, 02 Jan 2006 15:04:05 GMT"),
        ]);
        assert_eq!(
            extract_last_modified(&h).unwrap(),
            Some(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap())
        );
    }

    #[test]
    fn absent_last_modified_is_none() {
        let h = headers(&[("Content-Type", "application/pdf")]);
        assert_eq!(extract_last_modified(&h).unwrap(), None);
    }

    #[test]
    fn unparsable_date_is_reported_not_fatal() {
        let h = headers(&[
            ("Last-Modified", "last tuesday"),
            ("Content-Disposition", "attachment; filename=\"netz.pdf\""),
        ]);
        let meta = extract(&h);
        assert_eq!(meta.last_modified, None);
        assert_eq!(meta.filename.as_deref(), Some("netz.pdf"));
        assert_eq!(
            meta.problems,
            vec![ParseError::Date {
                header: "Last-Modified",
                value: "last tuesday".to_string()
            }]
        );
    }

    #[test]
    fn malformed_disposition_leaves_filename_absent() {
        let h = headers(&[("Content-Disposition", "attachment; filename=\"oops")]);
        let meta = extract(&h);
        assert_eq!(meta.filename, None);
        assert_eq!(meta.problems.len(), 1);
        assert!(matches!(meta.problems[0], ParseError::Disposition { .. }));
    }

    #[test]
    fn retrieved_at_precedence() {
        let h = headers(&[
            ("Date", "Sun, 18 Oct 2026 10:00:00 GMT"),
            ("Memento-Datetime", "Sat, 29 Feb 2020 21:21:00 GMT"),
        ]);
        assert_eq!(
            extract_retrieved_at(&h).unwrap(),
            Some(Utc.with_ymd_and_hms(2020, 2, 29, 21, 21, 0).unwrap())
        );
        let h = headers(&[
            ("Memento-Datetime", "Sat, 29 Feb 2020 21:21:00 GMT"),
            ("X-Archive-Orig-Date", "Thu, 27 Feb 2020 08:00:00 GMT"),
        ]);
        assert_eq!(
            extract_retrieved_at(&h).unwrap(),
            Some(Utc.with_ymd_and_hms(2020, 2, 27, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn only_persisted_fields_count_as_relevant_problems() {
        let h = headers(&[
            ("Date", "whenever"),
            ("Last-Modified", "last tuesday"),
        ]);
        let meta = extract(&h);
        assert_eq!(meta.problems.len(), 2);
        let relevant: Vec<_> = meta
            .problems
            .iter()
            .filter(|p| p.affects_persistence())
            .collect();
        assert_eq!(
            relevant,
            vec![&ParseError::Date {
                header: "Last-Modified",
                value: "last tuesday".to_string()
            }]
        );
    }
}
