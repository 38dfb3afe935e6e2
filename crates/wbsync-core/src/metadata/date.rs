//! HTTP date parsing: RFC 1123 first, RFC 850 as fallback.

use chrono::{DateTime, NaiveDateTime, Utc};

/// RFC 850 layout, e.g. `Monday, 02-Jan-06 15:04:05 GMT` (zone handled separately).
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S";

/// Parse an HTTP date header value.
///
/// Tries RFC 1123 (`Mon, 02 Jan 2006 15:04:05 GMT`) and then RFC 850
/// (`Monday, 02-Jan-06 15:04:05 GMT`). Returns `None` if neither matches.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    parse_rfc1123(value).or_else(|| parse_rfc850(value))
}

fn parse_rfc1123(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_rfc850(value: &str) -> Option<DateTime<Utc>> {
    let (stamp, zone) = value.rsplit_once(' ')?;
    if !(zone.eq_ignore_ascii_case("GMT") || zone.eq_ignore_ascii_case("UTC")) {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp, RFC850_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
