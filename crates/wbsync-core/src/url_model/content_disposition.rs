//! Content-Disposition header parsing (filename and filename*).

/// Why a Content-Disposition value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispositionError {
    #[error("missing disposition type")]
    MissingType,
    #[error("parameter without value: {0:?}")]
    BareParameter(String),
    #[error("unterminated quoted value for {0}")]
    UnterminatedQuote(String),
    #[error("filename* lacks a charset'language' prefix")]
    BadExtendedValue,
}

/// Extracts the filename from a raw Content-Disposition header value.
///
/// Supports:
/// - `filename="value"` (quoted; strips quotes and unescapes)
/// - `filename=value` (token)
/// - `filename*=UTF-8''percent-encoded` (RFC 5987; decoded)
/// If both `filename` and `filename*` exist, `filename*` takes precedence.
///
/// Returns `Ok(None)` when the header carries no filename parameter.
pub fn parse_content_disposition_filename(
    header_value: &str,
) -> Result<Option<String>, DispositionError> {
    let mut params = split_params(header_value.trim())?.into_iter();

    let disposition_type = params.next().unwrap_or_default();
    if disposition_type.is_empty() || disposition_type.contains('=') {
        return Err(DispositionError::MissingType);
    }

    let mut filename_from_token: Option<String> = None;
    let mut filename_extended: Option<String> = None;

    for param in params {
        if param.is_empty() {
            continue;
        }
        let Some((name, v)) = param.split_once('=') else {
            return Err(DispositionError::BareParameter(param));
        };
        let name = name.trim().to_ascii_lowercase();
        let v = v.trim();

        if name == "filename*" {
            let Some((_charset, rest)) = v.split_once('\'') else {
                return Err(DispositionError::BadExtendedValue);
            };
            let Some((_language, encoded)) = rest.split_once('\'') else {
                return Err(DispositionError::BadExtendedValue);
            };
            let decoded = decode_quoted_filename(&percent_decode(encoded));
            if !decoded.is_empty() {
                filename_extended = Some(decoded);
            }
        } else if name == "filename" {
            let unquoted = if v.starts_with('"') {
                if v.len() < 2 || !v.ends_with('"') {
                    return Err(DispositionError::UnterminatedQuote(name));
                }
                decode_quoted_filename(&v[1..v.len() - 1])
            } else {
                v.to_string()
            };
            if !unquoted.is_empty() {
                filename_from_token = Some(unquoted);
            }
        }
    }

    Ok(filename_extended.or(filename_from_token))
}

/// Split on `;` outside of double quotes. Errors on an unterminated quote.
fn split_params(value: &str) -> Result<Vec<String>, DispositionError> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    for c in value.chars() {
        if in_quotes {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
            continue;
        }
        match c {
            ';' => out.push(std::mem::take(&mut current).trim().to_string()),
            '"' => {
                in_quotes = true;
                current.push(c);
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        let name = current
            .split_once('=')
            .map(|(n, _)| n.trim().to_ascii_lowercase())
            .unwrap_or_default();
        return Err(DispositionError::UnterminatedQuote(name));
    }
    out.push(current.trim().to_string());
    Ok(out)
}

/// Decode backslash-escaped quotes in a quoted filename value.
fn decode_quoted_filename(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\\' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Simple percent-decode for filename* value (RFC 5987). Invalid escapes pass through.
pub(super) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
