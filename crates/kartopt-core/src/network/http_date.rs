//! HTTP-date formatting and parsing (`Sun, 06 Nov 1994 08:49:37 GMT`).
//!
//! chrono's `%a`/`%b` specifiers always produce English names, so the output
//! does not depend on the user's locale.

use chrono::{DateTime, NaiveDateTime, Utc};

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp for `If-Modified-Since`.
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an `Expires`/`Last-Modified` style header value.
///
/// Servers occasionally send the RFC 2822 `+0000` form instead of `GMT`;
/// both are accepted. Anything else (including `Expires: 0`) yields `None`.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
