//! URL escaping and HTTP date helpers.

use crate::base::error::Error;
use std::time::SystemTime;

/// Percent-encodes everything except RFC 3986 unreserved characters.
pub fn escape(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Decodes percent-escapes. Fails when the decoded bytes are not UTF-8.
pub fn unescape(input: &str) -> Result<String, Error> {
    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::InvalidArgument(format!("not UTF-8 after unescaping: {input:?}")))
}

/// Parses an HTTP date (IMF-fixdate, RFC 850 or asctime format).
pub fn parse_http_date(input: &str) -> Result<SystemTime, Error> {
    httpdate::parse_http_date(input.trim())
        .map_err(|_| Error::InvalidArgument(format!("not an HTTP date: {input:?}")))
}

/// Formats `time` as an IMF-fixdate.
pub fn format_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_escape_roundtrip() {
        let escaped = escape("a b&c=d/é");
        assert_eq!(escaped, "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(unescape(&escaped).unwrap(), "a b&c=d/é");
    }

    #[test]
    fn test_unescape_rejects_invalid_utf8() {
        assert!(unescape("%FF%FE").is_err());
    }

    #[test]
    fn test_http_date_formats() {
        let expected = UNIX_EPOCH + Duration::from_secs(784111777);
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap(), expected);
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT").unwrap(), expected);
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994").unwrap(), expected);
        assert_eq!(format_http_date(expected), "Sun, 06 Nov 1994 08:49:37 GMT");
        assert!(parse_http_date("yesterday").is_err());
    }
}
