//! URI component encoding for protocol field values
//!
//! Field values travel percent-encoded so that spaces, quotes, `&`, `=` and
//! newlines never break the line framing. Values are decoded lazily by the
//! consumer that needs the plain text.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped by `encodeURIComponent`: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value for use inside a protocol field.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Decode a percent-encoded field value.
///
/// Malformed escapes are kept as-is and invalid UTF-8 is replaced, so decoding
/// never fails.
pub fn decode_uri_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reserved_characters() {
        assert_eq!(encode_uri_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_uri_component("line\nbreak"), "line%0Abreak");
        assert_eq!(encode_uri_component("\"quoted\""), "%22quoted%22");
    }

    #[test]
    fn test_encode_keeps_unreserved_marks() {
        assert_eq!(encode_uri_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
    }

    #[test]
    fn test_encode_non_ascii() {
        assert_eq!(encode_uri_component("é"), "%C3%A9");
    }

    #[test]
    fn test_round_trip_env_and_payload_values() {
        let samples = [
            "hello world",
            "a&b&c",
            "KEY=value with spaces & ampersands",
            "{\"width\":1920,\"height\":1080}",
            "https://example.com/path?q=1&r=two words",
            "multi\nline\r\ntext",
            "ünïcödé ✓",
            "",
        ];

        for sample in samples {
            assert_eq!(
                decode_uri_component(&encode_uri_component(sample)),
                sample,
                "round trip failed for {:?}",
                sample
            );
        }
    }

    #[test]
    fn test_decode_plain_text_is_identity() {
        assert_eq!(decode_uri_component("plain"), "plain");
    }

    #[test]
    fn test_decode_malformed_escape_passes_through() {
        assert_eq!(decode_uri_component("100%"), "100%");
        assert_eq!(decode_uri_component("%zz"), "%zz");
    }

    #[test]
    fn test_decode_does_not_treat_plus_as_space() {
        assert_eq!(decode_uri_component("a+b"), "a+b");
    }
}
