//! Encoding helpers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes the UTF-8 bytes of `text` as standard base64 (`A-Z a-z 0-9 + /`, `=` padded).
///
/// No URL-safe alphabet, no line wrapping.
///
/// ```rust
/// use ministry_platform::encode_base64;
///
/// assert_eq!(encode_base64("foo"), "Zm9v");
/// assert_eq!(encode_base64("client:secret"), "Y2xpZW50OnNlY3JldA==");
/// ```
pub fn encode_base64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(encoded: &str) -> String {
        let bytes = STANDARD.decode(encoded).expect("valid base64");
        String::from_utf8(bytes).expect("valid utf-8")
    }

    #[test]
    fn should_match_reference_vectors() {
        assert_eq!(encode_base64(""), "");
        assert_eq!(encode_base64("f"), "Zg==");
        assert_eq!(encode_base64("fo"), "Zm8=");
        assert_eq!(encode_base64("foo"), "Zm9v");
        assert_eq!(encode_base64("foob"), "Zm9vYg==");
        assert_eq!(encode_base64("fooba"), "Zm9vYmE=");
        assert_eq!(encode_base64("foobar"), "Zm9vYmFy");
    }

    #[test]
    fn should_use_standard_alphabet() {
        // U+FBFF is 0xef 0xaf 0xbf, whose last two sextets are 62 and 63
        assert_eq!(encode_base64("\u{fbff}"), "76+/");
    }

    #[test]
    fn should_round_trip_utf8_text() {
        for text in [
            "",
            "user:pass",
            "José's café",
            "client-id:s3cr3t/with+symbols=",
            "🦀 ferris",
        ] {
            assert_eq!(decode(&encode_base64(text)), text);
        }
    }

    #[test]
    fn should_not_wrap_long_input() {
        let text = "x".repeat(200);
        let encoded = encode_base64(&text);
        assert!(!encoded.contains('\n'));
        assert_eq!(encoded.len(), 268);
    }
}
