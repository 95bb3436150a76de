use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Starts every content placeholder: the first eight hex digits of
/// `sha256("localize-assets-plugin-placeholder-prefix")`.
pub const CONTENT_PLACEHOLDER_PREFIX: &str = "b0a92123";

/// Terminates every content placeholder. Outside the payload alphabet.
pub const CONTENT_PLACEHOLDER_SUFFIX: char = '|';

/// Stands in for the locale name in file names and chunk paths. The hash part is
/// `sha256("locale-placeholder")`, which keeps it apart from `[contenthash]`
/// style tokens and from content placeholders.
pub const FILENAME_PLACEHOLDER: &str = "[locale:b64b2e3f]";

/// Encode `key` as a content placeholder.
///
/// The payload is the unpadded URL-safe base64 of the key's UTF-8 bytes, so
/// any key round-trips and the payload can never contain the terminator or a
/// quote character.
#[must_use]
pub fn encode_placeholder(key: &str) -> String {
    format!(
        "{CONTENT_PLACEHOLDER_PREFIX}{}{CONTENT_PLACEHOLDER_SUFFIX}",
        URL_SAFE_NO_PAD.encode(key.as_bytes())
    )
}

/// Decode a placeholder payload back into its key.
///
/// Returns `None` for payloads that are not canonical base64 or not UTF-8.
#[must_use]
pub fn decode_payload(payload: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    String::from_utf8(bytes).ok()
}

/// Whether `byte` may appear inside a payload.
pub(super) const fn is_payload_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::ascii("hello", "b0a92123aGVsbG8|")]
    #[case::slashes("pages/home/title", "b0a92123cGFnZXMvaG9tZS90aXRsZQ|")]
    #[case::unicode("こんにちは", "b0a9212344GT44KT44Gr44Gh44Gv|")]
    #[case::empty("", "b0a92123|")]
    fn encode_is_deterministic(#[case] key: &str, #[case] expected: &str) {
        assert_that!(encode_placeholder(key), eq(expected));
        assert_that!(encode_placeholder(key), eq(&encode_placeholder(key)));
    }

    #[rstest]
    fn payload_alphabet_excludes_sentinels() {
        let encoded = encode_placeholder("\"'`|[locale:b64b2e3f]\u{0}\u{ffff}");
        let payload = encoded
            .strip_prefix(CONTENT_PLACEHOLDER_PREFIX)
            .and_then(|rest| rest.strip_suffix(CONTENT_PLACEHOLDER_SUFFIX))
            .unwrap_or_default();

        assert_that!(payload.bytes().all(is_payload_byte), eq(true));
        assert_that!(payload.is_empty(), eq(false));
    }

    #[rstest]
    #[case::not_base64("!!")]
    #[case::bad_length("a")]
    #[case::invalid_utf8("_w")]
    fn decode_rejects_malformed_payloads(#[case] payload: &str) {
        assert_that!(decode_payload(payload), none());
    }
}
