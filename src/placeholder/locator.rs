use super::codec::{
    CONTENT_PLACEHOLDER_PREFIX,
    CONTENT_PLACEHOLDER_SUFFIX,
    FILENAME_PLACEHOLDER,
    decode_payload,
    is_payload_byte,
};

/// A content placeholder found in asset text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderLocation {
    /// Decoded key.
    pub string_key: String,
    /// Byte offset of the first prefix byte.
    pub start: usize,
    /// Byte offset just past the terminator.
    pub end: usize,
}

/// Byte offsets of every non-overlapping occurrence of `needle` in `text`.
#[must_use]
pub fn find_substring_locations(text: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    text.match_indices(needle).map(|(index, _)| index).collect()
}

/// Byte offsets of every filename placeholder in `text`.
#[must_use]
pub fn locate_filename_placeholders(text: &str) -> Vec<usize> {
    find_substring_locations(text, FILENAME_PLACEHOLDER)
}

/// Find and decode every content placeholder in `text`.
///
/// Malformed occurrences (no terminator, bytes outside the payload alphabet,
/// undecodable payload) are skipped. Locations are in ascending order and never
/// overlap; a key used N times yields N locations.
#[must_use]
pub fn locate_placeholders(text: &str) -> Vec<PlaceholderLocation> {
    let bytes = text.as_bytes();
    let mut locations = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text.get(cursor..).and_then(|rest| rest.find(CONTENT_PLACEHOLDER_PREFIX))
    {
        let start = cursor + offset;
        let payload_start = start + CONTENT_PLACEHOLDER_PREFIX.len();
        let payload_len = bytes
            .get(payload_start..)
            .map_or(0, |rest| rest.iter().take_while(|byte| is_payload_byte(**byte)).count());
        let suffix_index = payload_start + payload_len;

        let terminated = text.get(suffix_index..).is_some_and(|rest| rest.starts_with(CONTENT_PLACEHOLDER_SUFFIX));
        let string_key = if terminated {
            text.get(payload_start..suffix_index).and_then(decode_payload)
        } else {
            None
        };

        match string_key {
            Some(string_key) => {
                let end = suffix_index + CONTENT_PLACEHOLDER_SUFFIX.len_utf8();
                locations.push(PlaceholderLocation { string_key, start, end });
                cursor = end;
            }
            None => {
                tracing::trace!(start, "Skipping malformed placeholder");
                cursor = start + 1;
            }
        }
    }

    locations
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::placeholder::encode_placeholder;

    #[rstest]
    #[case::simple("hello")]
    #[case::slashes("pages/home/title")]
    #[case::unicode("こんにちは 🌍")]
    #[case::quotes("say \"hi\" and 'bye'")]
    #[case::terminator_in_key("a|b|")]
    #[case::prefix_in_key("b0a92123")]
    #[case::filename_placeholder_in_key("[locale:b64b2e3f]")]
    #[case::empty("")]
    fn round_trip(#[case] key: &str) {
        let text = format!("var a=\"{}\";", encode_placeholder(key));

        let locations = locate_placeholders(&text);

        assert_that!(
            locations,
            elements_are![all![
                field!(PlaceholderLocation.string_key, eq(key)),
                field!(PlaceholderLocation.start, eq(&7)),
                field!(PlaceholderLocation.end, eq(&(text.len() - 2)))
            ]]
        );
    }

    #[rstest]
    fn repeated_and_adjacent_keys_are_each_recorded() {
        let a = encode_placeholder("a");
        let b = encode_placeholder("b");
        let text = format!("x(\"{a}\",\"{a}{b}\")");

        let locations = locate_placeholders(&text);

        assert_that!(
            locations,
            elements_are![
                field!(PlaceholderLocation.string_key, eq("a")),
                field!(PlaceholderLocation.string_key, eq("a")),
                field!(PlaceholderLocation.string_key, eq("b"))
            ]
        );
        assert_that!(locations[1].end, eq(locations[2].start));
        assert_that!(&text[locations[2].start..locations[2].end], eq(b.as_str()));
    }

    #[rstest]
    #[case::unterminated("x=\"b0a92123aGVsbG8\"")]
    #[case::at_end_of_text("x=b0a92123aGVsbG8")]
    #[case::bad_payload("x=\"b0a92123!!|\"")]
    #[case::invalid_utf8("x=\"b0a92123_w|\"")]
    #[case::bare_prefix("b0a92123")]
    fn malformed_placeholders_are_skipped(#[case] text: &str) {
        assert_that!(locate_placeholders(text), is_empty());
    }

    #[rstest]
    fn malformed_prefix_does_not_hide_following_placeholder() {
        let text = format!("b0a92123!{}", encode_placeholder("ok"));

        let locations = locate_placeholders(&text);

        assert_that!(
            locations,
            elements_are![all![
                field!(PlaceholderLocation.string_key, eq("ok")),
                field!(PlaceholderLocation.start, eq(&9))
            ]]
        );
    }

    #[rstest]
    fn filename_placeholders_are_found_independently() {
        let text = format!(
            "o.u=e=>e+\".{FILENAME_PLACEHOLDER}.js\";n=\"{}\";s=\"main.{FILENAME_PLACEHOLDER}.js\"",
            encode_placeholder("k")
        );

        let offsets = locate_filename_placeholders(&text);

        assert_that!(offsets.len(), eq(2));
        assert_that!(&text[offsets[0]..], starts_with(FILENAME_PLACEHOLDER));
        assert_that!(&text[offsets[1]..], starts_with(FILENAME_PLACEHOLDER));
        assert_that!(locate_placeholders(&text), elements_are![field!(PlaceholderLocation.string_key, eq("k"))]);
    }

    #[rstest]
    fn empty_needle_finds_nothing() {
        assert_that!(find_substring_locations("abc", ""), is_empty());
    }
}
