//! Placeholder tokens embedded in compiled code.
//!
//! Two families share one text buffer: content placeholders carry a string key
//! and stand in for a translation, the filename placeholder carries nothing and
//! stands in for the locale name. Their sentinels are disjoint.

/// Sentinels and key payload encoding
mod codec;
/// Scanning asset text for placeholders
mod locator;

pub use codec::{
    CONTENT_PLACEHOLDER_PREFIX,
    CONTENT_PLACEHOLDER_SUFFIX,
    FILENAME_PLACEHOLDER,
    decode_payload,
    encode_placeholder,
};
pub use locator::{
    PlaceholderLocation,
    find_substring_locations,
    locate_filename_placeholders,
    locate_placeholders,
};
