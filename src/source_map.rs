//! Revision 3 source maps.
//!
//! Only what realignment needs: the JSON document itself and the `mappings`
//! VLQ codec. Fields this crate does not interpret are carried through
//! untouched.

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

/// Digits of the VLQ encoding.
const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Set on every digit but the last of a value.
const VLQ_CONTINUATION_BIT: u8 = 0b10_0000;
/// Payload bits of a digit.
const VLQ_DATA_MASK: u8 = 0b1_1111;
/// Payload bits per digit.
const VLQ_SHIFT: u32 = 5;

/// A source map that cannot be read or written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceMapError {
    /// Document is not a source map.
    #[error("Invalid source map JSON: {0}")]
    Json(String),

    /// Character outside the base64 alphabet.
    #[error("Invalid base64 digit {0:?} in mappings")]
    InvalidDigit(char),

    /// Segment ends inside a value.
    #[error("Truncated VLQ value in mappings")]
    TruncatedValue,

    /// Segment with other than 1, 4 or 5 fields.
    #[error("Mapping segment with {0} fields")]
    InvalidSegment(usize),

    /// Value does not fit a position.
    #[error("Mapping value out of range")]
    OutOfRange,
}

/// A source map document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Always 3.
    pub version: u32,

    /// Name of the generated file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Prefix of every source path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Original files.
    #[serde(default)]
    pub sources: Vec<Option<String>>,

    /// Inlined contents of `sources`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,

    /// Symbol names referenced by mappings.
    #[serde(default)]
    pub names: Vec<String>,

    /// VLQ encoded mappings.
    pub mappings: String,

    /// Extension fields such as `x_google_ignoreList`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceMap {
    /// # Errors
    /// Returns an error when `bytes` is not a source map document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SourceMapError> {
        serde_json::from_slice(bytes).map_err(|e| SourceMapError::Json(e.to_string()))
    }

    /// # Errors
    /// Returns an error when serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, SourceMapError> {
        serde_json::to_vec(self).map_err(|e| SourceMapError::Json(e.to_string()))
    }

    /// # Errors
    /// Returns an error when `mappings` is malformed.
    pub fn decode_mappings(&self) -> Result<Vec<Mapping>, SourceMapError> {
        decode_mappings(&self.mappings)
    }
}

/// Where a generated position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalPosition {
    /// Index into `sources`.
    pub source: u32,
    /// Zero-based line.
    pub line: u32,
    /// Zero-based UTF-16 column.
    pub column: u32,
    /// Index into `names`.
    pub name: Option<u32>,
}

/// One mapping segment. Lines are 0-based, columns count UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// Line in the generated file.
    pub generated_line: u32,
    /// Column in the generated file.
    pub generated_column: u32,
    /// `None` for a generated-only segment.
    pub original: Option<OriginalPosition>,
}

/// Decode a `mappings` string.
///
/// # Errors
/// Returns an error on bad digits, truncated values, segments with a field
/// count other than 1, 4 or 5, and values outside `u32`.
pub fn decode_mappings(mappings: &str) -> Result<Vec<Mapping>, SourceMapError> {
    let mut decoded = Vec::new();
    let mut source: i64 = 0;
    let mut original_line: i64 = 0;
    let mut original_column: i64 = 0;
    let mut name: i64 = 0;

    for (line_index, line) in mappings.split(';').enumerate() {
        let generated_line = u32::try_from(line_index).map_err(|_| SourceMapError::OutOfRange)?;
        let mut generated_column: i64 = 0;

        for segment in line.split(',').filter(|segment| !segment.is_empty()) {
            let fields = decode_segment(segment)?;
            let (column_delta, rest) =
                fields.split_first().ok_or(SourceMapError::InvalidSegment(0))?;
            generated_column += column_delta;

            let original = match *rest {
                [] => None,
                [source_delta, line_delta, column_delta, ref name_delta @ ..]
                    if name_delta.len() <= 1 =>
                {
                    source += source_delta;
                    original_line += line_delta;
                    original_column += column_delta;
                    let name_index = match name_delta.first() {
                        Some(delta) => {
                            name += delta;
                            Some(to_u32(name)?)
                        }
                        None => None,
                    };
                    Some(OriginalPosition {
                        source: to_u32(source)?,
                        line: to_u32(original_line)?,
                        column: to_u32(original_column)?,
                        name: name_index,
                    })
                }
                _ => return Err(SourceMapError::InvalidSegment(fields.len())),
            };

            decoded.push(Mapping {
                generated_line,
                generated_column: to_u32(generated_column)?,
                original,
            });
        }
    }

    Ok(decoded)
}

/// Encode mappings. Order of `mappings` does not matter.
#[must_use]
pub fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut sorted: Vec<&Mapping> = mappings.iter().collect();
    sorted.sort_by_key(|m| (m.generated_line, m.generated_column));

    let mut encoded = String::new();
    let mut current_line = 0;
    let mut previous_column = 0;
    let mut first_in_line = true;
    let mut source = 0;
    let mut original_line = 0;
    let mut original_column = 0;
    let mut name = 0;

    for mapping in sorted {
        while current_line < mapping.generated_line {
            encoded.push(';');
            current_line += 1;
            previous_column = 0;
            first_in_line = true;
        }
        if !first_in_line {
            encoded.push(',');
        }
        first_in_line = false;

        encode_delta(&mut encoded, mapping.generated_column, &mut previous_column);
        if let Some(original) = mapping.original {
            encode_delta(&mut encoded, original.source, &mut source);
            encode_delta(&mut encoded, original.line, &mut original_line);
            encode_delta(&mut encoded, original.column, &mut original_column);
            if let Some(name_index) = original.name {
                encode_delta(&mut encoded, name_index, &mut name);
            }
        }
    }

    encoded
}

/// Checked narrowing of a decoded value.
fn to_u32(value: i64) -> Result<u32, SourceMapError> {
    u32::try_from(value).map_err(|_| SourceMapError::OutOfRange)
}

/// Raw signed values of one segment.
fn decode_segment(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut values = Vec::with_capacity(5);
    let mut accumulated: i64 = 0;
    let mut shift = 0;
    let mut pending = false;

    for c in segment.chars() {
        let digit = base64_value(c).ok_or(SourceMapError::InvalidDigit(c))?;
        if shift > 32 {
            return Err(SourceMapError::OutOfRange);
        }
        accumulated |= i64::from(digit & VLQ_DATA_MASK) << shift;
        if digit & VLQ_CONTINUATION_BIT == 0 {
            let magnitude = accumulated >> 1;
            values.push(if accumulated & 1 == 1 { -magnitude } else { magnitude });
            accumulated = 0;
            shift = 0;
            pending = false;
        } else {
            shift += VLQ_SHIFT;
            pending = true;
        }
    }

    if pending {
        return Err(SourceMapError::TruncatedValue);
    }
    Ok(values)
}

/// Append `value` relative to `previous` and advance `previous`.
fn encode_delta(out: &mut String, value: u32, previous: &mut u32) {
    encode_vlq(out, i64::from(value) - i64::from(*previous));
    *previous = value;
}

/// Append one signed VLQ value.
fn encode_vlq(out: &mut String, value: i64) {
    let mut remaining = if value < 0 { (-value << 1) | 1 } else { value << 1 };
    loop {
        let mut digit = u8::try_from(remaining & i64::from(VLQ_DATA_MASK)).unwrap_or_default();
        remaining >>= VLQ_SHIFT;
        if remaining > 0 {
            digit |= VLQ_CONTINUATION_BIT;
        }
        if let Some(&byte) = BASE64_ALPHABET.get(usize::from(digit)) {
            out.push(char::from(byte));
        }
        if remaining == 0 {
            break;
        }
    }
}

/// Value of a base64 digit.
fn base64_value(c: char) -> Option<u8> {
    let value = match c {
        'A'..='Z' => u32::from(c) - u32::from('A'),
        'a'..='z' => u32::from(c) - u32::from('a') + 26,
        '0'..='9' => u32::from(c) - u32::from('0') + 52,
        '+' => 62,
        '/' => 63,
        _ => return None,
    };
    u8::try_from(value).ok()
}
