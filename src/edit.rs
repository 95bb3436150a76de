//! Span editing with source-map realignment.
//!
//! Edits are byte ranges of the original text. They are collected first and
//! applied in one pass; the result can then carry a source map of the
//! original text over to the edited text.

mod line_index;

use thiserror::Error;

use self::line_index::LineIndex;
use crate::source_map::{
    Mapping,
    SourceMap,
    SourceMapError,
    encode_mappings,
};

/// Edits that cannot be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Range does not fit the original text.
    #[error("Edit {start}..{end} is outside the text or splits a character")]
    InvalidRange {
        /// First byte.
        start: usize,
        /// Byte past the end.
        end: usize,
    },

    /// Two edits share bytes.
    #[error("Edit {start}..{end} overlaps edit {other_start}..{other_end}")]
    Overlapping {
        /// First byte of the later edit.
        start: usize,
        /// End of the later edit.
        end: usize,
        /// First byte of the earlier edit.
        other_start: usize,
        /// End of the earlier edit.
        other_end: usize,
    },

    /// Map of the original text is malformed.
    #[error(transparent)]
    SourceMap(#[from] SourceMapError),
}

/// `start..end` of the original becomes `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Replacement {
    /// First replaced byte.
    start: usize,
    /// Byte past the replaced range.
    end: usize,
    /// New text.
    text: String,
}

/// Collects non-overlapping replacements against an original text.
#[derive(Debug, Clone)]
pub struct SpanEditor<'a> {
    /// Text every range refers to.
    original: &'a str,
    /// In insertion order.
    replacements: Vec<Replacement>,
}

impl<'a> SpanEditor<'a> {
    /// Editor without replacements.
    #[must_use]
    pub const fn new(original: &'a str) -> Self {
        Self { original, replacements: Vec::new() }
    }

    /// Replace `start..end` of the original text with `text`.
    ///
    /// An empty range inserts.
    ///
    /// # Errors
    /// Returns an error when the range is reversed, out of bounds or not on
    /// character boundaries. Overlaps are reported by [`Self::apply`].
    pub fn overwrite(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        if start > end || self.original.get(start..end).is_none() {
            return Err(EditError::InvalidRange { start, end });
        }
        self.replacements.push(Replacement { start, end, text: text.into() });
        Ok(())
    }

    /// Number of collected replacements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Nothing to replace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Apply every replacement in one pass.
    ///
    /// # Errors
    /// Returns [`EditError::Overlapping`] when two replacements share bytes.
    pub fn apply(mut self) -> Result<EditedText<'a>, EditError> {
        self.replacements.sort_by_key(|r| (r.start, r.end));

        for pair in self.replacements.windows(2) {
            if let [previous, next] = pair
                && previous.end > next.start
            {
                return Err(EditError::Overlapping {
                    start: next.start,
                    end: next.end,
                    other_start: previous.start,
                    other_end: previous.end,
                });
            }
        }

        let inserted: usize = self.replacements.iter().map(|r| r.text.len()).sum();
        let mut text = String::with_capacity(self.original.len() + inserted);
        let mut removed_before = Vec::with_capacity(self.replacements.len() + 1);
        let mut inserted_before = Vec::with_capacity(self.replacements.len() + 1);
        let (mut removed, mut inserted, mut cursor) = (0, 0, 0);

        for replacement in &self.replacements {
            removed_before.push(removed);
            inserted_before.push(inserted);
            text.push_str(self.original.get(cursor..replacement.start).unwrap_or_default());
            text.push_str(&replacement.text);
            removed += replacement.end - replacement.start;
            inserted += replacement.text.len();
            cursor = replacement.end;
        }
        removed_before.push(removed);
        inserted_before.push(inserted);
        text.push_str(self.original.get(cursor..).unwrap_or_default());

        Ok(EditedText {
            original: self.original,
            text,
            spans: self.replacements.into_iter().map(|r| (r.start, r.end)).collect(),
            removed_before,
            inserted_before,
        })
    }
}

/// The outcome of [`SpanEditor::apply`].
#[derive(Debug, Clone)]
pub struct EditedText<'a> {
    /// Text before the edit.
    original: &'a str,
    /// Text after the edit.
    text: String,
    /// Sorted replaced ranges of the original.
    spans: Vec<(usize, usize)>,
    /// Bytes removed by the first `i` replacements.
    removed_before: Vec<usize>,
    /// Bytes inserted by the first `i` replacements.
    inserted_before: Vec<usize>,
}

impl EditedText<'_> {
    /// The edited text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The edited text, owned.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }

    /// Where an original byte offset ended up.
    ///
    /// The start of a replaced range maps to the start of its replacement.
    /// Offsets strictly inside a replaced range no longer exist.
    #[must_use]
    pub fn map_offset(&self, offset: usize) -> Option<usize> {
        let preceding = self.spans.partition_point(|(start, _)| *start < offset);
        if let Some((_, end)) = preceding.checked_sub(1).and_then(|i| self.spans.get(i))
            && offset < *end
        {
            return None;
        }
        let removed = self.removed_before.get(preceding)?;
        let inserted = self.inserted_before.get(preceding)?;
        Some(offset + inserted - removed)
    }

    /// Carry `map`, which describes the original text, over to the edited
    /// text. Mappings inside replaced ranges are dropped; `file` names the
    /// edited asset.
    ///
    /// # Errors
    /// Returns an error when the mappings of `map` are malformed.
    pub fn realign(&self, map: &SourceMap, file: &str) -> Result<SourceMap, EditError> {
        let original_index = LineIndex::new(self.original);
        let edited_index = LineIndex::new(&self.text);

        let mappings: Vec<Mapping> = map
            .decode_mappings()?
            .into_iter()
            .filter_map(|mapping| {
                let offset =
                    original_index.offset(mapping.generated_line, mapping.generated_column)?;
                let (generated_line, generated_column) =
                    edited_index.position(self.map_offset(offset)?)?;
                Some(Mapping { generated_line, generated_column, ..mapping })
            })
            .collect();

        Ok(SourceMap {
            file: Some(file.to_string()),
            mappings: encode_mappings(&mappings),
            ..map.clone()
        })
    }
}
