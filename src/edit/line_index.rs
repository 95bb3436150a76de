//! Conversion between byte offsets and source-map positions.

/// A non-ASCII character, with its UTF-16 offset from the start of the text.
#[derive(Debug, Clone, Copy)]
struct WideChar {
    /// Byte offset.
    byte: usize,
    /// UTF-16 offset.
    utf16: usize,
    /// Encoded length in bytes.
    byte_len: usize,
    /// 1, or 2 for a surrogate pair.
    utf16_len: usize,
}

impl WideChar {
    /// Byte offset just past the character.
    const fn byte_end(&self) -> usize {
        self.byte + self.byte_len
    }

    /// UTF-16 offset just past the character.
    const fn utf16_end(&self) -> usize {
        self.utf16 + self.utf16_len
    }
}

/// Line starts and non-ASCII characters of a text.
///
/// Source-map columns count UTF-16 code units, so columns only differ from
/// byte offsets after a non-ASCII character; those are the only ones stored.
#[derive(Debug, Clone)]
pub(super) struct LineIndex {
    /// Text length in bytes.
    len: usize,
    /// Byte offset of every line start.
    line_starts: Vec<usize>,
    /// Sorted by offset.
    wide_chars: Vec<WideChar>,
}

impl LineIndex {
    /// Index `text`.
    pub(super) fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut wide_chars = Vec::new();
        let mut utf16 = 0;

        for (byte, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(byte + 1);
            }
            if !c.is_ascii() {
                wide_chars.push(WideChar {
                    byte,
                    utf16,
                    byte_len: c.len_utf8(),
                    utf16_len: c.len_utf16(),
                });
            }
            utf16 += c.len_utf16();
        }

        Self { len: text.len(), line_starts, wide_chars }
    }

    /// Byte offset of a 0-based line and UTF-16 column.
    ///
    /// `None` when the position lies past the end of its line.
    pub(super) fn offset(&self, line: u32, column: u32) -> Option<usize> {
        let line = usize::try_from(line).ok()?;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self.line_starts.get(line + 1).map_or(self.len, |next| next - 1);

        let target = self.utf16_of(line_start) + usize::try_from(column).ok()?;
        let offset = self.byte_of(target);

        (offset <= line_end).then_some(offset)
    }

    /// 0-based line and UTF-16 column of a byte offset.
    pub(super) fn position(&self, offset: usize) -> Option<(u32, u32)> {
        if offset > self.len {
            return None;
        }
        let line = self.line_starts.partition_point(|start| *start <= offset).checked_sub(1)?;
        let line_start = *self.line_starts.get(line)?;
        let column = self.utf16_of(offset) - self.utf16_of(line_start);

        Some((u32::try_from(line).ok()?, u32::try_from(column).ok()?))
    }

    /// UTF-16 offset of a byte offset.
    fn utf16_of(&self, offset: usize) -> usize {
        let preceding = self.wide_chars.partition_point(|c| c.byte < offset);
        match preceding.checked_sub(1).and_then(|index| self.wide_chars.get(index)) {
            Some(c) if offset >= c.byte_end() => c.utf16_end() + (offset - c.byte_end()),
            // Inside a multi-byte character.
            Some(c) => c.utf16,
            None => offset,
        }
    }

    /// Byte offset of a UTF-16 offset.
    fn byte_of(&self, utf16: usize) -> usize {
        let preceding = self.wide_chars.partition_point(|c| c.utf16 < utf16);
        match preceding.checked_sub(1).and_then(|index| self.wide_chars.get(index)) {
            Some(c) if utf16 >= c.utf16_end() => c.byte_end() + (utf16 - c.utf16_end()),
            // Between the halves of a surrogate pair.
            Some(c) => c.byte,
            None => utf16,
        }
    }
}
