//! Core types used throughout the project.

use std::fmt;

/// A range in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    /// Inclusive start.
    pub start: SourcePosition,
    /// Exclusive end.
    pub end: SourcePosition,
}

/// A position in source code (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourcePosition {
    /// Line number.
    pub line: u32,
    /// Byte column within the line.
    pub character: u32,
}

impl From<tree_sitter::Point> for SourcePosition {
    #[allow(clippy::cast_possible_truncation)]
    fn from(point: tree_sitter::Point) -> Self {
        Self { line: point.row as u32, character: point.column as u32 }
    }
}

impl SourceRange {
    /// Range covered by `node`.
    #[must_use]
    pub fn from_node(node: &tree_sitter::Node<'_>) -> Self {
        Self { start: node.start_position().into(), end: node.end_position().into() }
    }
}

/// Renders as `line:column` with a 1-based line and a 0-based column, the
/// convention bundlers use when reporting module locations.
impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::origin(0, 0, "1:0")]
    #[case::second_line(1, 4, "2:4")]
    #[case::far(41, 17, "42:17")]
    fn display_uses_one_based_lines(
        #[case] row: usize,
        #[case] column: usize,
        #[case] expected: &str,
    ) {
        let position = SourcePosition::from(tree_sitter::Point { row, column });

        assert_that!(position.to_string(), eq(expected));
    }

    #[rstest]
    fn from_node_covers_whole_node() {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_json::LANGUAGE.into()).unwrap();
        let tree = parser.parse("{\n  \"a\": 1\n}", None).unwrap();

        let range = SourceRange::from_node(&tree.root_node());

        assert_that!(range.start, eq(SourcePosition { line: 0, character: 0 }));
        assert_that!(range.end, eq(SourcePosition { line: 2, character: 1 }));
    }
}
