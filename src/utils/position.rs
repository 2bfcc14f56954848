//! Mapping absolute source offsets to line and column numbers
//!
//! Positions inside the tree are byte offsets into the original source.
//! [`LineIndex`] turns them into `(line, column)` pairs for diagnostics; it
//! is never consulted while parsing.

use std::fmt;

/// A resolved source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Byte offset into the source
    pub offset: usize,
    /// 0-indexed line
    pub line: usize,
    /// 0-indexed byte column within the line
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line + 1, self.column + 1)
    }
}

/// Sorted line-break offsets of a source text.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    breaks: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let breaks = source
            .char_indices()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| i)
            .collect();
        Self {
            breaks,
            len: source.len(),
        }
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// Offsets past the end of the source are clamped to the last position.
    pub fn char_offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        // Number of line breaks strictly before `offset`.
        let line = self.breaks.partition_point(|&b| b < offset);
        let column = match line {
            0 => offset,
            _ => offset - self.breaks[line - 1] - 1,
        };
        (line, column)
    }

    pub fn locate(&self, offset: usize) -> Location {
        let (line, column) = self.char_offset_to_line_col(offset);
        Location {
            offset,
            line,
            column,
        }
    }

    pub fn line_count(&self) -> usize {
        self.breaks.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        let index = LineIndex::new("hello\nworld\nI scream for ice cream!");
        assert_eq!(index.char_offset_to_line_col(0), (0, 0));
        assert_eq!(index.char_offset_to_line_col(3), (0, 3));
    }

    #[test]
    fn test_line_starts() {
        let index = LineIndex::new("hello\nworld\nI scream for ice cream!");
        assert_eq!(index.char_offset_to_line_col(6), (1, 0));
        assert_eq!(index.char_offset_to_line_col(12), (2, 0));
    }

    #[test]
    fn test_newline_belongs_to_its_line() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.char_offset_to_line_col(2), (0, 2));
        assert_eq!(index.char_offset_to_line_col(3), (1, 0));
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.char_offset_to_line_col(100), (1, 2));
        assert_eq!(index.line_count(), 2);
    }

    #[test]
    fn test_location_display_is_one_indexed() {
        let index = LineIndex::new("x\ny");
        assert_eq!(index.locate(2).to_string(), "line 2, column 1");
    }
}
