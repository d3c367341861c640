//! Source text and the offset <-> (line, column) mapping used by diagnostics.

use std::fmt;

/// A 1-based (line, column) pair. Columns count logical characters, so a
/// UTF-8 continuation byte never bumps the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open `[start, end)` byte-offset range into a `Source`'s text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SourceRange {
    pub start: u32,
    pub end: u32,
}

impl SourceRange {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// Smallest range containing both `self` and `other`.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Immutable source text plus a line-start offset table.
///
/// The table is built once at construction so that `offset_to_position` can
/// binary-search it rather than rescanning the text on every diagnostic.
pub struct Source {
    filename: String,
    text: String,
    /// Byte offset of the start of each line; `line_starts[0]` is always 0.
    line_starts: Vec<u32>,
}

impl Source {
    #[must_use]
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                // Safe: sources are capped well below u32::MAX in practice; a
                // source that overflows this is rejected by the tokenizer's
                // max-length guard before construction.
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            filename: filename.into(),
            text,
            line_starts,
        }
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn slice(&self, range: SourceRange) -> &str {
        &self.text[range.start as usize..range.end as usize]
    }

    /// Converts a byte offset to a 1-based `(line, column)` pair.
    ///
    /// Column advances per logical (UTF-8) character, not per byte.
    #[must_use]
    pub fn offset_to_position(&self, offset: u32) -> SourcePosition {
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_index];
        let column = self.text[line_start as usize..offset as usize].chars().count() + 1;
        SourcePosition {
            line: (line_index + 1) as u32,
            column: column as u32,
        }
    }

    /// Inverse of `offset_to_position`; returns `None` if `pos` is out of bounds.
    #[must_use]
    pub fn position_to_offset(&self, pos: SourcePosition) -> Option<u32> {
        let line_start = *self.line_starts.get(pos.line.checked_sub(1)? as usize)?;
        let line_end = self
            .line_starts
            .get(pos.line as usize)
            .copied()
            .unwrap_or(self.text.len() as u32);
        if pos.column == 1 {
            return Some(line_start);
        }
        self.text[line_start as usize..line_end as usize]
            .char_indices()
            .nth((pos.column - 1) as usize)
            .map(|(byte_offset, _)| line_start + byte_offset as u32)
    }

    /// Returns the line's text (without the trailing `\n`/`\r\n`) for the
    /// given 1-based line number, used to render the caret preview in
    /// diagnostic rendering.
    #[must_use]
    pub fn line_text(&self, line: u32) -> &str {
        let Some(&start) = self.line_starts.get(line.checked_sub(1).unwrap_or(0) as usize) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line as usize)
            .copied()
            .unwrap_or(self.text.len() as u32) as usize;
        self.text[start as usize..end].trim_end_matches(['\n', '\r'])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_round_trip_on_single_line() {
        let src = Source::new("t.fx", "int x = 10;");
        let pos = src.offset_to_position(4);
        assert_eq!(pos, SourcePosition { line: 1, column: 5 });
    }

    #[test]
    fn multi_line_offsets_advance_line_number() {
        let src = Source::new("t.fx", "a\nbb\nccc");
        assert_eq!(src.offset_to_position(0).line, 1);
        assert_eq!(src.offset_to_position(2).line, 2);
        assert_eq!(src.offset_to_position(5).line, 3);
    }

    #[test]
    fn column_counts_characters_not_bytes() {
        // 'é' is two UTF-8 bytes but one logical character.
        let src = Source::new("t.fx", "é x");
        let pos = src.offset_to_position(3); // byte offset of 'x'
        assert_eq!(pos.column, 3);
    }
}
