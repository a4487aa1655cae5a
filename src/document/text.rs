//! Text utilities for position conversion.
//!
//! LSP positions are line/character pairs with the character measured in
//! UTF-16 code units, while all region math in this crate is done in byte
//! offsets. `LineIndex` pre-computes line starts so conversions are cheap.

use tower_lsp::lsp_types::Position;

/// Pre-computed line index for a document's text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts. Always contains at least `[0]`.
    line_starts: Vec<usize>,
    source: String,
}

impl LineIndex {
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];
        for (i, c) in source.char_indices() {
            if c == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Convert a byte offset to an LSP position (UTF-16 column).
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.source.len());

        let mut col = 0u32;
        for (i, c) in self.source[line_start..line_end].char_indices() {
            if line_start + i >= offset {
                break;
            }
            col += c.len_utf16() as u32;
        }

        Position::new(line as u32, col)
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns `None` when the line is out of bounds; a column past the end of
    /// its line clamps to the end of that line.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return None;
        }

        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|&end| end.saturating_sub(1))
            .unwrap_or(self.source.len());

        let mut utf16_col = 0u32;
        for (i, c) in self.source[line_start..line_end].char_indices() {
            if utf16_col >= position.character {
                return Some(line_start + i);
            }
            utf16_col += c.len_utf16() as u32;
        }

        Some(line_end.min(self.source.len()))
    }

    /// Convert a byte span to an LSP range.
    pub fn span_to_range(&self, span: &std::ops::Range<usize>) -> tower_lsp::lsp_types::Range {
        tower_lsp::lsp_types::Range::new(
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }
}

/// Find the identifier-like word covering `offset`.
///
/// Word characters follow the host expression language: ASCII alphanumerics,
/// `_` and `$`. An offset sitting just past the last character of a word
/// (cursor at word end) still yields that word.
pub fn word_at_offset(text: &str, offset: usize) -> Option<(&str, std::ops::Range<usize>)> {
    if offset > text.len() {
        return None;
    }

    let bytes = text.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$';

    let mut start = offset;
    while start > 0 && is_word(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = offset;
    while end < bytes.len() && is_word(bytes[end]) {
        end += 1;
    }

    if start == end {
        return None;
    }
    Some((&text[start..end], start..end))
}
