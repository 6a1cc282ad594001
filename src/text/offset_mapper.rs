//! Byte offset to line/character conversion for an immutable text snapshot.

use crate::types::{Position, Range};

/// Maps UTF-8 byte offsets of one text snapshot to editor positions.
///
/// Line starts are computed once up front; every lookup is a binary search.
#[derive(Debug)]
pub struct TextOffsetMapper<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> TextOffsetMapper<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(index, _)| index + 1),
        );

        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a position.
    ///
    /// Offsets past the end clamp to the end of the text, offsets inside a
    /// multi-byte character clamp to the start of that character.
    pub fn to_position(&self, offset: usize) -> Position {
        let offset = self.floor_boundary(offset);
        let (line, line_start) = self.line_of(offset);
        let character = self.text[line_start..offset].chars().count();

        Position::new(line as u32, character as u32)
    }

    /// Convert a position back to a byte offset.
    ///
    /// Lines past the end clamp to the last line; characters past the end of
    /// a line clamp to the line terminator.
    pub fn offset_at(&self, position: Position) -> usize {
        let (line_start, line_end) = self.line_bounds(position.line as usize);

        self.text[line_start..line_end]
            .char_indices()
            .nth(position.character as usize)
            .map(|(index, _)| line_start + index)
            .unwrap_or(line_end)
    }

    pub fn range(&self, start: usize, end: usize) -> Range {
        Range::from_positions(self.to_position(start), self.to_position(end))
    }

    /// Like [`to_position`](Self::to_position), with `character` counted in
    /// UTF-16 code units as LSP and VS Code expect.
    pub fn to_utf16_position(&self, offset: usize) -> Position {
        let offset = self.floor_boundary(offset);
        let (line, line_start) = self.line_of(offset);
        let character = self.text[line_start..offset].encode_utf16().count();

        Position::new(line as u32, character as u32)
    }

    /// Inverse of [`to_utf16_position`](Self::to_utf16_position). A column
    /// in the middle of a surrogate pair resolves to the character's start.
    pub fn offset_at_utf16(&self, position: Position) -> usize {
        let (line_start, line_end) = self.line_bounds(position.line as usize);
        let target = position.character as usize;

        let mut units = 0;
        for (index, ch) in self.text[line_start..line_end].char_indices() {
            units += ch.len_utf16();
            if units > target {
                return line_start + index;
            }
        }
        line_end
    }

    pub fn utf16_range(&self, start: usize, end: usize) -> Range {
        Range::from_positions(self.to_utf16_position(start), self.to_utf16_position(end))
    }

    fn line_of(&self, offset: usize) -> (usize, usize) {
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        (line, self.line_starts[line])
    }

    fn line_bounds(&self, line: usize) -> (usize, usize) {
        let line = line.min(self.line_starts.len() - 1);
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        (self.line_starts[line], line_end)
    }

    fn floor_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
