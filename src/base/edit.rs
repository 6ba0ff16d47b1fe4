//! Text edits in a tree's coordinate space.

use super::{Length, Point, Range};

/// One contiguous replacement: `[start_byte, old_end_byte)` became
/// `[start_byte, new_end_byte)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_position: Point,
    pub old_end_position: Point,
    pub new_end_position: Point,
}

impl InputEdit {
    /// Describe replacing `old_text[start_byte..old_end_byte]` with `replacement`.
    ///
    /// Points are derived from the UTF-8 text, so this is only meaningful for
    /// documents parsed with the UTF-8 encoding.
    pub fn for_utf8_text(
        old_text: &str,
        start_byte: usize,
        old_end_byte: usize,
        replacement: &str,
    ) -> Self {
        let start_position = point_at(old_text, start_byte);
        let old_end_position = point_at(old_text, old_end_byte);
        let new_end_position = start_position.add(extent_of(replacement.as_bytes()));
        Self {
            start_byte,
            old_end_byte,
            new_end_byte: start_byte + replacement.len(),
            start_position,
            old_end_position,
            new_end_position,
        }
    }

    pub(crate) fn start(&self) -> Length {
        Length::new(self.start_byte, self.start_position)
    }

    pub(crate) fn old_end(&self) -> Length {
        Length::new(self.old_end_byte, self.old_end_position)
    }

    pub(crate) fn new_end(&self) -> Length {
        Length::new(self.new_end_byte, self.new_end_position)
    }

    /// Move a coordinate from before the edit into the edited text.
    ///
    /// Positions inside the replaced span collapse onto the edit start.
    pub fn edit_point(&self, byte: usize, point: Point) -> (usize, Point) {
        if byte >= self.old_end_byte {
            match self.new_end_byte.checked_add(byte - self.old_end_byte) {
                Some(moved) => (
                    moved,
                    self.new_end_position.add(point.sub(self.old_end_position)),
                ),
                None => (usize::MAX, Point::MAX),
            }
        } else if byte > self.start_byte {
            (self.start_byte, self.start_position)
        } else {
            (byte, point)
        }
    }

    /// Move a range through the edit. Unbounded ends stay unbounded, and text
    /// inserted exactly at either boundary ends up inside the range.
    pub fn edit_range(&self, range: &mut Range) {
        if range.end_byte != usize::MAX {
            (range.end_byte, range.end_point) = self.edit_point(range.end_byte, range.end_point);
        }
        if range.start_byte > self.start_byte {
            (range.start_byte, range.start_point) =
                self.edit_point(range.start_byte, range.start_point);
        }
    }
}

fn point_at(text: &str, byte: usize) -> Point {
    let bytes = text.as_bytes();
    extent_of(&bytes[..byte.min(bytes.len())])
}

fn extent_of(bytes: &[u8]) -> Point {
    match bytes.iter().rposition(|&b| b == b'\n') {
        Some(last_newline) => Point::new(
            bytes.iter().filter(|&&b| b == b'\n').count(),
            bytes.len() - last_newline - 1,
        ),
        None => Point::new(0, bytes.len()),
    }
}
