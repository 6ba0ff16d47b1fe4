//! Decoded document text, read on demand.
//!
//! Lexers work on UTF-8 `&str`, while tree coordinates stay in the input's
//! own byte space. A [`Source`] keeps a window of decoded text inside one
//! included range and pulls more chunks from the [`Input`] only when the
//! lexer asks for them, so text the parse never visits is never read. When
//! the decoded text differs from the input bytes, the window keeps a table
//! mapping UTF-8 offsets back to input offsets.

use text_size::{TextRange, TextSize};

use super::halt::{Halt, Halted};
use crate::base::{Length, Point, Range};
use crate::input::{Input, InputEncoding};

/// Upper bound on the bytes taken from one `Input::read` call.
const READ_LIMIT: usize = 1024;

/// Decoded text kept behind the lexing position before it is dropped.
const KEEP_BEHIND: usize = 16 * 1024;

pub(crate) struct Source<'a> {
    input: &'a mut dyn Input,
    encoding: InputEncoding,
    ranges: &'a [Range],
    /// Offset of the first empty chunk, once one was returned.
    input_end: Option<usize>,
    window: Window,
}

#[derive(Debug, Default)]
struct Window {
    /// Index of the included range the window lies in.
    range: usize,
    /// Absolute input offset of the first decoded byte.
    start: usize,
    decoded: Decoded,
    /// Raw bytes read but not yet decoded, at most one partial character.
    pending: Vec<u8>,
    /// Leading bytes of `pending` already counted in `read_point`.
    scanned: usize,
    /// Absolute input offset just past the last byte read.
    read_end: usize,
    read_point: Point,
    /// Nothing more follows in this range.
    complete: bool,
}

#[derive(Debug, Default)]
struct Decoded {
    text: String,
    /// Input offset (relative to the window start) of every UTF-8 byte in
    /// `text`. `None` while the two coincide.
    offsets: Option<Vec<usize>>,
    /// Relative input offset just past `text`.
    end: usize,
}

impl<'a> Source<'a> {
    pub(crate) fn new(input: &'a mut dyn Input, ranges: &'a [Range]) -> Self {
        let encoding = input.encoding();
        Self {
            input,
            encoding,
            ranges,
            input_end: None,
            // Matches no range, so the first request positions it.
            window: Window::new(usize::MAX, Length::ZERO, encoding),
        }
    }

    /// The first position at or after `from` where included text exists.
    /// `None` once the document ends.
    ///
    /// A position between ranges moves to the start of the next range that
    /// holds text. An empty chunk ends the document; later ranges
    /// contribute nothing.
    pub(crate) fn next_text(
        &mut self,
        from: Length,
        halt: &mut Halt<'_>,
    ) -> Result<Option<Length>, Halted> {
        let mut index = self.range_index(from.bytes);
        while let Some(range) = self.ranges.get(index) {
            let at = if from.bytes < range.start_byte {
                Length::new(range.start_byte, range.start_point)
            } else {
                from
            };
            if self.input_end.is_some_and(|end| at.bytes >= end) {
                return Ok(None);
            }
            if at.bytes < range.end_byte {
                self.fill(index, at, 1, halt)?;
                if self.window.has_text_at(at.bytes) {
                    return Ok(Some(at));
                }
            }
            index += 1;
        }
        Ok(None)
    }

    /// Decoded text from `at`, holding at least `want` bytes unless the
    /// range or the input ends first. The flag is set when nothing follows
    /// the returned text in this range.
    ///
    /// `at` must be a position [`next_text`](Self::next_text) returned, or
    /// lie after one within the same range.
    pub(crate) fn text_at(
        &mut self,
        at: Length,
        want: usize,
        halt: &mut Halt<'_>,
    ) -> Result<(&str, bool), Halted> {
        let range = self.range_index(at.bytes);
        self.fill(range, at, want, halt)?;
        let index = self.window.decoded.index_of(at.bytes - self.window.start);
        Ok((&self.window.decoded.text[index..], self.window.complete))
    }

    /// Input-space extent of the `len` UTF-8 bytes of text starting at the
    /// absolute offset `at`, which must lie in the current window.
    pub(crate) fn extent(&self, at: usize, len: TextSize) -> Length {
        let index = self.window.decoded.index_of(at - self.window.start);
        let index = TextSize::try_from(index).unwrap_or_default();
        self.window.decoded.extent(TextRange::at(index, len))
    }

    fn range_index(&self, offset: usize) -> usize {
        self.ranges.partition_point(|range| range.end_byte <= offset)
    }

    /// Position the window at `at` and read until `want` bytes follow it.
    fn fill(
        &mut self,
        range: usize,
        at: Length,
        want: usize,
        halt: &mut Halt<'_>,
    ) -> Result<(), Halted> {
        if !self.window.covers(range, at.bytes) {
            self.window = Window::new(range, at, self.encoding);
        }
        self.window.compact(at.bytes);
        loop {
            let index = self.window.decoded.index_of(at.bytes - self.window.start);
            if self.window.complete || self.window.decoded.text.len() - index >= want {
                return Ok(());
            }
            self.read_chunk(halt)?;
        }
    }

    fn read_chunk(&mut self, halt: &mut Halt<'_>) -> Result<(), Halted> {
        let encoding = self.encoding;
        let range_end = self.ranges.get(self.window.range).map_or(0, |range| range.end_byte);
        let window = &mut self.window;
        let exhausted = self.input_end.is_some_and(|end| window.read_end >= end);
        if window.read_end >= range_end || exhausted {
            window.finish(encoding);
            return Ok(());
        }
        if halt.check() {
            return Err(Halted);
        }

        let chunk = self.input.read(window.read_end, window.read_point);
        if chunk.is_empty() {
            self.input_end = Some(window.read_end);
            window.finish(encoding);
            return Ok(());
        }
        let take = chunk.len().min(range_end - window.read_end).min(READ_LIMIT);
        window.pending.extend_from_slice(&chunk[..take]);
        window.read_end += take;
        window.scan_points(encoding);
        if window.read_end >= range_end {
            window.finish(encoding);
        } else {
            window.decode(encoding, false);
        }
        Ok(())
    }
}

impl Window {
    fn new(range: usize, at: Length, encoding: InputEncoding) -> Self {
        Self {
            range,
            start: at.bytes,
            decoded: Decoded {
                offsets: (encoding != InputEncoding::Utf8).then(Vec::new),
                ..Decoded::default()
            },
            read_end: at.bytes,
            read_point: at.point,
            ..Self::default()
        }
    }

    fn covers(&self, range: usize, offset: usize) -> bool {
        self.range == range && offset >= self.start && offset <= self.start + self.decoded.end
    }

    fn has_text_at(&self, offset: usize) -> bool {
        offset >= self.start && self.decoded.index_of(offset - self.start) < self.decoded.text.len()
    }

    /// Drop decoded text far behind the absolute offset `at`.
    fn compact(&mut self, at: usize) {
        let index = self.decoded.index_of(at - self.start);
        if index < KEEP_BEHIND {
            return;
        }
        let shift = self.decoded.input_offset(index);
        self.decoded.text.drain(..index);
        if let Some(offsets) = &mut self.decoded.offsets {
            offsets.drain(..index);
            offsets.iter_mut().for_each(|offset| *offset -= shift);
        }
        self.decoded.end -= shift;
        self.start += shift;
    }

    /// Advance `read_point` over the complete code units in `pending`.
    fn scan_points(&mut self, encoding: InputEncoding) {
        let unit = encoding.code_unit_size();
        let complete = self.pending.len() - (self.pending.len() - self.scanned) % unit;
        for code_unit in self.pending[self.scanned..complete].chunks_exact(unit) {
            let is_newline = match encoding {
                InputEncoding::Utf8 => code_unit[0] == b'\n',
                InputEncoding::Utf16Le => code_unit == [b'\n', 0],
                InputEncoding::Utf16Be => code_unit == [0, b'\n'],
            };
            if is_newline {
                self.read_point = Point::new(self.read_point.row + 1, 0);
            } else {
                self.read_point.column += unit;
            }
        }
        self.scanned = complete;
    }

    fn finish(&mut self, encoding: InputEncoding) {
        self.decode(encoding, true);
        self.complete = true;
    }

    /// Decode the pending bytes. Unless `last`, a trailing partial
    /// character stays pending for the next chunk.
    fn decode(&mut self, encoding: InputEncoding, last: bool) {
        let consumed = match encoding {
            InputEncoding::Utf8 => decode_utf8(&mut self.decoded, &self.pending, last),
            InputEncoding::Utf16Le => {
                decode_utf16(&mut self.decoded, &self.pending, last, u16::from_le_bytes)
            }
            InputEncoding::Utf16Be => {
                decode_utf16(&mut self.decoded, &self.pending, last, u16::from_be_bytes)
            }
        };
        self.pending.drain(..consumed);
        self.scanned = self.scanned.saturating_sub(consumed);
    }
}

impl Decoded {
    /// UTF-8 index of the relative input offset `offset`, clamped to the
    /// decoded text.
    fn index_of(&self, offset: usize) -> usize {
        match &self.offsets {
            _ if offset >= self.end => self.text.len(),
            Some(offsets) => offsets.partition_point(|&input| input < offset),
            None => offset,
        }
    }

    fn input_offset(&self, index: usize) -> usize {
        match &self.offsets {
            _ if index >= self.text.len() => self.end,
            Some(offsets) => offsets[index],
            None => index,
        }
    }

    /// Input-space extent of a UTF-8 range of the decoded text.
    fn extent(&self, range: TextRange) -> Length {
        let start = usize::from(range.start());
        let bytes = self.input_offset(usize::from(range.end())) - self.input_offset(start);
        let mut point = Point::ZERO;
        for (index, ch) in self.text[range].char_indices() {
            if ch == '\n' {
                point = Point::new(point.row + 1, 0);
                continue;
            }
            let at = start + index;
            point.column += self.input_offset(at + ch.len_utf8()) - self.input_offset(at);
        }
        Length::new(bytes, point)
    }

    fn push_str(&mut self, text: &str) {
        if let Some(offsets) = &mut self.offsets {
            offsets.extend(self.end..self.end + text.len());
        }
        self.text.push_str(text);
        self.end += text.len();
    }

    fn push_char(&mut self, ch: char, width: usize) {
        let offsets = self
            .offsets
            .get_or_insert_with(|| (0..self.text.len()).collect());
        offsets.extend(std::iter::repeat_n(self.end, ch.len_utf8()));
        self.text.push(ch);
        self.end += width;
    }
}

/// Decode UTF-8, replacing invalid sequences with U+FFFD of the same input
/// width. Returns the number of bytes consumed.
fn decode_utf8(decoded: &mut Decoded, raw: &[u8], last: bool) -> usize {
    let mut consumed = 0;
    for chunk in raw.utf8_chunks() {
        let valid = chunk.valid();
        decoded.push_str(valid);
        consumed += valid.len();

        let invalid = chunk.invalid();
        if invalid.is_empty() {
            continue;
        }
        let truncated = consumed + invalid.len() == raw.len()
            && std::str::from_utf8(invalid).is_err_and(|error| error.error_len().is_none());
        if truncated && !last {
            break;
        }
        decoded.push_char(char::REPLACEMENT_CHARACTER, invalid.len());
        consumed += invalid.len();
    }
    consumed
}

fn decode_utf16(
    decoded: &mut Decoded,
    raw: &[u8],
    last: bool,
    from_bytes: fn([u8; 2]) -> u16,
) -> usize {
    let unit = |index: usize| from_bytes([raw[2 * index], raw[2 * index + 1]]);
    let mut units = raw.len() / 2;
    if !last && units > 0 && (0xD800..0xDC00).contains(&unit(units - 1)) {
        // A high surrogate waits for its pair.
        units -= 1;
    }
    for result in char::decode_utf16((0..units).map(unit)) {
        match result {
            Ok(ch) => decoded.push_char(ch, ch.len_utf16() * 2),
            Err(_) => decoded.push_char(char::REPLACEMENT_CHARACTER, 2),
        }
    }
    let mut consumed = units * 2;
    if last && raw.len() % 2 == 1 {
        decoded.push_char(char::REPLACEMENT_CHARACTER, 1);
        consumed += 1;
    }
    consumed
}
