//! Byte/point intervals and included-range sets.

use crate::error::{Error, Result};

use super::Point;

/// A byte interval paired with the points at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_point: Point,
    pub end_point: Point,
}

impl Range {
    /// The whole document; the default included range.
    pub const ALL: Range = Range {
        start_byte: 0,
        end_byte: usize::MAX,
        start_point: Point::ZERO,
        end_point: Point::MAX,
    };

    pub const fn new(start_byte: usize, end_byte: usize, start_point: Point, end_point: Point) -> Self {
        Self {
            start_byte,
            end_byte,
            start_point,
            end_point,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start_byte >= self.end_byte
    }

    /// Check if a byte offset falls within this range
    pub fn contains_byte(&self, byte: usize) -> bool {
        self.start_byte <= byte && byte < self.end_byte
    }

    fn is_well_formed(&self) -> bool {
        self.start_byte <= self.end_byte && self.start_point <= self.end_point
    }
}

/// Validate an included-range set.
///
/// Every range must be well formed and start at or after the end of the one
/// before it. Overlapping or descending ranges are rejected.
///
/// Touching ranges, where `start_byte` equals the previous `end_byte`, are
/// accepted. Ranges are half-open, so the shared boundary byte belongs to the
/// later range only. Text on either side of the boundary is lexed separately:
/// no token spans two ranges.
pub fn validate_ranges(ranges: &[Range]) -> Result<()> {
    let mut previous_end = 0;
    for (index, range) in ranges.iter().enumerate() {
        if !range.is_well_formed() || range.start_byte < previous_end {
            return Err(Error::InvalidIncludedRanges { index });
        }
        previous_end = range.end_byte;
    }
    Ok(())
}

/// Regions covered by exactly one of two valid range sets, in ascending order.
pub(crate) fn range_differences(old: &[Range], new: &[Range]) -> Vec<Range> {
    let mut boundaries: Vec<(usize, Point)> = old
        .iter()
        .chain(new)
        .flat_map(|r| [(r.start_byte, r.start_point), (r.end_byte, r.end_point)])
        .collect();
    boundaries.sort_by_key(|&(byte, _)| byte);
    boundaries.dedup_by_key(|&mut (byte, _)| byte);

    let mut result: Vec<Range> = Vec::new();
    for pair in boundaries.windows(2) {
        let (start, start_point) = pair[0];
        let (end, end_point) = pair[1];
        if covers(old, start) == covers(new, start) {
            continue;
        }
        match result.last_mut() {
            Some(last) if last.end_byte == start => {
                last.end_byte = end;
                last.end_point = end_point;
            }
            _ => result.push(Range::new(start, end, start_point, end_point)),
        }
    }
    result
}

fn covers(ranges: &[Range], byte: usize) -> bool {
    let index = ranges.partition_point(|r| r.end_byte <= byte);
    ranges.get(index).is_some_and(|r| r.start_byte <= byte)
}
