//! Relative extents.

use std::ops::{Add, AddAssign, Sub};

use super::Point;

/// A byte count paired with the row/column extent it spans.
///
/// Subtrees store their padding and size as `Length`s relative to the end of
/// the previous sibling, so shifting a subtree never touches its contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Length {
    pub bytes: usize,
    pub point: Point,
}

impl Length {
    pub const ZERO: Length = Length {
        bytes: 0,
        point: Point::ZERO,
    };

    pub const fn new(bytes: usize, point: Point) -> Self {
        Self { bytes, point }
    }

    /// Like `-`, but collapses to zero unless `self` is strictly longer.
    pub fn saturating_sub(self, other: Length) -> Length {
        if self.bytes > other.bytes {
            self - other
        } else {
            Length::ZERO
        }
    }

    pub fn min(self, other: Length) -> Length {
        if other.bytes < self.bytes { other } else { self }
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length {
            bytes: self.bytes + rhs.bytes,
            point: self.point.add(rhs.point),
        }
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        *self = *self + rhs;
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Length {
        Length {
            bytes: self.bytes.saturating_sub(rhs.bytes),
            point: self.point.sub(rhs.point),
        }
    }
}
