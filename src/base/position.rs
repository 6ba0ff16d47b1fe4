//! Row/column position tracking
//!
//! Columns count bytes in the input encoding, so a UTF-16 document advances
//! two columns per code unit.

use std::fmt;

/// A position in source text (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };

    /// Sentinel used by unbounded ranges
    pub const MAX: Point = Point {
        row: usize::MAX,
        column: usize::MAX,
    };

    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Append a relative extent to this point.
    pub(crate) fn add(self, delta: Point) -> Point {
        if delta.row > 0 {
            Point::new(self.row.saturating_add(delta.row), delta.column)
        } else {
            Point::new(self.row, self.column.saturating_add(delta.column))
        }
    }

    /// Relative extent from `other` to `self`, saturating at zero.
    pub(crate) fn sub(self, other: Point) -> Point {
        if self.row > other.row {
            Point::new(self.row - other.row, self.column)
        } else {
            Point::new(0, self.column.saturating_sub(other.column))
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}
