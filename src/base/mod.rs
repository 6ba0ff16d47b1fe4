//! Foundation types for the engine.
//!
//! This module provides the coordinate types every other module works in:
//! - [`Point`] - row/column positions
//! - [`Length`] - relative byte + point extents used inside subtrees
//! - [`Range`] - byte/point intervals, and included-range validation
//! - [`InputEdit`] - one contiguous text replacement
//!
//! Apart from the error type returned by range validation, this module has no
//! dependencies on other grove modules.

mod edit;
mod length;
mod position;
mod range;

pub use edit::InputEdit;
pub use length::Length;
pub use position::Point;
pub use range::{Range, validate_ranges};

pub(crate) use range::range_differences;
