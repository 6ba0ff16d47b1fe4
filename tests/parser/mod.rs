//! Parser tests
//!
//! End-to-end parsing through the public API:
//! - Fresh parses over every input kind and encoding
//! - Incremental re-parses matching fresh ones
//! - Included ranges
//! - Cancellation, timeouts and resumption

pub mod tests_cancellation;
pub mod tests_included_ranges;
pub mod tests_incremental;
