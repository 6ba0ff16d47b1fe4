//! Tree tests
//!
//! Changed-range reporting, tree copies across threads, and debug graph
//! output.

pub mod tests_changed_ranges;
pub mod tests_debug_graph;
pub mod tests_lifecycle;
