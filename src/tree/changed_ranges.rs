//! Structural diff of two tree revisions.
//!
//! Both trees are walked in step. Subtrees that provably match are skipped
//! whole, subtrees that may differ are descended, and subtrees that differ
//! report the span they cover in both trees. The old tree must already be
//! edited into the new tree's coordinates, so nodes that merely moved line up
//! and are not reported.

use super::Subtree;
use crate::base::{Length, Range, range_differences};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Matches,
    MayDiffer,
    Differs,
}

#[derive(Debug)]
struct Entry<'t> {
    subtree: &'t Subtree,
    /// Absolute position where the subtree's padding begins.
    position: Length,
    child_index: usize,
}

/// Depth-first walk that can skip or enter the current subtree.
#[derive(Debug)]
struct Cursor<'t> {
    stack: Vec<Entry<'t>>,
}

impl<'t> Cursor<'t> {
    fn new(root: &'t Subtree) -> Self {
        Self {
            stack: vec![Entry {
                subtree: root,
                position: Length::ZERO,
                child_index: 0,
            }],
        }
    }

    fn current(&self) -> Option<(&'t Subtree, Length)> {
        self.stack.last().map(|e| (e.subtree, e.position))
    }

    fn descend(&mut self) -> bool {
        let Some(entry) = self.stack.last() else {
            return false;
        };
        let Some(first) = entry.subtree.children().first() else {
            return false;
        };
        let position = entry.position;
        self.stack.push(Entry {
            subtree: first,
            position,
            child_index: 0,
        });
        true
    }

    /// Move past the current subtree.
    fn advance(&mut self) {
        while let Some(entry) = self.stack.pop() {
            let Some(parent) = self.stack.last() else {
                return;
            };
            let next_index = entry.child_index + 1;
            if let Some(next) = parent.subtree.children().get(next_index) {
                self.stack.push(Entry {
                    subtree: next,
                    position: entry.position + entry.subtree.total_size(),
                    child_index: next_index,
                });
                return;
            }
        }
    }

    /// Move to the first subtree that ends after `target`, entering subtrees
    /// that straddle it as far as possible.
    fn seek(&mut self, target: usize) {
        while let Some((subtree, position)) = self.current() {
            let end = (position + subtree.total_size()).bytes;
            if end <= target {
                self.advance();
            } else if position.bytes >= target || !self.descend() {
                return;
            }
        }
    }
}

/// Merges touching ranges as they are appended in ascending order.
#[derive(Debug, Default)]
struct RangeList(Vec<Range>);

impl RangeList {
    fn push(&mut self, start: Length, end: Length) {
        if end.bytes <= start.bytes {
            return;
        }
        match self.0.last_mut() {
            Some(last) if last.end_byte >= start.bytes => {
                if end.bytes > last.end_byte {
                    last.end_byte = end.bytes;
                    last.end_point = end.point;
                }
            }
            _ => self
                .0
                .push(Range::new(start.bytes, end.bytes, start.point, end.point)),
        }
    }
}

/// Nodes are aligned on where their content starts, so leading whitespace
/// that an edit moved between neighbours does not count as a change.
fn compare(
    old: &Subtree,
    new: &Subtree,
    old_position: Length,
    new_position: Length,
    included_changes: &[Range],
) -> Comparison {
    let start = (old_position + old.padding()).bytes;
    if old.symbol() != new.symbol() || start != (new_position + new.padding()).bytes {
        return Comparison::Differs;
    }
    let end = start + old.size().bytes.max(new.size().bytes);
    let in_changed_ranges = included_changes
        .iter()
        .any(|r| r.start_byte < end && start < r.end_byte);

    if !in_changed_ranges {
        let same_extent = old.padding() == new.padding() && old.size() == new.size();
        if old.ptr_eq(new)
            || (same_extent && !old.has_changes())
            || (old.is_leaf() && new.is_leaf() && old.text() == new.text())
        {
            return Comparison::Matches;
        }
    }
    if old.is_leaf() || new.is_leaf() {
        Comparison::Differs
    } else {
        Comparison::MayDiffer
    }
}

pub(super) fn compute(
    old_root: &Subtree,
    new_root: &Subtree,
    old_ranges: &[Range],
    new_ranges: &[Range],
) -> Vec<Range> {
    let included_changes = range_differences(old_ranges, new_ranges);
    let mut old = Cursor::new(old_root);
    let mut new = Cursor::new(new_root);
    let mut result = RangeList::default();
    let mut position = Length::ZERO;

    while let (Some((old_subtree, old_position)), Some((new_subtree, new_position))) =
        (old.current(), new.current())
    {
        match compare(old_subtree, new_subtree, old_position, new_position, &included_changes) {
            Comparison::Matches => {
                let old_end = old_position + old_subtree.total_size();
                position = old_end.min(new_position + new_subtree.total_size());
                old.advance();
                new.advance();
            }
            Comparison::MayDiffer => {
                old.descend();
                new.descend();
            }
            Comparison::Differs => {
                let old_end = old_position + old_subtree.total_size();
                let new_end = new_position + new_subtree.total_size();
                let next_position = old_end.min(new_end);
                // Padding in front of both nodes did not change.
                let content_start =
                    (old_position + old_subtree.padding()).min(new_position + new_subtree.padding());
                let start = if content_start.bytes > position.bytes {
                    content_start
                } else {
                    position
                };
                result.push(start, next_position);
                if next_position.bytes > position.bytes {
                    position = next_position;
                }
                old.seek(position.bytes);
                new.seek(position.bytes);
            }
        }
    }

    let old_total = old_root.total_size();
    let new_total = new_root.total_size();
    let tail_end = if new_total.bytes >= old_total.bytes { new_total } else { old_total };
    if let Some((subtree, subtree_position)) = old.current().or(new.current()) {
        let content_start = subtree_position + subtree.padding();
        let start = if content_start.bytes > position.bytes {
            content_start
        } else {
            position
        };
        result.push(start, tail_end);
    }
    result.0
}
