//! Read-only node views.

use std::fmt;
use std::ops;
use std::slice;

use super::Subtree;
use crate::base::{Length, Point, Range};
use crate::language::{Language, Symbol};

/// One syntax node, borrowed from its [`Tree`](super::Tree).
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    subtree: &'tree Subtree,
    /// Absolute position where the node's padding starts.
    position: Length,
    language: &'tree Language,
}

impl<'tree> Node<'tree> {
    pub(crate) fn root(subtree: &'tree Subtree, language: &'tree Language) -> Self {
        Self {
            subtree,
            position: Length::ZERO,
            language,
        }
    }

    pub fn kind(&self) -> &'tree str {
        self.language.symbol_name(self.subtree.symbol())
    }

    pub fn kind_id(&self) -> Symbol {
        self.subtree.symbol()
    }

    pub fn is_named(&self) -> bool {
        self.subtree.is_named()
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    pub fn is_error(&self) -> bool {
        self.subtree.symbol() == Symbol::ERROR
    }

    /// A zero-width placeholder for a token the grammar expected.
    pub fn is_missing(&self) -> bool {
        self.subtree.is_missing()
    }

    /// Whether this node or any descendant is an error or missing node.
    pub fn has_error(&self) -> bool {
        self.subtree.has_error()
    }

    /// Whether an edit touched this node since it was parsed.
    pub fn has_changes(&self) -> bool {
        self.subtree.has_changes()
    }

    fn start(&self) -> Length {
        self.position + self.subtree.padding()
    }

    fn end(&self) -> Length {
        self.start() + self.subtree.size()
    }

    pub fn start_byte(&self) -> usize {
        self.start().bytes
    }

    pub fn end_byte(&self) -> usize {
        self.end().bytes
    }

    pub fn byte_range(&self) -> ops::Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn start_position(&self) -> Point {
        self.start().point
    }

    pub fn end_position(&self) -> Point {
        self.end().point
    }

    pub fn range(&self) -> Range {
        let (start, end) = (self.start(), self.end());
        Range::new(start.bytes, end.bytes, start.point, end.point)
    }

    /// Token text of a leaf; `None` for inner and missing nodes.
    pub fn text(&self) -> Option<&'tree str> {
        self.subtree.text()
    }

    pub fn children(self) -> Children<'tree> {
        Children {
            inner: self.subtree.children().iter(),
            position: self.position,
            language: self.language,
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().count()
    }

    pub fn child(&self, index: usize) -> Option<Node<'tree>> {
        self.children().nth(index)
    }

    pub fn named_children(self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children().filter(Node::is_named)
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().nth(index)
    }

    /// The smallest node spanning `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node<'tree>> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                if child.start_byte() <= start && end <= child.end_byte() {
                    // Zero-width children cannot contain a non-empty range.
                    if child.end_byte() > child.start_byte() || start == end {
                        node = child;
                        continue 'descend;
                    }
                }
                if child.start_byte() > start {
                    break;
                }
            }
            return Some(node);
        }
    }

    /// S-expression of the named structure below this node.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out, true);
        out
    }

    fn write_sexp(&self, out: &mut String, is_root: bool) {
        let visible = is_root || self.is_named() || self.is_missing();
        if visible {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push('(');
            if self.is_missing() {
                out.push_str("MISSING ");
                if self.is_named() {
                    out.push_str(self.kind());
                } else {
                    out.push('"');
                    out.push_str(self.kind());
                    out.push('"');
                }
            } else {
                out.push_str(self.kind());
            }
        }
        for child in self.children() {
            child.write_sexp(out, false);
        }
        if visible {
            out.push(')');
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.subtree.ptr_eq(other.subtree) && self.position == other.position
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} {} - {}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

/// Visible children of a node, in order.
#[derive(Clone)]
pub struct Children<'tree> {
    inner: slice::Iter<'tree, Subtree>,
    position: Length,
    language: &'tree Language,
}

impl<'tree> Iterator for Children<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Node<'tree>> {
        for subtree in self.inner.by_ref() {
            let position = self.position;
            self.position += subtree.total_size();
            if subtree.is_visible() {
                return Some(Node {
                    subtree,
                    position,
                    language: self.language,
                });
            }
        }
        None
    }
}
