//! Shared subtree storage.
//!
//! Subtrees are immutable once built and shared through `Arc`, so copying a
//! tree or splicing an old subtree into a new parse is a pointer copy. Each
//! subtree stores its `padding` (text before it, e.g. whitespace) and `size`
//! relative to the end of its previous sibling; absolute positions only
//! exist while walking down from the root. `edit` copies on write along the
//! edited path and leaves every other subtree shared.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::base::Length;
use crate::language::{Symbol, SymbolInfo, SymbolKind};

#[derive(Clone)]
pub(crate) struct Subtree(Arc<SubtreeData>);

#[derive(Clone)]
pub(crate) struct SubtreeData {
    symbol: Symbol,
    padding: Length,
    size: Length,
    /// Bytes past the end that were examined while building this subtree.
    lookahead_bytes: usize,
    named: bool,
    visible: bool,
    extra: bool,
    missing: bool,
    has_error: bool,
    has_changes: bool,
    /// Built by a rule that may be spliced in again without re-running it.
    reusable: bool,
    /// Token text; `None` for inner nodes and missing leaves.
    text: Option<SmolStr>,
    children: Vec<Subtree>,
}

/// An edit expressed relative to the start of a subtree's padding.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Edit {
    pub(crate) start: Length,
    pub(crate) old_end: Length,
    pub(crate) new_end: Length,
}

impl Subtree {
    pub(crate) fn leaf(symbol: Symbol, info: &SymbolInfo, padding: Length, size: Length, text: SmolStr) -> Self {
        Self(Arc::new(SubtreeData {
            symbol,
            padding,
            size,
            lookahead_bytes: 0,
            named: info.named,
            visible: symbol != Symbol::END,
            extra: info.kind == SymbolKind::Extra,
            missing: false,
            has_error: symbol == Symbol::ERROR,
            has_changes: false,
            reusable: false,
            text: Some(text),
            children: Vec::new(),
        }))
    }

    /// Zero-width placeholder for a token the grammar expected but did not find.
    pub(crate) fn missing(symbol: Symbol, info: &SymbolInfo) -> Self {
        Self(Arc::new(SubtreeData {
            symbol,
            padding: Length::ZERO,
            size: Length::ZERO,
            lookahead_bytes: 0,
            named: info.named,
            visible: true,
            extra: false,
            missing: true,
            has_error: true,
            has_changes: false,
            reusable: false,
            text: None,
            children: Vec::new(),
        }))
    }

    pub(crate) fn node(
        symbol: Symbol,
        info: &SymbolInfo,
        children: Vec<Subtree>,
        lookahead_bytes: usize,
        reusable: bool,
    ) -> Self {
        let padding = children.first().map_or(Length::ZERO, Subtree::padding);
        let total = children
            .iter()
            .fold(Length::ZERO, |total, child| total + child.total_size());
        let has_error = symbol == Symbol::ERROR || children.iter().any(Subtree::has_error);
        Self(Arc::new(SubtreeData {
            symbol,
            padding,
            size: total - padding,
            lookahead_bytes,
            named: info.named,
            visible: true,
            extra: false,
            missing: false,
            has_error,
            has_changes: false,
            reusable,
            text: None,
            children,
        }))
    }

    /// The document node: starts at zero and owns all padding, including the
    /// text before its first token.
    pub(crate) fn root(symbol: Symbol, info: &SymbolInfo, children: Vec<Subtree>) -> Self {
        let mut root = Self::node(symbol, info, children, 0, false);
        let data = Arc::make_mut(&mut root.0);
        data.size = data.padding + data.size;
        data.padding = Length::ZERO;
        root
    }

    pub(crate) fn with_lookahead(mut self, lookahead_bytes: usize) -> Self {
        Arc::make_mut(&mut self.0).lookahead_bytes = lookahead_bytes;
        self
    }

    /// The same subtree behind different leading whitespace.
    pub(crate) fn with_padding(&self, padding: Length) -> Self {
        let mut subtree = self.clone();
        if subtree.padding() != padding {
            let data = Arc::make_mut(&mut subtree.0);
            data.padding = padding;
            if let Some(first) = data.children.first_mut() {
                *first = first.with_padding(padding);
            }
        }
        subtree
    }

    pub(crate) fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    pub(crate) fn padding(&self) -> Length {
        self.0.padding
    }

    pub(crate) fn size(&self) -> Length {
        self.0.size
    }

    pub(crate) fn total_size(&self) -> Length {
        self.0.padding + self.0.size
    }

    pub(crate) fn lookahead_bytes(&self) -> usize {
        self.0.lookahead_bytes
    }

    pub(crate) fn is_named(&self) -> bool {
        self.0.named
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.0.visible
    }

    pub(crate) fn is_extra(&self) -> bool {
        self.0.extra
    }

    pub(crate) fn is_missing(&self) -> bool {
        self.0.missing
    }

    pub(crate) fn has_error(&self) -> bool {
        self.0.has_error
    }

    pub(crate) fn has_changes(&self) -> bool {
        self.0.has_changes
    }

    pub(crate) fn is_reusable(&self) -> bool {
        self.0.reusable
    }

    pub(crate) fn text(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    pub(crate) fn children(&self) -> &[Subtree] {
        &self.0.children
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.0.children.is_empty()
    }

    pub(crate) fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Record a text edit: resize and shift the subtrees it touches and mark
    /// them changed. Untouched subtrees stay shared with other trees.
    pub(crate) fn edit(&mut self, edit: Edit) {
        let is_noop = edit.old_end.bytes == edit.start.bytes && edit.new_end.bytes == edit.start.bytes;
        let is_pure_insertion = edit.old_end.bytes == edit.start.bytes;

        let mut padding = self.padding();
        let mut size = self.size();
        let total_size = padding + size;
        let end_byte = total_size.bytes + self.lookahead_bytes();
        if edit.start.bytes > end_byte || (is_noop && edit.start.bytes == end_byte) {
            return;
        }

        if edit.old_end.bytes <= padding.bytes {
            // Entirely before the content: shift without resizing.
            padding = edit.new_end + (padding - edit.old_end);
        } else if edit.start.bytes < padding.bytes {
            // Starts in the padding and eats into the content.
            size = size.saturating_sub(edit.old_end - padding);
            padding = edit.new_end;
        } else if edit.start.bytes < total_size.bytes
            || (edit.start.bytes == total_size.bytes && is_pure_insertion)
        {
            size = (edit.new_end - padding) + total_size.saturating_sub(edit.old_end);
        }

        let data = Arc::make_mut(&mut self.0);
        data.padding = padding;
        data.size = size;
        data.has_changes = true;

        let mut edit = edit;
        let mut child_right = Length::ZERO;
        for (index, child) in data.children.iter_mut().enumerate() {
            let child_size = child.total_size();
            let child_left = child_right;
            child_right = child_left + child_size;

            if child_right.bytes + child.lookahead_bytes() < edit.start.bytes {
                continue;
            }
            if child_left.bytes > edit.old_end.bytes
                || (child_left.bytes == edit.old_end.bytes && child_size.bytes > 0 && index > 0)
            {
                break;
            }

            let mut child_edit = Edit {
                start: edit.start.saturating_sub(child_left),
                old_end: edit.old_end.saturating_sub(child_left),
                new_end: edit.new_end.saturating_sub(child_left),
            };

            // Inserted text belongs to the first child touching the edit;
            // later children only shrink.
            if child_right.bytes > edit.start.bytes
                || (child_right.bytes == edit.start.bytes && is_pure_insertion)
            {
                edit.new_end = edit.start;
            } else {
                child_edit.old_end = child_edit.start;
                child_edit.new_end = child_edit.start;
            }

            child.edit(child_edit);
        }
    }
}

impl Subtree {
    /// Edit a root subtree, keeping its start pinned at zero.
    pub(crate) fn edit_root(&mut self, edit: Edit) {
        self.edit(edit);
        if self.padding() != Length::ZERO {
            let data = Arc::make_mut(&mut self.0);
            data.size = data.padding + data.size;
            data.padding = Length::ZERO;
        }
    }
}

impl fmt::Debug for Subtree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Subtree");
        s.field("symbol", &self.symbol())
            .field("padding", &self.padding().bytes)
            .field("size", &self.size().bytes);
        if let Some(text) = self.text() {
            s.field("text", &text);
        }
        if !self.is_leaf() {
            s.field("children", &self.children());
        }
        s.finish()
    }
}
