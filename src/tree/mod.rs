//! Syntax trees
//!
//! A [`Tree`] is a cheap handle on shared, immutable subtree storage.
//! Copies share storage; [`Tree::edit`] copies only the subtrees on the
//! edited path, so other copies never observe the edit.

mod changed_ranges;
mod dot;
mod node;
mod subtree;


use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::trace;

use crate::base::{InputEdit, Range};
use crate::error::Result;
use crate::language::Language;

pub use node::{Children, Node};

pub(crate) use dot::{create_graph_file, escape};
pub(crate) use subtree::Subtree;

/// The result of one parse.
#[derive(Clone)]
pub struct Tree {
    root: Subtree,
    language: Language,
    included_ranges: Vec<Range>,
}

impl Tree {
    pub(crate) fn new(root: Subtree, language: Language, included_ranges: Vec<Range>) -> Self {
        Self {
            root,
            language,
            included_ranges,
        }
    }

    pub(crate) fn root(&self) -> &Subtree {
        &self.root
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::root(&self.root, &self.language)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Ranges this tree was parsed from, moved through any later edits.
    pub fn included_ranges(&self) -> &[Range] {
        &self.included_ranges
    }

    /// An independent handle sharing this tree's storage.
    pub fn copy(&self) -> Tree {
        self.clone()
    }

    /// Release this handle. Copies stay valid.
    pub fn dispose(self) {
        drop(self);
    }

    /// Record that the document changed, ahead of passing this tree back to
    /// [`Parser::parse`](crate::Parser::parse).
    ///
    /// Positions after the edit shift, and every node the edit touches is
    /// marked as changed. Node contents are not re-derived.
    pub fn edit(&mut self, edit: &InputEdit) {
        trace!(
            start = edit.start_byte,
            old_end = edit.old_end_byte,
            new_end = edit.new_end_byte,
            "edit tree"
        );
        for range in &mut self.included_ranges {
            edit.edit_range(range);
        }
        self.root.edit_root(subtree::Edit {
            start: edit.start(),
            old_end: edit.old_end(),
            new_end: edit.new_end(),
        });
    }

    /// Ranges whose syntax differs between `old` (already edited) and `new`,
    /// its re-parse. Sorted and disjoint; nodes that only moved are not
    /// reported.
    pub fn changed_ranges(old: &Tree, new: &Tree) -> Vec<Range> {
        changed_ranges::compute(
            &old.root,
            &new.root,
            &old.included_ranges,
            &new.included_ranges,
        )
    }

    /// Write this tree as a Graphviz graph to `path`, creating or truncating it.
    pub fn print_dot_graph(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = create_graph_file(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_dot_graph(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_dot_graph<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        dot::write_tree_graph(writer, &self.root, &self.language)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {}}}", self.root_node().to_sexp())
    }
}
