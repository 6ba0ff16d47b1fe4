//! Candidate subtrees for incremental reuse.
//!
//! Old nodes are looked up by the byte where their text starts in the new
//! document. An (edited) old tree is walked with a [`TreeCursor`] that only
//! moves forward, in step with the parse, so looking a node up costs the
//! depth of the tree rather than its size. Nodes a halted parse managed to
//! finish are kept in [`HaltedWork`] and looked up by position.
//!
//! A node is offered only when it has no changes and its first leaf matches
//! the token at the current position. The candidate carries the old leaves
//! inside the lookahead the node recorded; the session re-lexes that region
//! and reuses the node only when both agree. Padding is not compared:
//! whitespace edits mark the following leaf as changed, and a reused node
//! takes the padding of the token it replaces.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::lexer::Token;
use crate::base::Length;
use crate::language::Symbol;
use crate::tree::Subtree;

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct OldLeaf {
    start: usize,
    symbol: Symbol,
    size: Length,
    text: SmolStr,
    changed: bool,
}

impl OldLeaf {
    fn from_token(token: &Token) -> Self {
        Self {
            start: token.start().bytes,
            symbol: token.symbol,
            size: token.size,
            text: token.text.clone(),
            changed: false,
        }
    }

    pub(crate) fn matches(&self, token: &Token) -> bool {
        !self.changed
            && self.start == token.start().bytes
            && self.symbol == token.symbol
            && self.size == token.size
            && self.text == token.text
    }
}

/// An old node that may stand in for the text at the current token.
#[derive(Debug)]
pub(crate) struct Candidate {
    pub(crate) subtree: Subtree,
    /// Old leaves starting inside the node's recorded lookahead, or right
    /// where it ends, in order.
    pub(crate) lookahead: Vec<OldLeaf>,
}

fn is_candidate(subtree: &Subtree, symbol: Symbol) -> bool {
    subtree.symbol() == symbol
        && subtree.is_reusable()
        && !subtree.has_changes()
        && subtree.size().bytes > 0
}

fn first_leaf_matches(subtree: &Subtree, token: &Token) -> bool {
    let mut leaf = subtree;
    while let Some(child) = leaf.children().first() {
        leaf = child;
    }
    !leaf.has_changes()
        && leaf.symbol() == token.symbol
        && leaf.size() == token.size
        && leaf.text() == Some(token.text.as_str())
}

/// A subtree on the cursor's path, with the position where its padding begins.
#[derive(Debug, Clone, Copy)]
struct Entry<'t> {
    subtree: &'t Subtree,
    position: Length,
}

impl Entry<'_> {
    fn start(&self) -> usize {
        (self.position + self.subtree.padding()).bytes
    }

    fn end(&self) -> usize {
        (self.position + self.subtree.total_size()).bytes
    }
}

/// Move to the subtree after the top of `path`: its next sibling, or the
/// next sibling of the nearest ancestor that has one.
fn advance(path: &mut Vec<(Entry<'_>, usize)>) {
    while let Some((entry, index)) = path.pop() {
        let Some((parent, _)) = path.last() else {
            return;
        };
        if let Some(next) = parent.subtree.children().get(index + 1) {
            let position = entry.position + entry.subtree.total_size();
            path.push((
                Entry {
                    subtree: next,
                    position,
                },
                index + 1,
            ));
            return;
        }
    }
}

/// Step into the first child of the top of `path`. False for leaves.
fn descend(path: &mut Vec<(Entry<'_>, usize)>) -> bool {
    let Some(&(top, _)) = path.last() else {
        return false;
    };
    let Some(child) = top.subtree.children().first() else {
        return false;
    };
    path.push((
        Entry {
            subtree: child,
            position: top.position,
        },
        0,
    ));
    true
}

/// A forward-only walk over an old tree, following the parse position.
#[derive(Debug)]
pub(crate) struct TreeCursor<'t> {
    /// Path from the root; each entry with its index among its siblings.
    path: Vec<(Entry<'t>, usize)>,
}

impl<'t> TreeCursor<'t> {
    pub(crate) fn new(root: &'t Subtree) -> Self {
        let entry = Entry {
            subtree: root,
            position: Length::ZERO,
        };
        Self {
            path: vec![(entry, 0)],
        }
    }

    /// Find an unchanged reusable `symbol` node whose text starts where
    /// `token` does. The cursor never moves back, so callers must ask in
    /// document order.
    pub(crate) fn find(&mut self, token: &Token, symbol: Symbol) -> Option<Candidate> {
        let start = token.start().bytes;
        self.seek(start);

        // Several nested nodes may start here; try the outermost first.
        let mut path = self.path.clone();
        loop {
            let &(entry, _) = path.last()?;
            if entry.start() != start {
                return None;
            }
            if is_candidate(entry.subtree, symbol) && first_leaf_matches(entry.subtree, token) {
                let limit = entry.end() + entry.subtree.lookahead_bytes();
                advance(&mut path);
                let lookahead = leaves_before(&mut path, limit);
                return Some(Candidate {
                    subtree: entry.subtree.clone(),
                    lookahead,
                });
            }
            if !descend(&mut path) {
                return None;
            }
        }
    }

    /// Move to the first subtree that does not start before `start`,
    /// descending into subtrees that straddle it.
    fn seek(&mut self, start: usize) {
        while let Some(&(top, _)) = self.path.last() {
            if top.start() >= start {
                return;
            }
            if top.end() <= start || !descend(&mut self.path) {
                advance(&mut self.path);
            }
        }
    }
}

/// Collect the leaves from the top of `path` onwards that start at or
/// before `limit`.
fn leaves_before(path: &mut Vec<(Entry<'_>, usize)>, limit: usize) -> Vec<OldLeaf> {
    let mut leaves = Vec::new();
    while let Some(&(top, _)) = path.last() {
        if top.start() > limit {
            break;
        }
        if descend(path) {
            continue;
        }
        // Missing leaves were never lexed.
        if let Some(text) = top.subtree.text() {
            leaves.push(OldLeaf {
                start: top.start(),
                symbol: top.subtree.symbol(),
                size: top.subtree.size(),
                text: SmolStr::new(text),
                changed: top.subtree.has_changes(),
            });
        }
        advance(path);
    }
    leaves
}

/// What a halted parse finished, for the next parse of the same text.
#[derive(Debug, Default)]
pub(crate) struct HaltedWork {
    /// Keyed by the byte where the node's text starts.
    nodes: FxHashMap<(usize, Symbol), Subtree>,
    /// Tokens the halted parse lexed, in document order.
    tokens: Vec<Token>,
}

impl HaltedWork {
    pub(crate) fn new(nodes: Vec<(usize, Subtree)>, tokens: Vec<Token>) -> Self {
        let mut map = FxHashMap::default();
        for (start, node) in nodes {
            map.entry((start, node.symbol())).or_insert(node);
        }
        Self { nodes: map, tokens }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn find(&self, token: &Token, symbol: Symbol) -> Option<Candidate> {
        let start = token.start().bytes;
        let subtree = self.nodes.get(&(start, symbol))?;
        if !is_candidate(subtree, symbol) || !first_leaf_matches(subtree, token) {
            return None;
        }
        let end = start + subtree.size().bytes;
        let limit = end + subtree.lookahead_bytes();
        let from = self.tokens.partition_point(|t| t.start().bytes < end);
        let lookahead = self.tokens[from..]
            .iter()
            .take_while(|t| t.start().bytes <= limit)
            .map(OldLeaf::from_token)
            .collect();
        Some(Candidate {
            subtree: subtree.clone(),
            lookahead,
        })
    }
}

/// Where the session looks for reusable nodes.
#[derive(Debug, Default)]
pub(crate) struct ReuseSources<'a> {
    tree: Option<TreeCursor<'a>>,
    halted: Option<&'a HaltedWork>,
}

impl<'a> ReuseSources<'a> {
    pub(crate) fn new(tree: Option<&'a Subtree>, halted: Option<&'a HaltedWork>) -> Self {
        Self {
            tree: tree.map(TreeCursor::new),
            halted: halted.filter(|work| work.node_count() > 0),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tree.is_none() && self.halted.is_none()
    }

    pub(crate) fn find(&mut self, token: &Token, symbol: Symbol) -> Option<Candidate> {
        let from_tree = self
            .tree
            .as_mut()
            .and_then(|cursor| cursor.find(token, symbol));
        from_tree.or_else(|| self.halted.and_then(|work| work.find(token, symbol)))
    }
}
