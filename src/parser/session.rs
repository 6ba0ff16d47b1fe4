//! The grammar-facing side of a parse.
//!
//! A [`ParseSession`] hands tokens to a [`Grammar`](crate::Grammar), lexing
//! each one when a rule first looks at it, and collects the nodes the rules
//! build. The API follows the usual
//! recursive-descent shape: inspect with [`current`](ParseSession::current) /
//! [`at`](ParseSession::at), consume with [`bump`](ParseSession::bump) /
//! [`expect`](ParseSession::expect), and bracket nodes with
//! [`start_node`](ParseSession::start_node) /
//! [`finish_node`](ParseSession::finish_node).
//!
//! Extras (comments) never reach the grammar. They are attached to the node
//! that is open when the next token is consumed.

use tracing::warn;

use super::dot::DotGraphSink;
use super::halt::Halt;
use super::lexer::{Lexer, Token};
use super::logger::{LogSink, LogType};
use super::reuse::{HaltedWork, ReuseSources};
use crate::base::Length;
use crate::language::{Language, Symbol};
use crate::tree::Subtree;

/// An open node.
#[derive(Debug)]
struct Frame {
    symbol: Symbol,
    children: Vec<Subtree>,
    /// Absolute position where the node's padding begins.
    position: Length,
    reusable: bool,
}

/// A position inside the current node, for wrapping already-built children
/// into a new node (e.g. the left operand of a binary expression).
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    depth: usize,
    child_count: usize,
    position: Length,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ParseStats {
    pub(crate) lexed: usize,
    pub(crate) shifted: usize,
    pub(crate) reused_nodes: usize,
}

pub(crate) enum Outcome {
    Complete { root: Subtree, stats: ParseStats },
    /// The parse halted. Carries the reusable nodes finished so far and the
    /// tokens lexed so far.
    Halted { work: HaltedWork },
}

pub struct ParseSession<'a> {
    language: &'a Language,
    lexer: Lexer<'a>,
    /// Tokens lexed so far, in document order. Ends with END once the
    /// lexer reaches it.
    tokens: Vec<Token>,
    /// Next unconsumed token. Extras between here and the current token are pending.
    pos: usize,
    /// Furthest byte any rule has looked at.
    examined_end: usize,
    frames: Vec<Frame>,
    consumed_end: Length,
    reuse: ReuseSources<'a>,
    halt: Halt<'a>,
    log: LogSink<'a>,
    dot: Option<&'a DotGraphSink>,
    completed: Vec<(usize, Subtree)>,
    stats: ParseStats,
}

impl<'a> ParseSession<'a> {
    pub(crate) fn new(
        language: &'a Language,
        lexer: Lexer<'a>,
        reuse: ReuseSources<'a>,
        halt: Halt<'a>,
        log: LogSink<'a>,
        dot: Option<&'a DotGraphSink>,
    ) -> Self {
        let root = Frame {
            symbol: language.grammar().root_symbol(),
            children: Vec::new(),
            position: Length::ZERO,
            reusable: false,
        };
        Self {
            language,
            lexer,
            tokens: Vec::new(),
            pos: 0,
            examined_end: 0,
            frames: vec![root],
            consumed_end: Length::ZERO,
            reuse,
            halt,
            log,
            dot,
            completed: Vec::new(),
            stats: ParseStats::default(),
        }
    }

    pub fn language(&self) -> &Language {
        self.language
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    /// Lex until `tokens[index]` exists. False once END was lexed before
    /// reaching it, or when the parse halts.
    fn lex_through(&mut self, index: usize) -> bool {
        while self.tokens.len() <= index {
            let position = match self.tokens.last() {
                Some(last) if last.symbol == Symbol::END => return false,
                Some(last) => last.end(),
                None => Length::ZERO,
            };
            let Some(token) = self.lex(position) else {
                return false;
            };
            self.tokens.push(token);
        }
        true
    }

    fn lex(&mut self, position: Length) -> Option<Token> {
        let was_halted = self.halt.is_halted();
        let token = self.lexer.next_token(position, &mut self.halt, &mut self.log);
        match token {
            Some(_) => self.stats.lexed += 1,
            None if !was_halted => self.log_halt(),
            None => {}
        }
        token
    }

    /// Index of the `n`th non-extra token from `pos`, stopping at END.
    fn token_index(&mut self, n: usize) -> usize {
        let mut remaining = n;
        let mut index = self.pos;
        while self.lex_through(index) {
            let token = &self.tokens[index];
            if token.symbol == Symbol::END {
                break;
            }
            if !token.extra {
                if remaining == 0 {
                    break;
                }
                remaining -= 1;
            }
            index += 1;
        }
        index.min(self.tokens.len().saturating_sub(1))
    }

    /// Look at `tokens[index]`, recording how far rules have read.
    fn examine(&mut self, index: usize) -> Option<&Token> {
        if self.halt.is_halted() {
            return None;
        }
        let token = self.tokens.get(index)?;
        self.examined_end = self.examined_end.max(token.end().bytes);
        Some(token)
    }

    /// Kind of the `n`th upcoming token. END once the input, or the time
    /// budget, runs out.
    pub fn nth(&mut self, n: usize) -> Symbol {
        if self.halt.is_halted() {
            return Symbol::END;
        }
        let index = self.token_index(n);
        self.examine(index).map_or(Symbol::END, |t| t.symbol)
    }

    pub fn current(&mut self) -> Symbol {
        self.nth(0)
    }

    pub fn current_text(&mut self) -> &str {
        if self.halt.is_halted() {
            return "";
        }
        let index = self.token_index(0);
        self.examine(index).map_or("", |t| t.text.as_str())
    }

    pub fn at(&mut self, kind: Symbol) -> bool {
        self.current() == kind
    }

    pub fn at_any(&mut self, kinds: &[Symbol]) -> bool {
        kinds.contains(&self.current())
    }

    pub fn at_end(&mut self) -> bool {
        self.at(Symbol::END)
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    /// Consume the current token into the open node. No-op at the end.
    pub fn bump(&mut self) {
        if self.halt.is_halted() {
            return;
        }
        let index = self.token_index(0);
        let Some(symbol) = self.examine(index).map(|t| t.symbol) else {
            return;
        };
        if symbol == Symbol::END {
            return;
        }
        self.flush_extras(index);
        self.push_token(index);
        self.stats.shifted += 1;
        self.log.log(
            LogType::Parse,
            format_args!("shift sym:{}", self.language.symbol_name(symbol)),
        );
        self.after_action();
    }

    pub fn eat(&mut self, kind: Symbol) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `kind`, or record a zero-width MISSING `kind` leaf in its place.
    pub fn expect(&mut self, kind: Symbol) -> bool {
        if self.eat(kind) {
            return true;
        }
        if !self.halt.is_halted() {
            let missing = Subtree::missing(kind, self.language.symbol_info(kind));
            self.push(missing);
            self.log.log(
                LogType::Parse,
                format_args!("insert_missing sym:{}", self.language.symbol_name(kind)),
            );
        }
        false
    }

    /// Turn `tokens[index]` into a leaf of the open node and move past it.
    fn push_token(&mut self, index: usize) {
        let Some(token) = self.tokens.get(index) else {
            return;
        };
        let leaf = Subtree::leaf(
            token.symbol,
            self.language.symbol_info(token.symbol),
            token.padding,
            token.size,
            token.text.clone(),
        );
        self.consumed_end = token.end();
        self.push(leaf);
        self.pos = index + 1;
    }

    /// Attach pending extras before `until` to the open node.
    fn flush_extras(&mut self, until: usize) {
        while self.pos < until {
            let Some(symbol) = self.tokens.get(self.pos).map(|t| t.symbol) else {
                break;
            };
            self.push_token(self.pos);
            self.log.log(
                LogType::Parse,
                format_args!("shift_extra sym:{}", self.language.symbol_name(symbol)),
            );
        }
    }

    fn push(&mut self, subtree: Subtree) {
        if let Some(frame) = self.frames.last_mut() {
            frame.children.push(subtree);
        }
    }

    // =========================================================================
    // Node building
    // =========================================================================

    pub fn start_node(&mut self, kind: Symbol) {
        let index = self.token_index(0);
        self.flush_extras(index);
        self.frames.push(Frame {
            symbol: kind,
            children: Vec::new(),
            position: self.consumed_end,
            reusable: false,
        });
    }

    pub fn finish_node(&mut self) {
        if self.frames.len() <= 1 {
            warn!("finish_node called without a matching start_node");
            return;
        }
        let Some(frame) = self.frames.pop() else { return };
        let info = self.language.symbol_info(frame.symbol);
        let child_count = frame.children.len();
        let node = Subtree::node(frame.symbol, info, frame.children, 0, frame.reusable);

        let node_end = (frame.position + node.total_size()).bytes;
        let node = node.with_lookahead(self.examined_end.saturating_sub(node_end));

        if frame.reusable && !self.halt.is_halted() {
            let start = (frame.position + node.padding()).bytes;
            self.completed.push((start, node.clone()));
        }
        self.log.log(
            LogType::Parse,
            format_args!("reduce sym:{}, child_count:{child_count}", info.name),
        );
        self.push(node);
        self.after_action();
    }

    /// Remember the current position so a node can later be opened around
    /// everything built from here on.
    pub fn checkpoint(&mut self) -> Checkpoint {
        let index = self.token_index(0);
        self.flush_extras(index);
        Checkpoint {
            depth: self.frames.len(),
            child_count: self.frames.last().map_or(0, |f| f.children.len()),
            position: self.consumed_end,
        }
    }

    /// Open a `kind` node that adopts the children built since `checkpoint`.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: Symbol) {
        if checkpoint.depth != self.frames.len() {
            warn!(
                depth = self.frames.len(),
                checkpoint_depth = checkpoint.depth,
                "checkpoint used outside the node it was taken in"
            );
            self.start_node(kind);
            return;
        }
        let children = match self.frames.last_mut() {
            Some(frame) => {
                let at = checkpoint.child_count.min(frame.children.len());
                frame.children.split_off(at)
            }
            None => Vec::new(),
        };
        self.frames.push(Frame {
            symbol: kind,
            children,
            position: checkpoint.position,
            reusable: false,
        });
    }

    /// Build a `kind` node around whatever `f` consumes.
    pub fn node<R>(&mut self, kind: Symbol, f: impl FnOnce(&mut Self) -> R) -> R {
        self.start_node(kind);
        let result = f(self);
        self.finish_node();
        result
    }

    /// Like [`node`](Self::node), but on a re-parse an unchanged `kind` node
    /// from the previous tree is spliced in without running `f`.
    ///
    /// `f` must build the node from the tokens it reads alone, independent of
    /// the rules that called it.
    pub fn reusable(&mut self, kind: Symbol, f: impl FnOnce(&mut Self)) {
        if !self.halt.is_halted() && !self.reuse.is_empty() && self.try_reuse(kind) {
            return;
        }
        self.start_node(kind);
        if let Some(frame) = self.frames.last_mut() {
            frame.reusable = true;
        }
        f(self);
        self.finish_node();
    }

    fn try_reuse(&mut self, kind: Symbol) -> bool {
        let index = self.token_index(0);
        if self.halt.is_halted() {
            return false;
        }
        let Some(token) = self.tokens.get(index).filter(|t| t.symbol != Symbol::END).cloned() else {
            return false;
        };
        let Some(candidate) = self.reuse.find(&token, kind) else {
            return false;
        };

        // Re-lex what the node's rule looked at past its end. The node only
        // stands if that text still lexes the way it did.
        let subtree = candidate.subtree.with_padding(token.padding);
        let end = token.start() + subtree.size();
        let limit = end.bytes + subtree.lookahead_bytes();
        let mut following = Vec::new();
        let mut next = end;
        loop {
            let Some(lexed) = self.lex(next) else {
                return false;
            };
            let done = lexed.symbol == Symbol::END || lexed.start().bytes > limit;
            next = lexed.end();
            following.push(lexed);
            if done {
                break;
            }
        }
        let examined = following
            .iter()
            .take_while(|t| t.start().bytes <= limit)
            .collect::<Vec<_>>();
        let unchanged = examined.len() == candidate.lookahead.len()
            && examined
                .iter()
                .zip(&candidate.lookahead)
                .all(|(token, leaf)| leaf.matches(token));
        if !unchanged {
            self.log.log(
                LogType::Parse,
                format_args!(
                    "cant_reuse_node sym:{}, start:{}, reason:lookahead",
                    self.language.symbol_name(kind),
                    token.start().bytes
                ),
            );
            return false;
        }
        let examined_end = examined.last().map_or(end.bytes, |t| t.end().bytes);

        self.flush_extras(index);
        self.tokens.truncate(index);
        self.tokens.extend(following);
        self.pos = index;
        self.examined_end = self.examined_end.max(examined_end).max(end.bytes);

        let start = self.consumed_end + subtree.padding();
        self.consumed_end += subtree.total_size();
        self.stats.reused_nodes += 1;
        self.log.log(
            LogType::Parse,
            format_args!(
                "reuse_node sym:{}, start:{}, size:{}",
                self.language.symbol_name(kind),
                start.bytes,
                subtree.size().bytes
            ),
        );
        self.completed.push((start.bytes, subtree.clone()));
        self.push(subtree);
        self.after_action();
        true
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    /// Wrap the current token in an ERROR node.
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.log
            .log(LogType::Parse, format_args!("error {}", message.as_ref()));
        if self.at_end() {
            return;
        }
        self.start_node(Symbol::ERROR);
        self.bump();
        self.finish_node();
    }

    /// Wrap tokens in an ERROR node up to the next token in `recovery`.
    /// Always consumes at least one token unless at the end.
    pub fn error_recover(&mut self, message: impl AsRef<str>, recovery: &[Symbol]) {
        self.log
            .log(LogType::Parse, format_args!("error {}", message.as_ref()));
        if self.at_end() {
            return;
        }
        self.start_node(Symbol::ERROR);
        self.bump();
        while !self.at_end() && !self.at_any(recovery) {
            self.bump();
        }
        self.finish_node();
    }

    // =========================================================================
    // Engine side
    // =========================================================================

    fn after_action(&mut self) {
        if let Some(dot) = self.dot {
            let index = self.token_index(0);
            let lookahead = self.tokens.get(index).map_or(Symbol::END, |t| t.symbol);
            dot.write_stack(
                self.language,
                self.frames.iter().map(|f| (f.symbol, f.children.as_slice())),
                lookahead,
            );
        }
        let was_halted = self.halt.is_halted();
        if self.halt.tick() && !was_halted {
            self.log_halt();
        }
    }

    fn log_halt(&mut self) {
        if let Some(reason) = self.halt.reason() {
            self.log
                .log(LogType::Parse, format_args!("halt {}", reason.as_str()));
            tracing::debug!(reason = reason.as_str(), "parse halted");
        }
    }

    /// Close the root node once the grammar returns.
    pub(crate) fn finish(mut self) -> Outcome {
        if !self.halt.is_halted() {
            if self.frames.len() > 1 {
                warn!(open = self.frames.len() - 1, "grammar left nodes open");
                while self.frames.len() > 1 {
                    self.finish_node();
                }
            }
            if !self.at_end() {
                self.start_node(Symbol::ERROR);
                while !self.at_end() {
                    self.bump();
                }
                self.finish_node();
            }
        }
        let end = self.token_index(0);
        if self.halt.is_halted() {
            return self.halted();
        }
        self.flush_extras(end);
        self.push_token(end);

        let Some(root) = self.frames.pop() else {
            return self.halted();
        };
        let info = self.language.symbol_info(root.symbol);
        Outcome::Complete {
            root: Subtree::root(root.symbol, info, root.children),
            stats: self.stats,
        }
    }

    fn halted(self) -> Outcome {
        Outcome::Halted {
            work: HaltedWork::new(self.completed, self.tokens),
        }
    }
}
