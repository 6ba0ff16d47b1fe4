//! Incremental parser driver
//!
//! ## Architecture
//!
//! ```text
//! Input (+ included ranges)
//!     ↓ chunks, read on demand
//! Source: a window of decoded text in the caller's byte space
//!     ↓
//! Lexer (Grammar::lex) → one Token at a time, with padding/size Lengths
//!     ↓
//! ParseSession (Grammar::parse) → Subtree, splicing reusable old nodes
//!     ↓
//! Tree
//! ```
//!
//! ## Incremental Reparsing
//!
//! The caller edits the old tree ([`Tree::edit`]) and passes it back in. We:
//! 1. Re-run the grammar, lexing only when a rule looks at the next token
//! 2. Walk the old tree alongside, and when a rule asks for a reusable node,
//!    offer the unchanged old node starting at the current token
//! 3. Re-lex the node's recorded lookahead, splice the node in if it still
//!    lexes the same, and continue lexing after it
//!
//! Text inside spliced nodes is never read or lexed again.

mod dot;
mod halt;
mod lexer;
mod logger;
mod reuse;
mod session;
mod source;


use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::base::{Range, validate_ranges};
use crate::error::{Error, Result};
use crate::input::{Input, InputEncoding, StrInput};
use crate::language::Language;
use crate::tree::Tree;

pub use dot::DotGraphSink;
pub use halt::CancellationFlag;
pub use logger::{LogType, Logger};
pub use session::{Checkpoint, ParseSession};

use lexer::Lexer;
use logger::LogSink;
use reuse::{HaltedWork, ReuseSources};
use session::Outcome;
use source::Source;

/// Nodes finished by a parse that halted, offered to the next parse.
#[derive(Debug)]
struct Resumption {
    language: Language,
    work: HaltedWork,
}

/// Stateful parse driver.
///
/// A parser starts with no language; [`parse`](Parser::parse) returns `None`
/// until [`set_language`](Parser::set_language) succeeds. One parser runs one
/// parse at a time.
#[derive(Default)]
pub struct Parser {
    language: Option<Language>,
    included_ranges: Vec<Range>,
    timeout_micros: u64,
    cancellation_flag: Option<CancellationFlag>,
    cancellation_token: Option<CancellationToken>,
    logger: Option<Logger>,
    dot_graph: Option<DotGraphSink>,
    resumption: Option<Resumption>,
    /// Set by `reset`: ignore the next old tree.
    force_fresh: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Install a grammar. An incompatible version leaves the parser unchanged.
    pub fn set_language(&mut self, language: Language) -> Result<()> {
        if !language.is_compatible() {
            return Err(Error::IncompatibleLanguage {
                version: language.version(),
            });
        }
        debug!(language = language.name(), "language set");
        self.language = Some(language);
        Ok(())
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Restrict parsing to `ranges`. An empty slice means the whole document.
    pub fn set_included_ranges(&mut self, ranges: &[Range]) -> Result<()> {
        validate_ranges(ranges)?;
        self.included_ranges = ranges.to_vec();
        Ok(())
    }

    /// The configured ranges, or one range covering everything when unset.
    pub fn included_ranges(&self) -> &[Range] {
        if self.included_ranges.is_empty() {
            std::slice::from_ref(&Range::ALL)
        } else {
            &self.included_ranges
        }
    }

    /// Wall-clock budget per parse; 0 disables it.
    pub fn set_timeout_micros(&mut self, timeout_micros: u64) {
        self.timeout_micros = timeout_micros;
    }

    pub fn timeout_micros(&self) -> u64 {
        self.timeout_micros
    }

    /// Install a fresh cancellation cell holding `value` and return a handle
    /// to it. Setting the handle to a non-zero value, from any thread,
    /// cancels the running parse.
    pub fn set_cancellation_flag(&mut self, value: usize) -> CancellationFlag {
        let flag = CancellationFlag::new(value);
        self.cancellation_flag = Some(flag.clone());
        flag
    }

    /// Current value of the cancellation cell; 0 when none is installed.
    pub fn cancellation_flag(&self) -> usize {
        self.cancellation_flag.as_ref().map_or(0, CancellationFlag::get)
    }

    pub fn cancellation_flag_handle(&self) -> Option<&CancellationFlag> {
        self.cancellation_flag.as_ref()
    }

    /// Also halt when `token` is cancelled.
    pub fn set_cancellation_token(&mut self, token: Option<CancellationToken>) {
        self.cancellation_token = token;
    }

    pub fn set_logger(&mut self, logger: Option<Logger>) {
        self.logger = logger;
    }

    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref()
    }

    /// Write a graph of the parse stack after every parse action, or stop
    /// doing so with `None`.
    pub fn print_dot_graphs(&mut self, sink: Option<DotGraphSink>) {
        self.dot_graph = sink;
    }

    /// Forget resumable work so the next parse starts from scratch, even if
    /// it is handed an old tree. Needed before parsing a different document
    /// after a halted parse.
    pub fn reset(&mut self) {
        self.resumption = None;
        self.force_fresh = true;
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    pub fn parse_string(&mut self, text: &str, old_tree: Option<&Tree>) -> Option<Tree> {
        self.parse(&mut StrInput::new(text), old_tree)
    }

    pub fn parse_string_with_encoding(
        &mut self,
        bytes: &[u8],
        old_tree: Option<&Tree>,
        encoding: InputEncoding,
    ) -> Option<Tree> {
        self.parse(&mut StrInput::with_encoding(bytes, encoding), old_tree)
    }

    /// Parse `input`, reusing unchanged parts of `old_tree` (which must
    /// already reflect every edit through [`Tree::edit`]).
    ///
    /// Returns `None` when no language is set, or when the parse is
    /// cancelled or runs out of time. The old tree is never modified.
    ///
    /// After a halted parse, the next call resumes from the nodes already
    /// finished and assumes it is given the same text. Call
    /// [`reset`](Self::reset) before parsing a different document.
    pub fn parse(&mut self, input: &mut dyn Input, old_tree: Option<&Tree>) -> Option<Tree> {
        let Some(language) = self.language.clone() else {
            warn!("parse called without a language");
            return None;
        };
        let ranges = self.included_ranges().to_vec();

        let mut halt = halt::Halt::new(
            self.cancellation_flag.as_ref(),
            self.cancellation_token.as_ref(),
            self.timeout_micros,
        );
        let mut log = LogSink::new(self.logger.as_mut());
        if halt.check() {
            if let Some(reason) = halt.reason() {
                log.log(LogType::Parse, format_args!("halt {}", reason.as_str()));
                debug!(reason = reason.as_str(), "parse halted before start");
            }
            return None;
        }
        log.log(
            LogType::Parse,
            format_args!("new_parse language:{}, ranges:{}", language.name(), ranges.len()),
        );

        let resumption = self.resumption.take();
        let (old_root, halted_work) = if std::mem::take(&mut self.force_fresh) {
            debug!("ignoring previous work after reset");
            (None, None)
        } else {
            let old_root = match old_tree {
                Some(old) if old.language() == &language => Some(old.root()),
                Some(old) => {
                    debug!(old = old.language().name(), new = language.name(), "old tree ignored: different language");
                    None
                }
                None => None,
            };
            let halted_work = resumption
                .as_ref()
                .filter(|r| r.language == language)
                .map(|r| &r.work);
            (old_root, halted_work)
        };

        let lexer = Lexer::new(&language, Source::new(input, &ranges));
        let reuse = ReuseSources::new(old_root, halted_work);
        let mut session = ParseSession::new(&language, lexer, reuse, halt, log, self.dot_graph.as_ref());
        language.grammar().parse(&mut session);

        match session.finish() {
            Outcome::Complete { root, stats } => {
                debug!(
                    language = language.name(),
                    lexed = stats.lexed,
                    shifted = stats.shifted,
                    reused_nodes = stats.reused_nodes,
                    "parse complete"
                );
                Some(Tree::new(root, language, ranges))
            }
            Outcome::Halted { work } => {
                debug!(completed = work.node_count(), "keeping finished nodes for the next parse");
                self.resumption = Some(Resumption { language, work });
                None
            }
        }
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .field("included_ranges", &self.included_ranges)
            .field("timeout_micros", &self.timeout_micros)
            .field("cancellation_flag", &self.cancellation_flag())
            .field("has_logger", &self.logger.is_some())
            .field("resumable", &self.resumption.is_some())
            .finish()
    }
}
