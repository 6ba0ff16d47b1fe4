//! Grammar handles
//!
//! A [`Grammar`] is the compiled description of one language: its symbol
//! table, its lexer, and its parsing rules. The engine treats it as an opaque,
//! immutable artifact and only checks its [`version`](Grammar::version)
//! against the range this build can drive. [`Language`] is the cheap,
//! shareable handle that parsers and trees hold on to.
//!
//! This module and [`parser`](crate::parser) depend on each other: grammar
//! rules are written against [`ParseSession`], and the parser drives a
//! [`Grammar`]. The session is the only parser item used here.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::parser::ParseSession;

/// Newest grammar version this engine understands.
pub const LANGUAGE_VERSION: u32 = 14;

/// Oldest grammar version this engine still accepts.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: u32 = 13;

/// Numeric id of a node or token kind within one grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub u16);

impl Symbol {
    /// End of input. Index 0 of every symbol table.
    pub const END: Symbol = Symbol(0);
    /// Builtin kind for error nodes and unlexable text.
    pub const ERROR: Symbol = Symbol(u16::MAX);
}

/// How a symbol participates in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Built by parse rules
    Node,
    /// Leaf produced by the lexer
    Token,
    /// Lexed but never stored; becomes padding of the next token (whitespace)
    Skip,
    /// Leaf that may appear anywhere (comments)
    Extra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: &'static str,
    pub named: bool,
    pub kind: SymbolKind,
}

impl SymbolInfo {
    pub const fn node(name: &'static str) -> Self {
        Self {
            name,
            named: true,
            kind: SymbolKind::Node,
        }
    }

    pub const fn token(name: &'static str, named: bool) -> Self {
        Self {
            name,
            named,
            kind: SymbolKind::Token,
        }
    }

    pub const fn skip(name: &'static str) -> Self {
        Self {
            name,
            named: false,
            kind: SymbolKind::Skip,
        }
    }

    pub const fn extra(name: &'static str) -> Self {
        Self {
            name,
            named: true,
            kind: SymbolKind::Extra,
        }
    }
}

/// One token recognized at the start of the remaining text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub symbol: Symbol,
    /// Length in UTF-8 bytes; must be non-zero and end on a char boundary.
    pub len: usize,
}

/// A compiled grammar.
///
/// # Contract
///
/// - `symbols()[0]` describes [`Symbol::END`].
/// - `parse` is a deterministic function of the token stream it reads from the
///   session. It fills the root node; the engine opens and closes it.
/// - A rule handed to [`ParseSession::reusable`] must depend only on tokens
///   from its own start onwards: the engine splices previously built nodes in
///   its place without running it.
pub trait Grammar: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn version(&self) -> u32;

    fn symbols(&self) -> &[SymbolInfo];

    /// Kind of the node wrapping a whole document.
    fn root_symbol(&self) -> Symbol;

    /// Recognize one token at the start of `text`, or `None` if nothing matches.
    fn lex(&self, text: &str) -> Option<Lexeme>;

    fn parse(&self, p: &mut ParseSession<'_>);
}

const ERROR_INFO: SymbolInfo = SymbolInfo::node("ERROR");

/// Shared handle to a grammar.
#[derive(Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

struct LanguageInner {
    grammar: Box<dyn Grammar>,
    /// Kind name to `[anonymous, named]` ids; the first id wins on duplicates.
    kinds: FxHashMap<&'static str, [Option<Symbol>; 2]>,
}

impl Language {
    pub fn new(grammar: impl Grammar) -> Self {
        let mut kinds: FxHashMap<&'static str, [Option<Symbol>; 2]> = FxHashMap::default();
        for (id, info) in grammar.symbols().iter().enumerate() {
            let Ok(id) = u16::try_from(id) else { break };
            let slot = &mut kinds.entry(info.name).or_default()[usize::from(info.named)];
            slot.get_or_insert(Symbol(id));
        }
        Self {
            inner: Arc::new(LanguageInner {
                grammar: Box::new(grammar),
                kinds,
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.grammar.name()
    }

    pub fn version(&self) -> u32 {
        self.inner.grammar.version()
    }

    pub fn is_compatible(&self) -> bool {
        (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&self.version())
    }

    pub fn symbol_count(&self) -> usize {
        self.inner.grammar.symbols().len()
    }

    pub fn symbol_info(&self, symbol: Symbol) -> &SymbolInfo {
        if symbol == Symbol::ERROR {
            return &ERROR_INFO;
        }
        self.inner
            .grammar
            .symbols()
            .get(usize::from(symbol.0))
            .unwrap_or(&ERROR_INFO)
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.symbol_info(symbol).name
    }

    /// Look up a kind by name; `named` distinguishes `"string"` the node from
    /// `"\""` style anonymous tokens sharing a spelling.
    pub fn id_for_kind(&self, name: &str, named: bool) -> Option<Symbol> {
        if named && name == ERROR_INFO.name {
            return Some(Symbol::ERROR);
        }
        self.inner.kinds.get(name)?[usize::from(named)]
    }

    pub(crate) fn grammar(&self) -> &dyn Grammar {
        self.inner.grammar.as_ref()
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Language {}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}
