//! # grove-base
//!
//! Core library for incremental parsing: grammar-driven concrete syntax
//! trees that are cheap to re-derive after localized edits.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! languages → Built-in grammars (JSON, calc)
//!   ↓
//! parser    → Parser driver, ParseSession, lexing, reuse, halting, logging
//!   ↓
//! tree      → Tree, Node views, edit bookkeeping, changed ranges
//!   ↓
//! language  → Grammar trait, Language handle, symbols
//!   ↓
//! input     → Input sources and encodings
//!   ↓
//! base      → Primitives (Point, Length, Range, InputEdit)
//! ```
//!
//! ## Example
//!
//! ```
//! use grove::{InputEdit, Parser, Tree, languages};
//!
//! let mut parser = Parser::new();
//! parser.set_language(languages::json()).unwrap();
//!
//! let old_text = r#"{"a": 1, "b": [true, null]}"#;
//! let mut tree = parser.parse_string(old_text, None).unwrap();
//!
//! let new_text = r#"{"a": 10, "b": [true, null]}"#;
//! let edit = InputEdit::for_utf8_text(old_text, 6, 7, "10");
//! tree.edit(&edit);
//! let new_tree = parser.parse_string(new_text, Some(&tree)).unwrap();
//!
//! let changed = Tree::changed_ranges(&tree, &new_tree);
//! assert_eq!(changed.len(), 1);
//! assert_eq!(changed[0].start_byte, 6);
//! ```

// ============================================================================
// MODULES (dependency order: base → input → language → tree → parser → languages)
// ============================================================================

/// Foundation types: Point, Length, Range, InputEdit
pub mod base;

/// Error and Result types
pub mod error;

/// Input sources: Input trait, StrInput, FnInput, encodings
pub mod input;

/// Grammar handles and symbol metadata
pub mod language;

/// Syntax trees: Tree, Node, edit, changed ranges
pub mod tree;

/// Parser driver and the grammar-facing ParseSession
pub mod parser;

/// Built-in grammars
#[cfg(feature = "languages")]
pub mod languages;

// Re-export foundation types
pub use base::{InputEdit, Length, Point, Range, validate_ranges};
pub use error::{Error, Result};
pub use input::{FnInput, Input, InputEncoding, StrInput};
pub use language::{
    Grammar, LANGUAGE_VERSION, Language, Lexeme, MIN_COMPATIBLE_LANGUAGE_VERSION, Symbol,
    SymbolInfo, SymbolKind,
};
pub use parser::{
    CancellationFlag, Checkpoint, DotGraphSink, LogType, Logger, ParseSession, Parser,
};
pub use tree::{Children, Node, Tree};
