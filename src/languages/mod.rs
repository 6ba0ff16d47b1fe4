//! Built-in grammars
//!
//! Small hand-written grammars driving the engine end to end. Each function
//! returns the same shared [`Language`] on every call, so trees produced from
//! different calls can be fed back into one another.

mod calc;
mod json;


use std::sync::LazyLock;

use crate::language::Language;

pub use calc::CalcGrammar;
pub use json::JsonGrammar;

static JSON: LazyLock<Language> = LazyLock::new(|| Language::new(JsonGrammar));
static CALC: LazyLock<Language> = LazyLock::new(|| Language::new(CalcGrammar));

/// JSON, with `//` line comments allowed anywhere.
pub fn json() -> Language {
    JSON.clone()
}

/// A small expression language: `let` bindings, blocks, calls and the four
/// arithmetic operators.
pub fn calc() -> Language {
    CALC.clone()
}
