//! On-demand token production.
//!
//! The parse session asks for one token at a time, starting from the end of
//! the previous one, so lexing follows the parser and skips whatever text a
//! reused subtree covers. Skipped symbols (whitespace) and the gaps between
//! included ranges fold into the padding of the next token, so every token
//! records where it sits in the caller's byte space. Text the grammar cannot
//! lex becomes one-character ERROR tokens.

use smol_str::SmolStr;
use text_size::TextSize;

use super::halt::Halt;
use super::logger::{LogSink, LogType};
use super::source::Source;
use crate::base::Length;
use crate::language::{Language, Lexeme, Symbol, SymbolKind};

/// Decoded bytes requested before the first lexing attempt at a position.
const LEX_AHEAD: usize = 256;

/// Bytes that must follow a lexeme before it is trusted not to extend into
/// text not yet read.
const PEEK_MARGIN: usize = 16;

/// Bytes that must follow a position before the grammar's refusal to lex it
/// is trusted.
const ERROR_MARGIN: usize = 64 * 1024;

/// One lexed token, positioned absolutely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) symbol: Symbol,
    pub(crate) extra: bool,
    /// Where the padding begins: the end of the previous token.
    pub(crate) position: Length,
    pub(crate) padding: Length,
    pub(crate) size: Length,
    pub(crate) text: SmolStr,
}

impl Token {
    /// Absolute start of the token text.
    pub(crate) fn start(&self) -> Length {
        self.position + self.padding
    }

    pub(crate) fn end(&self) -> Length {
        self.start() + self.size
    }
}

pub(crate) struct Lexer<'a> {
    language: &'a Language,
    source: Source<'a>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(language: &'a Language, source: Source<'a>) -> Self {
        Self { language, source }
    }

    /// Lex the next token whose padding begins at `position`. Past the last
    /// included text this is a zero-width END token carrying the trailing
    /// padding.
    ///
    /// Returns `None` when the halt conditions trip.
    pub(crate) fn next_token(
        &mut self,
        position: Length,
        halt: &mut Halt<'_>,
        log: &mut LogSink<'_>,
    ) -> Option<Token> {
        let mut here = position;
        loop {
            if halt.tick() {
                return None;
            }
            let Some(at) = self.source.next_text(here, halt).ok()? else {
                break;
            };
            let Some((symbol, text)) = self.lex_at(at, halt, log)? else {
                break;
            };

            let len = TextSize::of(text.as_str());
            let extent = self.source.extent(at.bytes, len);
            let info = self.language.symbol_info(symbol);
            if info.kind == SymbolKind::Skip {
                log.log(
                    LogType::Lex,
                    format_args!("skip sym:{}, size:{}", info.name, extent.bytes),
                );
                here = at + extent;
                continue;
            }

            log.log(
                LogType::Lex,
                format_args!("lexed_lookahead sym:{}, size:{}", info.name, extent.bytes),
            );
            return Some(Token {
                symbol,
                extra: info.kind == SymbolKind::Extra,
                position,
                padding: at - position,
                size: extent,
                text,
            });
        }

        log.log(LogType::Lex, format_args!("lexed_lookahead sym:end, size:0"));
        Some(Token {
            symbol: Symbol::END,
            extra: false,
            position,
            padding: here - position,
            size: Length::ZERO,
            text: SmolStr::default(),
        })
    }

    /// Lex the text at `at`, widening the window until the result cannot
    /// depend on text not yet read. The inner `None` means no text is left.
    fn lex_at(
        &mut self,
        at: Length,
        halt: &mut Halt<'_>,
        log: &mut LogSink<'_>,
    ) -> Option<Option<(Symbol, SmolStr)>> {
        let language = self.language;
        let grammar = language.grammar();
        let mut want = LEX_AHEAD;
        loop {
            let (rest, complete) = self.source.text_at(at, want, halt).ok()?;
            if rest.is_empty() {
                return Some(None);
            }
            let lexeme = grammar.lex(rest).filter(|lexeme| is_valid(rest, lexeme));
            let settled = complete
                || match &lexeme {
                    Some(lexeme) => rest.len() - lexeme.len >= PEEK_MARGIN,
                    None => rest.len() >= ERROR_MARGIN,
                };
            if !settled {
                want = want.max(rest.len()) * 2;
                continue;
            }

            return Some(Some(match lexeme {
                Some(lexeme) => (lexeme.symbol, SmolStr::new(&rest[..lexeme.len])),
                None => {
                    let len = rest.chars().next().map_or(1, char::len_utf8);
                    log.log(
                        LogType::Lex,
                        format_args!("skip_unrecognized_character {:?}", &rest[..len]),
                    );
                    (Symbol::ERROR, SmolStr::new(&rest[..len]))
                }
            }));
        }
    }
}

/// A lexeme must make progress and end on a character boundary.
fn is_valid(text: &str, lexeme: &Lexeme) -> bool {
    lexeme.len > 0 && lexeme.len <= text.len() && text.is_char_boundary(lexeme.len)
}
