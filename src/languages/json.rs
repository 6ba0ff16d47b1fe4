//! JSON grammar.

use logos::Logos;

use crate::language::{Grammar, LANGUAGE_VERSION, Lexeme, Symbol, SymbolInfo};
use crate::parser::ParseSession;

pub(crate) mod sym {
    use crate::language::Symbol;

    pub const LBRACE: Symbol = Symbol(1);
    pub const RBRACE: Symbol = Symbol(2);
    pub const LBRACK: Symbol = Symbol(3);
    pub const RBRACK: Symbol = Symbol(4);
    pub const COLON: Symbol = Symbol(5);
    pub const COMMA: Symbol = Symbol(6);
    pub const STRING: Symbol = Symbol(7);
    pub const NUMBER: Symbol = Symbol(8);
    pub const TRUE: Symbol = Symbol(9);
    pub const FALSE: Symbol = Symbol(10);
    pub const NULL: Symbol = Symbol(11);
    pub const WHITESPACE: Symbol = Symbol(12);
    pub const COMMENT: Symbol = Symbol(13);
    pub const DOCUMENT: Symbol = Symbol(14);
    pub const OBJECT: Symbol = Symbol(15);
    pub const PAIR: Symbol = Symbol(16);
    pub const ARRAY: Symbol = Symbol(17);
}

use sym::*;

static SYMBOLS: [SymbolInfo; 18] = [
    SymbolInfo::token("end", false),
    SymbolInfo::token("{", false),
    SymbolInfo::token("}", false),
    SymbolInfo::token("[", false),
    SymbolInfo::token("]", false),
    SymbolInfo::token(":", false),
    SymbolInfo::token(",", false),
    SymbolInfo::token("string", true),
    SymbolInfo::token("number", true),
    SymbolInfo::token("true", true),
    SymbolInfo::token("false", true),
    SymbolInfo::token("null", true),
    SymbolInfo::skip("whitespace"),
    SymbolInfo::extra("comment"),
    SymbolInfo::node("document"),
    SymbolInfo::node("object"),
    SymbolInfo::node("pair"),
    SymbolInfo::node("array"),
];

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum JsonToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    Comment,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
}

impl From<JsonToken> for Symbol {
    fn from(token: JsonToken) -> Self {
        match token {
            JsonToken::Whitespace => WHITESPACE,
            JsonToken::Comment => COMMENT,
            JsonToken::LBrace => LBRACE,
            JsonToken::RBrace => RBRACE,
            JsonToken::LBrack => LBRACK,
            JsonToken::RBrack => RBRACK,
            JsonToken::Colon => COLON,
            JsonToken::Comma => COMMA,
            JsonToken::String => STRING,
            JsonToken::Number => NUMBER,
            JsonToken::True => TRUE,
            JsonToken::False => FALSE,
            JsonToken::Null => NULL,
        }
    }
}

const VALUE_FIRST: &[Symbol] = &[LBRACE, LBRACK, STRING, NUMBER, TRUE, FALSE, NULL];

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonGrammar;

impl Grammar for JsonGrammar {
    fn name(&self) -> &str {
        "json"
    }

    fn version(&self) -> u32 {
        LANGUAGE_VERSION
    }

    fn symbols(&self) -> &[SymbolInfo] {
        &SYMBOLS
    }

    fn root_symbol(&self) -> Symbol {
        DOCUMENT
    }

    fn lex(&self, text: &str) -> Option<Lexeme> {
        let mut lexer = JsonToken::lexer(text);
        let token = lexer.next()?.ok()?;
        Some(Lexeme {
            symbol: token.into(),
            len: lexer.span().end,
        })
    }

    fn parse(&self, p: &mut ParseSession<'_>) {
        while !p.at_end() {
            if p.at_any(VALUE_FIRST) {
                value(p);
            } else {
                p.error_recover("expected a value", VALUE_FIRST);
            }
        }
    }
}

fn value(p: &mut ParseSession<'_>) {
    match p.current() {
        LBRACE => object(p),
        LBRACK => array(p),
        STRING | NUMBER | TRUE | FALSE | NULL => p.bump(),
        _ => p.error("expected a value"),
    }
}

fn object(p: &mut ParseSession<'_>) {
    p.reusable(OBJECT, |p| {
        p.bump();
        while !p.at_end() && !p.at(RBRACE) {
            if p.at(STRING) {
                pair(p);
            } else {
                p.error_recover("expected a key", &[COMMA, RBRACE]);
            }
            if !p.eat(COMMA) {
                break;
            }
        }
        p.expect(RBRACE);
    });
}

fn pair(p: &mut ParseSession<'_>) {
    p.reusable(PAIR, |p| {
        p.bump();
        p.expect(COLON);
        if p.at_any(VALUE_FIRST) {
            value(p);
        } else {
            p.expect(NULL);
        }
    });
}

fn array(p: &mut ParseSession<'_>) {
    p.reusable(ARRAY, |p| {
        p.bump();
        while !p.at_end() && !p.at(RBRACK) {
            if p.at_any(VALUE_FIRST) {
                value(p);
            } else {
                p.error_recover("expected a value", &[COMMA, RBRACK]);
            }
            if !p.eat(COMMA) {
                break;
            }
        }
        p.expect(RBRACK);
    });
}
