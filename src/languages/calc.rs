//! Calculator grammar: statements, blocks and precedence-climbing expressions.

use logos::Logos;

use crate::language::{Grammar, LANGUAGE_VERSION, Lexeme, Symbol, SymbolInfo};
use crate::parser::ParseSession;

pub(crate) mod sym {
    use crate::language::Symbol;

    pub const LET: Symbol = Symbol(1);
    pub const IDENT: Symbol = Symbol(2);
    pub const NUMBER: Symbol = Symbol(3);
    pub const EQ: Symbol = Symbol(4);
    pub const PLUS: Symbol = Symbol(5);
    pub const MINUS: Symbol = Symbol(6);
    pub const STAR: Symbol = Symbol(7);
    pub const SLASH: Symbol = Symbol(8);
    pub const LPAREN: Symbol = Symbol(9);
    pub const RPAREN: Symbol = Symbol(10);
    pub const LBRACE: Symbol = Symbol(11);
    pub const RBRACE: Symbol = Symbol(12);
    pub const SEMICOLON: Symbol = Symbol(13);
    pub const COMMA: Symbol = Symbol(14);
    pub const WHITESPACE: Symbol = Symbol(15);
    pub const COMMENT: Symbol = Symbol(16);
    pub const PROGRAM: Symbol = Symbol(17);
    pub const LET_STATEMENT: Symbol = Symbol(18);
    pub const EXPRESSION_STATEMENT: Symbol = Symbol(19);
    pub const BLOCK: Symbol = Symbol(20);
    pub const BINARY_EXPRESSION: Symbol = Symbol(21);
    pub const UNARY_EXPRESSION: Symbol = Symbol(22);
    pub const CALL_EXPRESSION: Symbol = Symbol(23);
    pub const ARGUMENTS: Symbol = Symbol(24);
    pub const PARENTHESIZED_EXPRESSION: Symbol = Symbol(25);
}

use sym::*;

static SYMBOLS: [SymbolInfo; 26] = [
    SymbolInfo::token("end", false),
    SymbolInfo::token("let", false),
    SymbolInfo::token("identifier", true),
    SymbolInfo::token("number", true),
    SymbolInfo::token("=", false),
    SymbolInfo::token("+", false),
    SymbolInfo::token("-", false),
    SymbolInfo::token("*", false),
    SymbolInfo::token("/", false),
    SymbolInfo::token("(", false),
    SymbolInfo::token(")", false),
    SymbolInfo::token("{", false),
    SymbolInfo::token("}", false),
    SymbolInfo::token(";", false),
    SymbolInfo::token(",", false),
    SymbolInfo::skip("whitespace"),
    SymbolInfo::extra("comment"),
    SymbolInfo::node("program"),
    SymbolInfo::node("let_statement"),
    SymbolInfo::node("expression_statement"),
    SymbolInfo::node("block"),
    SymbolInfo::node("binary_expression"),
    SymbolInfo::node("unary_expression"),
    SymbolInfo::node("call_expression"),
    SymbolInfo::node("arguments"),
    SymbolInfo::node("parenthesized_expression"),
];

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum CalcToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"#[^\n]*")]
    Comment,

    #[token("let")]
    Let,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[token("=")]
    Eq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
}

impl From<CalcToken> for Symbol {
    fn from(token: CalcToken) -> Self {
        match token {
            CalcToken::Whitespace => WHITESPACE,
            CalcToken::Comment => COMMENT,
            CalcToken::Let => LET,
            CalcToken::Ident => IDENT,
            CalcToken::Number => NUMBER,
            CalcToken::Eq => EQ,
            CalcToken::Plus => PLUS,
            CalcToken::Minus => MINUS,
            CalcToken::Star => STAR,
            CalcToken::Slash => SLASH,
            CalcToken::LParen => LPAREN,
            CalcToken::RParen => RPAREN,
            CalcToken::LBrace => LBRACE,
            CalcToken::RBrace => RBRACE,
            CalcToken::Semicolon => SEMICOLON,
            CalcToken::Comma => COMMA,
        }
    }
}

const EXPRESSION_FIRST: &[Symbol] = &[IDENT, NUMBER, MINUS, LPAREN];
const STATEMENT_RECOVERY: &[Symbol] = &[LET, LBRACE, RBRACE, IDENT, NUMBER, MINUS, LPAREN];

#[derive(Debug, Clone, Copy, Default)]
pub struct CalcGrammar;

impl Grammar for CalcGrammar {
    fn name(&self) -> &str {
        "calc"
    }

    fn version(&self) -> u32 {
        LANGUAGE_VERSION
    }

    fn symbols(&self) -> &[SymbolInfo] {
        &SYMBOLS
    }

    fn root_symbol(&self) -> Symbol {
        PROGRAM
    }

    fn lex(&self, text: &str) -> Option<Lexeme> {
        let mut lexer = CalcToken::lexer(text);
        let token = lexer.next()?.ok()?;
        Some(Lexeme {
            symbol: token.into(),
            len: lexer.span().end,
        })
    }

    fn parse(&self, p: &mut ParseSession<'_>) {
        while !p.at_end() {
            statement(p);
        }
    }
}

// =============================================================================
// Statements
// =============================================================================

fn statement(p: &mut ParseSession<'_>) {
    match p.current() {
        LET => let_statement(p),
        LBRACE => block(p),
        _ if p.at_any(EXPRESSION_FIRST) => {
            p.reusable(EXPRESSION_STATEMENT, |p| {
                expression(p);
                p.expect(SEMICOLON);
            });
        }
        _ => p.error_recover("expected a statement", STATEMENT_RECOVERY),
    }
}

fn let_statement(p: &mut ParseSession<'_>) {
    p.reusable(LET_STATEMENT, |p| {
        p.bump();
        p.expect(IDENT);
        p.expect(EQ);
        expression(p);
        p.expect(SEMICOLON);
    });
}

fn block(p: &mut ParseSession<'_>) {
    p.reusable(BLOCK, |p| {
        p.bump();
        while !p.at_end() && !p.at(RBRACE) {
            statement(p);
        }
        p.expect(RBRACE);
    });
}

// =============================================================================
// Expressions
// =============================================================================

fn expression(p: &mut ParseSession<'_>) {
    binary(p, 0);
}

fn precedence(op: Symbol) -> Option<u8> {
    match op {
        PLUS | MINUS => Some(1),
        STAR | SLASH => Some(2),
        _ => None,
    }
}

/// Precedence climbing; operators of equal precedence associate left.
fn binary(p: &mut ParseSession<'_>, min_precedence: u8) {
    let checkpoint = p.checkpoint();
    unary(p);
    while let Some(prec) = precedence(p.current()).filter(|&prec| prec >= min_precedence) {
        p.start_node_at(checkpoint, BINARY_EXPRESSION);
        p.bump();
        binary(p, prec + 1);
        p.finish_node();
    }
}

fn unary(p: &mut ParseSession<'_>) {
    if p.at(MINUS) {
        p.node(UNARY_EXPRESSION, |p| {
            p.bump();
            unary(p);
        });
    } else {
        postfix(p);
    }
}

fn postfix(p: &mut ParseSession<'_>) {
    let checkpoint = p.checkpoint();
    primary(p);
    while p.at(LPAREN) {
        p.start_node_at(checkpoint, CALL_EXPRESSION);
        arguments(p);
        p.finish_node();
    }
}

fn arguments(p: &mut ParseSession<'_>) {
    p.node(ARGUMENTS, |p| {
        p.bump();
        if !p.at(RPAREN) && p.at_any(EXPRESSION_FIRST) {
            expression(p);
            while p.eat(COMMA) {
                expression(p);
            }
        }
        p.expect(RPAREN);
    });
}

fn primary(p: &mut ParseSession<'_>) {
    match p.current() {
        IDENT | NUMBER => p.bump(),
        LPAREN => p.reusable(PARENTHESIZED_EXPRESSION, |p| {
            p.bump();
            expression(p);
            p.expect(RPAREN);
        }),
        SEMICOLON | RPAREN | RBRACE | COMMA => {
            p.expect(IDENT);
        }
        _ if p.at_end() => {
            p.expect(IDENT);
        }
        _ => p.error("expected an expression"),
    }
}
