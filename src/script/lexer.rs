//! Lambda lexer: tokenizes closure source text for either dialect.

use super::Dialect;
use crate::{Error, Result};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Function, Var, Let, Const, Def,
    Return, If, Else,
    True, False, Null,

    // Literals
    Integer, Float, StringLiteral,

    Identifier,

    // Punctuation
    LParen, RParen, LBracket, RBracket, LBrace, RBrace,
    Dot, Comma, Colon, Semicolon, Question,
    SafeDot,    // ?.
    Arrow,      // ->
    FatArrow,   // =>

    // Operators
    Assign,     // =
    Eq,         // ==
    StrictEq,   // ===
    Neq,        // !=
    StrictNeq,  // !==
    Lt, Lte, Gt, Gte,
    Plus, Minus, Star, Slash, Percent,
    Bang, AndAnd, OrOr,

    Eof,
}

/// Tokenize lambda source text. Keywords depend on the dialect.
pub fn tokenize(input: &str, dialect: Dialect) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => { chars.next(); }

            // Skip block comments /* ... */
            '/' if matches!(chars.clone().nth(1), Some((_, '*'))) => {
                let comment_start = pos;
                chars.next();
                chars.next();
                loop {
                    match chars.next() {
                        Some((_, '*')) => {
                            if matches!(chars.peek(), Some(&(_, '/'))) {
                                chars.next();
                                break;
                            }
                        }
                        Some(_) => {}
                        None => {
                            return Err(Error::SyntaxError {
                                position: comment_start,
                                message: "Unterminated block comment".into(),
                            });
                        }
                    }
                }
            }

            // Skip line comments
            '/' if matches!(chars.clone().nth(1), Some((_, '/'))) => {
                while chars.peek().is_some_and(|&(_, c)| c != '\n') {
                    chars.next();
                }
            }

            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let start = pos;
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\\')) => {
                            if let Some((_, escaped)) = chars.next() {
                                match escaped {
                                    'n' => s.push('\n'),
                                    't' => s.push('\t'),
                                    'r' => s.push('\r'),
                                    '\\' => s.push('\\'),
                                    '\'' | '"' => s.push(escaped),
                                    c => { s.push('\\'); s.push(c); }
                                }
                            }
                        }
                        Some((end, c)) if c == quote => {
                            tokens.push(Token {
                                kind: TokenKind::StringLiteral,
                                span: Span { start, end: end + 1 },
                                text: s,
                            });
                            break;
                        }
                        Some((_, c)) => s.push(c),
                        None => return Err(Error::SyntaxError {
                            position: start,
                            message: "Unterminated string literal".into(),
                        }),
                    }
                }
            }

            c if c.is_ascii_digit() => {
                let start = pos;
                let mut num = String::new();
                let mut is_float = false;
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        num.push(c);
                        chars.next();
                    } else if c == '.'
                        && !is_float
                        && matches!(chars.clone().nth(1), Some((_, d)) if d.is_ascii_digit())
                    {
                        // `1.5` is a float, `1.toString()` is a call
                        is_float = true;
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: if is_float { TokenKind::Float } else { TokenKind::Integer },
                    span: Span { start, end: start + num.len() },
                    text: num,
                });
            }

            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = pos;
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '$' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let kind = keyword_or_ident(&ident, dialect);
                tokens.push(Token {
                    kind,
                    span: Span { start, end: start + ident.len() },
                    text: ident,
                });
            }

            '(' => { chars.next(); tokens.push(punct(TokenKind::LParen, pos, "(")); }
            ')' => { chars.next(); tokens.push(punct(TokenKind::RParen, pos, ")")); }
            '[' => { chars.next(); tokens.push(punct(TokenKind::LBracket, pos, "[")); }
            ']' => { chars.next(); tokens.push(punct(TokenKind::RBracket, pos, "]")); }
            '{' => { chars.next(); tokens.push(punct(TokenKind::LBrace, pos, "{")); }
            '}' => { chars.next(); tokens.push(punct(TokenKind::RBrace, pos, "}")); }
            ',' => { chars.next(); tokens.push(punct(TokenKind::Comma, pos, ",")); }
            ':' => { chars.next(); tokens.push(punct(TokenKind::Colon, pos, ":")); }
            ';' => { chars.next(); tokens.push(punct(TokenKind::Semicolon, pos, ";")); }
            '.' => { chars.next(); tokens.push(punct(TokenKind::Dot, pos, ".")); }
            '*' => { chars.next(); tokens.push(punct(TokenKind::Star, pos, "*")); }
            '/' => { chars.next(); tokens.push(punct(TokenKind::Slash, pos, "/")); }
            '%' => { chars.next(); tokens.push(punct(TokenKind::Percent, pos, "%")); }
            '+' => { chars.next(); tokens.push(punct(TokenKind::Plus, pos, "+")); }
            '?' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '.'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::SafeDot, pos, "?."));
                } else {
                    tokens.push(punct(TokenKind::Question, pos, "?"));
                }
            }
            '-' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '>'))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Arrow, pos, "->"));
                } else {
                    tokens.push(punct(TokenKind::Minus, pos, "-"));
                }
            }
            '=' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '>')) => {
                        chars.next();
                        tokens.push(punct(TokenKind::FatArrow, pos, "=>"));
                    }
                    Some(&(_, '=')) => {
                        chars.next();
                        if matches!(chars.peek(), Some(&(_, '='))) {
                            chars.next();
                            tokens.push(punct(TokenKind::StrictEq, pos, "==="));
                        } else {
                            tokens.push(punct(TokenKind::Eq, pos, "=="));
                        }
                    }
                    _ => tokens.push(punct(TokenKind::Assign, pos, "=")),
                }
            }
            '!' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    if matches!(chars.peek(), Some(&(_, '='))) {
                        chars.next();
                        tokens.push(punct(TokenKind::StrictNeq, pos, "!=="));
                    } else {
                        tokens.push(punct(TokenKind::Neq, pos, "!="));
                    }
                } else {
                    tokens.push(punct(TokenKind::Bang, pos, "!"));
                }
            }
            '<' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Lte, pos, "<="));
                } else {
                    tokens.push(punct(TokenKind::Lt, pos, "<"));
                }
            }
            '>' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '='))) {
                    chars.next();
                    tokens.push(punct(TokenKind::Gte, pos, ">="));
                } else {
                    tokens.push(punct(TokenKind::Gt, pos, ">"));
                }
            }
            '&' if matches!(chars.clone().nth(1), Some((_, '&'))) => {
                chars.next();
                chars.next();
                tokens.push(punct(TokenKind::AndAnd, pos, "&&"));
            }
            '|' if matches!(chars.clone().nth(1), Some((_, '|'))) => {
                chars.next();
                chars.next();
                tokens.push(punct(TokenKind::OrOr, pos, "||"));
            }

            other => {
                return Err(Error::SyntaxError {
                    position: pos,
                    message: format!("Unexpected character: '{other}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len(), end: input.len() },
        text: String::new(),
    });

    Ok(tokens)
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span { start: pos, end: pos + text.len() },
        text: text.to_string(),
    }
}

/// Keywords are case-sensitive in both dialects.
fn keyword_or_ident(s: &str, dialect: Dialect) -> TokenKind {
    match (s, dialect) {
        ("return", _) => TokenKind::Return,
        ("if", _) => TokenKind::If,
        ("else", _) => TokenKind::Else,
        ("true", _) => TokenKind::True,
        ("false", _) => TokenKind::False,
        ("null", _) => TokenKind::Null,
        ("undefined", Dialect::Caller) => TokenKind::Null,
        ("function", Dialect::Caller) => TokenKind::Function,
        ("var", Dialect::Caller) => TokenKind::Var,
        ("let", Dialect::Caller) => TokenKind::Let,
        ("const", Dialect::Caller) => TokenKind::Const,
        ("def", Dialect::Embedded) => TokenKind::Def,
        _ => TokenKind::Identifier,
    }
}
