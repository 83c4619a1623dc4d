//! Token types produced by the lexer

use std::fmt;

use crate::ast::{BinaryOp, ComparisonOp, Function, SpecialValue};

/// A lexical token with its byte offset in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Unsigned integer or decimal literal
    Number(f64),
    /// Namespace or attribute name (may contain hyphens)
    Identifier(String),
    /// One of the recognized aggregate function names
    Function(Function),
    /// `$current` or `$base`
    Special(SpecialValue),
    /// The two-character unit `.*`
    Wildcard,
    /// `+`, `-`, `*`, `/`
    Arithmetic(BinaryOp),
    /// `>`, `<`, `>=`, `<=`, `==`, `!=`
    Comparison(ComparisonOp),
    LParen,
    RParen,
    Comma,
    Dot,
    /// End of input marker, always the last token
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Function(func) => write!(f, "function '{}'", func.as_str()),
            TokenKind::Special(special) => write!(f, "'{}'", special.as_str()),
            TokenKind::Wildcard => f.write_str("'.*'"),
            TokenKind::Arithmetic(op) => write!(f, "'{}'", op.as_str()),
            TokenKind::Comparison(op) => write!(f, "'{}'", op.as_str()),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Dot => f.write_str("'.'"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}
