//! Error types for persona-expr

use thiserror::Error;

use crate::token::TokenKind;

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Failure to parse expression text, from either stage of the pipeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Lexer errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter { character: char, offset: usize },

    #[error("Unknown special value '${name}' at offset {offset}")]
    UnknownSpecial { name: String, offset: usize },

    #[error("Invalid number '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
}

/// Parser errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Expected {expected} at offset {offset}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        offset: usize,
    },

    #[error("Bare identifier '{name}' at offset {offset}; references need a namespace like 'trait.{name}'")]
    BareIdentifier { name: String, offset: usize },

    #[error("Unknown function '{name}' at offset {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("Unexpected {found} after complete expression at offset {offset}")]
    TrailingInput { found: TokenKind, offset: usize },

    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Expression nested too deeply at offset {offset}")]
    TooDeep { offset: usize },
}

/// Evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Undefined reference: {namespace}.{name}")]
    UndefinedReference { namespace: String, name: String },

    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("{function} expects {expected} arguments, got {found}")]
    WrongArity {
        function: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{0} of an empty argument list")]
    EmptyArguments(&'static str),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Wildcard {0}.* is only valid as an aggregate function argument")]
    WildcardMisuse(String),

    #[error("$current is not available outside iterative computation")]
    CurrentUnavailable,
}
