//! Expression lexer using nom
//!
//! Token grammar:
//! ```text
//! number     := digit+ ('.' digit+)?
//! identifier := (alpha | '_') (alnum | '-' | '_')*
//! function   := 'avg' | 'max' | 'min' | 'sum' | 'count' | 'clamp'
//! special    := '$current' | '$base'
//! wildcard   := '.*'
//! arith      := '+' | '-' | '*' | '/'
//! compare    := '>=' | '<=' | '==' | '!=' | '>' | '<'
//! punct      := '(' | ')' | ',' | '.'
//! ```
//!
//! Whitespace between tokens is discarded. The stream always ends with
//! [`TokenKind::Eof`].

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{map, opt, recognize, value},
    sequence::{pair, preceded},
    IResult,
};

use crate::ast::{BinaryOp, ComparisonOp, Function, SpecialValue};
use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// A recognized piece of input, before classification
#[derive(Debug, Clone)]
enum Lexeme<'a> {
    Number(&'a str),
    Word(&'a str),
    Special(&'a str),
    Fixed(TokenKind),
}

/// Split expression text into tokens
///
/// Fails on the first character that starts no valid token; no partial
/// stream is returned.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut rest = skip_whitespace(input);

    while !rest.is_empty() {
        let offset = input.len() - rest.len();
        let (remaining, lexeme) = match lexeme(rest) {
            Ok(parsed) => parsed,
            Err(_) => {
                let character = rest.chars().next().unwrap_or_default();
                return Err(LexError::UnexpectedCharacter { character, offset });
            }
        };

        tokens.push(Token::new(classify(lexeme, offset)?, offset));
        rest = skip_whitespace(remaining);
    }

    tokens.push(Token::new(TokenKind::Eof, input.len()));
    Ok(tokens)
}

fn classify(lexeme: Lexeme<'_>, offset: usize) -> Result<TokenKind, LexError> {
    match lexeme {
        Lexeme::Number(text) => text
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| LexError::InvalidNumber {
                text: text.to_string(),
                offset,
            }),
        Lexeme::Word(word) => Ok(match Function::from_name(word) {
            Some(function) => TokenKind::Function(function),
            None => TokenKind::Identifier(word.to_string()),
        }),
        Lexeme::Special(name) => SpecialValue::from_name(name)
            .map(TokenKind::Special)
            .ok_or_else(|| LexError::UnknownSpecial {
                name: name.to_string(),
                offset,
            }),
        Lexeme::Fixed(kind) => Ok(kind),
    }
}

fn skip_whitespace(input: &str) -> &str {
    match multispace0::<&str, nom::error::Error<&str>>(input) {
        Ok((rest, _)) => rest,
        Err(_) => input,
    }
}

/// Parse a single token
fn lexeme(input: &str) -> IResult<&str, Lexeme<'_>> {
    alt((
        map(number, Lexeme::Number),
        map(word, Lexeme::Word),
        map(special, Lexeme::Special),
        map(comparison_op, |op| Lexeme::Fixed(TokenKind::Comparison(op))),
        map(arithmetic_op, |op| Lexeme::Fixed(TokenKind::Arithmetic(op))),
        map(punctuation, Lexeme::Fixed),
    ))(input)
}

/// Parse an unsigned integer or decimal
fn number(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)
}

/// Parse an identifier (letters, digits, hyphens, underscores; no leading digit or hyphen)
fn word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '-' || c == '_'),
    ))(input)
}

/// Parse a `$`-prefixed name; validity is checked during classification
fn special(input: &str) -> IResult<&str, &str> {
    preceded(
        char('$'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    )(input)
}

/// Parse a comparison operator, two-character forms first
fn comparison_op(input: &str) -> IResult<&str, ComparisonOp> {
    alt((
        value(ComparisonOp::Ge, tag(">=")),
        value(ComparisonOp::Le, tag("<=")),
        value(ComparisonOp::Eq, tag("==")),
        value(ComparisonOp::Ne, tag("!=")),
        value(ComparisonOp::Gt, tag(">")),
        value(ComparisonOp::Lt, tag("<")),
    ))(input)
}

fn arithmetic_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        value(BinaryOp::Add, char('+')),
        value(BinaryOp::Sub, char('-')),
        value(BinaryOp::Mul, char('*')),
        value(BinaryOp::Div, char('/')),
    ))(input)
}

/// Parse punctuation; `.*` is matched before a bare `.`
fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Wildcard, tag(".*")),
        value(TokenKind::Dot, char('.')),
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::Comma, char(',')),
    ))(input)
}
