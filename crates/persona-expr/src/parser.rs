//! Recursive-descent expression parser
//!
//! Grammar (lowest precedence first):
//! ```text
//! expression     := comparison
//! comparison     := additive (cmp_op additive)?
//! additive       := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/') unary)*
//! unary          := '-' unary | primary
//! primary        := number | special
//!                 | function '(' (expression (',' expression)*)? ')'
//!                 | identifier '.' (identifier | '*')
//!                 | '(' expression ')'
//! ```
//!
//! Comparisons do not chain: `a > b > c` is rejected as trailing input.
//!
//! Nesting is limited to [`MAX_DEPTH`] levels. Parentheses, function calls,
//! unary minus and every extra operand of an operator chain each count as a
//! level, which also bounds the depth of the resulting tree.

use crate::ast::{BinaryOp, Expression, Function};
use crate::error::{ExprError, ParseError};
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};

/// Deepest nesting the parser accepts
pub const MAX_DEPTH: usize = 256;

/// Lex and parse expression text
pub fn parse(input: &str) -> Result<Expression, ExprError> {
    let tokens = tokenize(input)?;
    Ok(parse_tokens(&tokens)?)
}

/// Parse a token stream produced by [`tokenize`]
///
/// The whole stream must be consumed.
pub fn parse_tokens(tokens: &[Token]) -> Result<Expression, ParseError> {
    let mut parser = Parser::new(tokens);
    let expr = parser.expression()?;

    match parser.peek() {
        None | Some(TokenKind::Eof) => Ok(expr),
        Some(found) => Err(ParseError::TrailingInput {
            found: found.clone(),
            offset: parser.offset(),
        }),
    }
}

/// Token cursor for the recursive-descent parser
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_nth(&self, n: usize) -> Option<&'a TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.offset)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.clone(),
                offset: self.offset(),
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.peek() == Some(kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Enter one nesting level; callers restore `depth` when done
    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                offset: self.offset(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.additive()?;
        if let Some(TokenKind::Comparison(op)) = self.peek() {
            self.pos += 1;
            let right = self.additive()?;
            return Ok(Expression::comparison(*op, left, right));
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let mut left = self.multiplicative()?;
        while let Some(TokenKind::Arithmetic(op @ (BinaryOp::Add | BinaryOp::Sub))) = self.peek() {
            self.descend()?;
            self.pos += 1;
            let right = self.multiplicative()?;
            left = Expression::binary(*op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expression, ParseError> {
        let depth = self.depth;
        let mut left = self.unary()?;
        while let Some(TokenKind::Arithmetic(op @ (BinaryOp::Mul | BinaryOp::Div))) = self.peek() {
            self.descend()?;
            self.pos += 1;
            let right = self.unary()?;
            left = Expression::binary(*op, left, right);
        }
        self.depth = depth;
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression, ParseError> {
        if let Some(TokenKind::Arithmetic(BinaryOp::Sub)) = self.peek() {
            self.descend()?;
            self.pos += 1;
            let operand = self.unary()?;
            self.depth -= 1;
            return Ok(Expression::negate(operand));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression, ParseError> {
        let offset = self.offset();
        match self.peek() {
            Some(TokenKind::Number(n)) => {
                self.pos += 1;
                Ok(Expression::Number(*n))
            }
            Some(TokenKind::Special(special)) => {
                self.pos += 1;
                Ok(Expression::Special(*special))
            }
            Some(TokenKind::Function(function)) => {
                self.descend()?;
                self.pos += 1;
                let call = self.call(*function)?;
                self.depth -= 1;
                Ok(call)
            }
            Some(TokenKind::Identifier(namespace)) => {
                self.pos += 1;
                self.reference(namespace, offset)
            }
            Some(TokenKind::LParen) => {
                self.descend()?;
                self.pos += 1;
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => Err(self.unexpected("a number, reference, function call or '('")),
        }
    }

    /// Parse the argument list following a function name
    fn call(&mut self, function: Function) -> Result<Expression, ParseError> {
        self.expect(&TokenKind::LParen, &format!("'(' after {}", function.as_str()))?;

        let mut args = Vec::new();
        if self.peek() == Some(&TokenKind::RParen) {
            self.pos += 1;
            return Ok(Expression::call(function, args));
        }

        loop {
            args.push(self.expression()?);
            match self.peek() {
                Some(TokenKind::Comma) => self.pos += 1,
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }

        Ok(Expression::call(function, args))
    }

    /// Parse the tail of `namespace.name` or `namespace.*`
    fn reference(&mut self, namespace: &str, offset: usize) -> Result<Expression, ParseError> {
        match self.peek() {
            Some(TokenKind::Wildcard) => {
                self.pos += 1;
                Ok(Expression::wildcard(namespace))
            }
            Some(TokenKind::Dot) => match self.peek_nth(1) {
                Some(TokenKind::Identifier(name)) => {
                    self.pos += 2;
                    Ok(Expression::reference(namespace, name.as_str()))
                }
                // attribute names may collide with function names, e.g. `skill.count`
                Some(TokenKind::Function(function)) => {
                    self.pos += 2;
                    Ok(Expression::reference(namespace, function.as_str()))
                }
                _ => {
                    self.pos += 1;
                    Err(self.unexpected(&format!("an attribute name after '{}.'", namespace)))
                }
            },
            Some(TokenKind::LParen) => Err(ParseError::UnknownFunction {
                name: namespace.to_string(),
                offset,
            }),
            _ => Err(ParseError::BareIdentifier {
                name: namespace.to_string(),
                offset,
            }),
        }
    }
}
