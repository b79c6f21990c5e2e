use std::fmt::Display;
use std::rc::Rc;

use thiserror::Error;

use crate::lexer::{Position, Token, TokenKind};

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    PrematureEndOfInput { expected: Expected, position: Position },
    #[error("expected {expected}, found {}", got.kind)]
    UnexpectedToken { expected: Expected, got: Token },
    #[error("{message}")]
    InvalidToken { message: Rc<str>, position: Position },
    #[error("invalid number literal `{literal}`: {source}")]
    InvalidNumber {
        literal: Rc<str>,
        source: std::num::ParseIntError,
        position: Position,
    },
    #[error("`{target}` cannot be bound or assigned")]
    InvalidTarget { target: String, position: Position },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expected {
    Token(TokenKind),
    Identifier,
    Expression,
    Pattern,
    StatementEnd,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{}", kind),
            Expected::Identifier => write!(f, "an identifier"),
            Expected::Expression => write!(f, "an expression"),
            Expected::Pattern => write!(f, "a name or tuple pattern"),
            Expected::StatementEnd => write!(f, "end of statement"),
        }
    }
}

impl ParseError {
    pub fn unexpected_token(expected: TokenKind, got: Token) -> ParseError {
        ParseError::unexpected_other(Expected::Token(expected), got)
    }

    /// Classifies `got`: invalid tokens surface their lexer message and
    /// `Eof` becomes a premature end of input.
    pub fn unexpected_other(expected: Expected, got: Token) -> ParseError {
        match got.kind {
            TokenKind::Invalid(message) => ParseError::InvalidToken {
                message,
                position: got.start,
            },
            TokenKind::Eof => ParseError::PrematureEndOfInput {
                expected,
                position: got.start,
            },
            _ => ParseError::UnexpectedToken { expected, got },
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ParseError::PrematureEndOfInput { position, .. }
            | ParseError::InvalidToken { position, .. }
            | ParseError::InvalidNumber { position, .. }
            | ParseError::InvalidTarget { position, .. } => *position,
            ParseError::UnexpectedToken { got, .. } => got.start,
        }
    }

    /// Whether the error originates from a malformed token rather than from
    /// the token sequence.
    pub fn is_lexical(&self) -> bool {
        matches!(self, ParseError::InvalidToken { .. })
    }
}
