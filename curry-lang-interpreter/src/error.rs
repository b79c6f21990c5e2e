use std::fmt::Display;

use curry_lang_core::{LayoutError, Position, SyntaxError};
use thiserror::Error;

use crate::value::EvaluationError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    Lex,
    Indent,
    Parse,
    UnboundName,
    NotCallable,
    TypeMismatch,
    PatternMismatch,
    DivisionByZero,
    ArithmeticOverflow,
    RecursionLimit,
    Output,
}

impl ErrorKind {
    /// Whether the error is found before the program runs.
    pub fn is_static(&self) -> bool {
        matches!(self, ErrorKind::Lex | ErrorKind::Indent | ErrorKind::Parse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Lex => "lex",
            ErrorKind::Indent => "indent",
            ErrorKind::Parse => "parse",
            ErrorKind::UnboundName => "unbound-name",
            ErrorKind::NotCallable => "not-callable",
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::PatternMismatch => "pattern-mismatch",
            ErrorKind::DivisionByZero => "division-by-zero",
            ErrorKind::ArithmeticOverflow => "arithmetic-overflow",
            ErrorKind::RecursionLimit => "recursion-limit",
            ErrorKind::Output => "output",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure of `run`, classified by kind and located in the source.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("error[{kind}] {position}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Position,
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        let kind = match &err {
            SyntaxError::Layout(LayoutError::ExpectedIndentedBlock { .. })
            | SyntaxError::Layout(LayoutError::UnexpectedIndent { .. })
            | SyntaxError::Layout(LayoutError::InconsistentDedent { .. }) => ErrorKind::Indent,
            SyntaxError::Parse(err) if err.is_lexical() => ErrorKind::Lex,
            SyntaxError::Parse(_) => ErrorKind::Parse,
        };
        Error {
            kind,
            message: err.to_string(),
            position: err.position(),
        }
    }
}

impl From<EvaluationError> for Error {
    fn from(err: EvaluationError) -> Self {
        let kind = match &err {
            EvaluationError::UnboundName { .. } => ErrorKind::UnboundName,
            EvaluationError::NotCallable { .. } => ErrorKind::NotCallable,
            EvaluationError::TypeMismatch { .. } | EvaluationError::WrongArgumentCount { .. } => {
                ErrorKind::TypeMismatch
            }
            EvaluationError::PatternMismatch { .. } => ErrorKind::PatternMismatch,
            EvaluationError::DivisionByZero { .. } => ErrorKind::DivisionByZero,
            EvaluationError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            EvaluationError::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            EvaluationError::Output { .. } => ErrorKind::Output,
        };
        Error {
            kind,
            message: err.to_string(),
            position: err.position(),
        }
    }
}
