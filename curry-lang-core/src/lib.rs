pub mod ast;
pub mod layout;
pub mod lexer;
pub mod parser;

use thiserror::Error;
use tracing::debug;

pub use layout::LayoutError;
pub use lexer::Position;
pub use parser::ParseError;

/// Any error raised before evaluation starts.
#[derive(Debug, PartialEq, Clone, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    pub fn position(&self) -> Position {
        match self {
            SyntaxError::Layout(err) => err.position(),
            SyntaxError::Parse(err) => err.position(),
        }
    }
}

/// Lexes, normalizes layout and parses `source` into a program.
pub fn parse(source: &str) -> Result<ast::Program, SyntaxError> {
    let tokens = lexer::tokenize(source);
    debug!(tokens = tokens.len(), "lexed source");

    let tokens = layout::normalize(tokens)?;
    let program = parser::Parser::new(tokens).parse_program()?;
    debug!(statements = program.statements.len(), "parsed program");

    Ok(program)
}
