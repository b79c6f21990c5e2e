//! Turns indentation into explicit `BlockStart`, `BlockEnd` and
//! `StatementEnd` tokens so the parser never looks at columns.
//!
//! A line at the column of the enclosing block starts a new statement. A
//! deeper line either opens a block (when the previous line ended with `:`,
//! `->`, `then` or `else`) or continues the previous statement. A shallower
//! line closes blocks until its column matches. Inside brackets and parens
//! line breaks carry no meaning.

use thiserror::Error;
use tracing::trace;

use crate::lexer::{Position, Segment, Token, TokenKind};

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LayoutError {
    #[error("expected an indented block")]
    ExpectedIndentedBlock { position: Position },
    #[error("unexpected indentation")]
    UnexpectedIndent { position: Position },
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent { position: Position },
}

impl LayoutError {
    pub fn position(&self) -> Position {
        match self {
            LayoutError::ExpectedIndentedBlock { position }
            | LayoutError::UnexpectedIndent { position }
            | LayoutError::InconsistentDedent { position } => *position,
        }
    }
}

/// Last token before a line break opens a block.
fn opens_block(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Colon | TokenKind::Arrow | TokenKind::Then | TokenKind::Else
    )
}

/// Last token before a line break leaves the statement unfinished.
fn licenses_continuation(kind: &TokenKind) -> bool {
    kind.is_binary_operator()
        || matches!(
            kind,
            TokenKind::Pipe
                | TokenKind::Dot
                | TokenKind::Comma
                | TokenKind::Bang
                | TokenKind::Declare
                | TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::AppendAssign
                | TokenKind::LeftArrow
        )
}

/// First token of a line that attaches it to the previous statement.
/// A leading `-` is a negation, so it starts a statement.
fn continues_line(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Dot | TokenKind::Pipe | TokenKind::Then | TokenKind::Else
    ) || (kind.is_binary_operator() && *kind != TokenKind::Minus)
}

fn layout_token(kind: TokenKind, position: Position) -> Token {
    Token {
        kind,
        start: position,
        end: position,
    }
}

struct Layout {
    output: Vec<Token>,
    columns: Vec<usize>,
    depth: usize,
    last_line: usize,
    pending_block: bool,
    continues: bool,
    /// Set once an invalid token was seen. The rest of the stream is passed
    /// through untouched so the parser reports the lexical error first.
    invalid: bool,
}

impl Layout {
    fn line_start(&mut self, token: &Token) -> Result<(), LayoutError> {
        let column = token.start.column;
        let position = token.start;
        let current = self.columns.last().copied().unwrap_or(column);

        if self.pending_block {
            if column <= current {
                return Err(LayoutError::ExpectedIndentedBlock { position });
            }
            trace!(column, "opening block");
            self.columns.push(column);
            self.output.push(layout_token(TokenKind::BlockStart, position));
            return Ok(());
        }

        if column > current {
            if self.continues || continues_line(&token.kind) {
                return Ok(());
            }
            return Err(LayoutError::UnexpectedIndent { position });
        }

        while self.columns.len() > 1 && column < current_column(&self.columns) {
            self.columns.pop();
            trace!(column, "closing block");
            self.output.push(layout_token(TokenKind::BlockEnd, position));
        }

        let reference = current_column(&self.columns);
        if column == reference {
            if !(self.continues || continues_line(&token.kind)) {
                self.output
                    .push(layout_token(TokenKind::StatementEnd, position));
            }
            Ok(())
        } else if column > reference && continues_line(&token.kind) {
            Ok(())
        } else {
            Err(LayoutError::InconsistentDedent { position })
        }
    }

    fn push(&mut self, mut token: Token) -> Result<(), LayoutError> {
        if self.invalid || matches!(token.kind, TokenKind::Invalid(_)) {
            self.invalid = true;
            self.output.push(token);
            return Ok(());
        }

        if let TokenKind::Template(segments) = &mut token.kind {
            for segment in segments.iter_mut() {
                if let Segment::Expr(tokens) = segment {
                    *tokens = normalize(std::mem::take(tokens))?;
                }
            }
        }

        if self.columns.is_empty() {
            self.columns.push(token.start.column);
        } else if self.depth == 0 && token.start.line != self.last_line {
            self.line_start(&token)?;
        }

        match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => self.depth += 1,
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                self.depth = self.depth.saturating_sub(1)
            }
            _ => {}
        }

        self.last_line = token.end.line;
        self.pending_block = self.depth == 0 && opens_block(&token.kind);
        self.continues = licenses_continuation(&token.kind);

        if token.kind == TokenKind::SemiColon {
            token.kind = TokenKind::StatementEnd;
        }
        self.output.push(token);
        Ok(())
    }

    fn finish(mut self, eof: Token) -> Vec<Token> {
        while self.columns.len() > 1 {
            self.columns.pop();
            self.output
                .push(layout_token(TokenKind::BlockEnd, eof.start));
        }
        self.output.push(eof);
        self.output
    }
}

fn current_column(columns: &[usize]) -> usize {
    columns.last().copied().unwrap_or(1)
}

/// Inserts layout tokens into a token stream produced by the lexer. The
/// stream must end with `Eof`; blocks still open there are closed.
pub fn normalize(tokens: Vec<Token>) -> Result<Vec<Token>, LayoutError> {
    let mut layout = Layout {
        output: Vec::with_capacity(tokens.len() + 8),
        columns: Vec::new(),
        depth: 0,
        last_line: 0,
        pending_block: false,
        continues: false,
        invalid: false,
    };

    for token in tokens {
        if token.kind == TokenKind::Eof {
            return Ok(layout.finish(token));
        }
        layout.push(token)?;
    }

    let end = layout
        .output
        .last()
        .map(|token| token.end)
        .unwrap_or_default();
    Ok(layout.finish(layout_token(TokenKind::Eof, end)))
}
