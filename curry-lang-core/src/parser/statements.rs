use super::error::ParseError;
use super::patterns::{parse_pattern, pattern_from_expression};
use crate::ast::{
    AssignOperator, AssignStatement, BindKind, Block, Expression, ExpressionKind, ForStatement,
    Identifier, LetStatement, Statement, WhileStatement,
};
use crate::lexer::TokenKind;
use crate::parser::expressions::parse_expression;
use crate::parser::Parser;

pub fn parse_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    match parser.peek_kind() {
        Some(TokenKind::For) => Ok(Statement::For(parse_for_statement(parser)?)),
        Some(TokenKind::While) => Ok(Statement::While(parse_while_statement(parser)?)),
        _ => {
            let expression = parse_expression(parser)?;
            parse_statement_tail(parser, expression)
        }
    }
}

/// Completes a statement whose leading expression is already parsed: a
/// binding, a compound assignment, or the bare expression.
pub fn parse_statement_tail(
    parser: &mut Parser,
    expression: Expression,
) -> Result<Statement, ParseError> {
    let Some(kind) = parser.peek_kind() else {
        return Ok(Statement::Expression(expression));
    };

    match kind {
        TokenKind::Declare | TokenKind::Assign => {
            let kind = if *kind == TokenKind::Declare {
                BindKind::Declare
            } else {
                BindKind::Equals
            };
            let position = parser.position();
            parser.iter.next();

            let pattern = pattern_from_expression(expression)?;
            let value = parse_expression(parser)?;
            Ok(Statement::Let(LetStatement {
                pattern,
                value,
                kind,
                position,
            }))
        }
        TokenKind::PlusAssign | TokenKind::AppendAssign => {
            let operator = if *kind == TokenKind::PlusAssign {
                AssignOperator::Concat
            } else {
                AssignOperator::Append
            };
            let position = parser.position();
            parser.iter.next();

            let target = match expression.kind {
                ExpressionKind::Identifier(name) => Identifier {
                    name,
                    position: expression.position,
                },
                kind => {
                    return Err(ParseError::InvalidTarget {
                        target: Expression::new(kind, expression.position).to_string(),
                        position: expression.position,
                    })
                }
            };
            let value = parse_expression(parser)?;
            Ok(Statement::Assign(AssignStatement {
                target,
                operator,
                value,
                position,
            }))
        }
        _ => Ok(Statement::Expression(expression)),
    }
}

/// The body after `:` in `for` and `while`: a block or a single statement.
fn parse_loop_body(parser: &mut Parser) -> Result<Block, ParseError> {
    parser.expect_token(TokenKind::Colon)?;
    if parser.peek_is(&TokenKind::BlockStart) {
        return parser.parse_block();
    }
    Ok(Block {
        statements: vec![parse_statement(parser)?],
    })
}

fn parse_for_statement(parser: &mut Parser) -> Result<ForStatement, ParseError> {
    let position = parser.expect_token(TokenKind::For)?.start;
    let pattern = parse_pattern(parser)?;
    parser.expect_token(TokenKind::LeftArrow)?;
    let iterable = parse_expression(parser)?;
    let body = parse_loop_body(parser)?;

    Ok(ForStatement {
        pattern,
        iterable,
        body,
        position,
    })
}

fn parse_while_statement(parser: &mut Parser) -> Result<WhileStatement, ParseError> {
    let position = parser.expect_token(TokenKind::While)?.start;
    let condition = parse_expression(parser)?;
    let body = parse_loop_body(parser)?;

    Ok(WhileStatement {
        condition,
        body,
        position,
    })
}
