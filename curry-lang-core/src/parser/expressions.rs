use super::error::{Expected, ParseError};
use super::patterns::parse_pattern;
use super::statements::parse_statement_tail;
use crate::ast::{
    BinaryOperator, Block, Expression, ExpressionKind, Literal, TemplatePart, UnaryOperator,
};
use crate::lexer::{Position, Segment, Token, TokenKind};
use crate::parser::Parser;

#[derive(PartialOrd, PartialEq, Debug, Clone, Copy)]
pub enum Precedence {
    Lowest = 0,
    Or,
    And,
    Equals,
    LessGreater,
    Range,
    Sum,
    Product,
    Prefix,
}

pub fn precedence_of(token: &TokenKind) -> Precedence {
    match token {
        TokenKind::Or => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::Equal | TokenKind::NotEqual => Precedence::Equals,
        TokenKind::LessThan
        | TokenKind::LessEqual
        | TokenKind::GreaterThan
        | TokenKind::GreaterEqual => Precedence::LessGreater,
        TokenKind::DotDot => Precedence::Range,
        TokenKind::Plus | TokenKind::Minus | TokenKind::PlusPlus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        _ => Precedence::Lowest,
    }
}

fn binary_operator(token: &TokenKind) -> Option<BinaryOperator> {
    let operator = match token {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Asterisk => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        TokenKind::PlusPlus => BinaryOperator::Concat,
        TokenKind::Equal => BinaryOperator::Equal,
        TokenKind::NotEqual => BinaryOperator::NotEqual,
        TokenKind::LessThan => BinaryOperator::LessThan,
        TokenKind::LessEqual => BinaryOperator::LessEqual,
        TokenKind::GreaterThan => BinaryOperator::GreaterThan,
        TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        _ => return None,
    };
    Some(operator)
}

/// Tokens that can begin a juxtaposed argument. Prefix `-` and `!` are
/// excluded so `f -1` stays a subtraction.
fn starts_argument(token: &TokenKind) -> bool {
    matches!(
        token,
        TokenKind::Ident(_)
            | TokenKind::Number(_)
            | TokenKind::String(_)
            | TokenKind::Template(_)
            | TokenKind::Invalid(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::Function
            | TokenKind::If
    )
}

/// Loosest expression level: `left |> right`, left associative.
pub fn parse_expression(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut left = parse_dot_chain(parser)?;

    while let Some(pipe) = parser.next_if_kind(&TokenKind::Pipe) {
        let start = parser.iter.len();
        let right = parse_dot_chain(parser)?;
        let grouped = parser.consumed_group(start);
        left = pipe_into(left, right, grouped, pipe.start);
    }

    Ok(left)
}

/// `x |> f a` is `f x a`: the left operand becomes the first argument of the
/// right operand's call, or the only argument when it is not a call. A
/// parenthesized call is a value, so `x |> (f a)` is `(f a) x`.
fn pipe_into(left: Expression, right: Expression, grouped: bool, position: Position) -> Expression {
    match right {
        Expression {
            kind:
                ExpressionKind::Call {
                    function,
                    mut arguments,
                },
            position,
        } if !grouped => {
            arguments.insert(0, left);
            Expression::new(
                ExpressionKind::Call {
                    function,
                    arguments,
                },
                position,
            )
        }
        right => Expression::new(
            ExpressionKind::Call {
                function: Box::new(right),
                arguments: vec![left],
            },
            position,
        ),
    }
}

/// `receiver .name args .other args`, each link a call with the receiver
/// first. A binary operator may follow a finished link.
fn parse_dot_chain(parser: &mut Parser) -> Result<Expression, ParseError> {
    let mut receiver = parse_application(parser)?;

    while let Some(dot) = parser.next_if_kind(&TokenKind::Dot) {
        let (name, position) = parser.parse_ident()?;
        let mut arguments = vec![receiver];
        parse_arguments(parser, &mut arguments)?;

        let call = Expression::new(
            ExpressionKind::Call {
                function: Box::new(Expression::new(ExpressionKind::Identifier(name), position)),
                arguments,
            },
            dot.start,
        );
        receiver = parse_infix(parser, call, Precedence::Lowest)?;
    }

    Ok(receiver)
}

/// `f a b` and `f a, b`. Binds looser than binary operators, so
/// `print i % 3 == 0` prints a boolean.
pub fn parse_application(parser: &mut Parser) -> Result<Expression, ParseError> {
    let function = parse_binary(parser, Precedence::Lowest)?;

    let mut arguments = Vec::new();
    parse_arguments(parser, &mut arguments)?;
    if arguments.is_empty() {
        return Ok(function);
    }

    let position = function.position;
    Ok(Expression::new(
        ExpressionKind::Call {
            function: Box::new(function),
            arguments,
        },
        position,
    ))
}

/// Juxtaposed arguments, then comma separated ones once at least one
/// argument was juxtaposed.
fn parse_arguments(parser: &mut Parser, arguments: &mut Vec<Expression>) -> Result<(), ParseError> {
    let mut supplied = 0;
    loop {
        if parser.peek_kind().is_some_and(starts_argument) {
            arguments.push(parse_binary(parser, Precedence::Lowest)?);
        } else if supplied > 0
            && parser.comma_arguments()
            && parser.next_if_kind(&TokenKind::Comma).is_some()
        {
            arguments.push(parse_binary(parser, Precedence::Lowest)?);
        } else {
            return Ok(());
        }
        supplied += 1;
    }
}

/// Pratt loop over the binary operators.
pub fn parse_binary(parser: &mut Parser, precedence: Precedence) -> Result<Expression, ParseError> {
    let token = parser.next_token(Expected::Expression)?;
    let left = prefix_parsing(token, parser)?;

    parse_infix(parser, left, precedence)
}

fn parse_infix(
    parser: &mut Parser,
    mut left: Expression,
    precedence: Precedence,
) -> Result<Expression, ParseError> {
    loop {
        let Some(next_kind) = parser.peek_kind() else {
            break;
        };
        let next_precedence = precedence_of(next_kind);
        if precedence >= next_precedence {
            break;
        }

        let Some(operator) = parser.iter.next() else {
            break;
        };
        let right = parse_binary(parser, next_precedence)?;

        let kind = match binary_operator(&operator.kind) {
            Some(binary) => ExpressionKind::Binary(binary, Box::new(left), Box::new(right)),
            None => ExpressionKind::Range {
                low: Box::new(left),
                high: Box::new(right),
            },
        };
        left = Expression::new(kind, operator.start);
    }

    Ok(left)
}

fn prefix_operation(
    operator: UnaryOperator,
    parser: &mut Parser,
    position: Position,
) -> Result<Expression, ParseError> {
    let operand = parse_binary(parser, Precedence::Prefix)?;
    Ok(Expression::new(
        ExpressionKind::Unary(operator, Box::new(operand)),
        position,
    ))
}

/// `()` is unit, `(a)` groups, `(a, b)` and `(a,)` are tuples.
fn parse_grouped_expression(parser: &mut Parser, position: Position) -> Result<Expression, ParseError> {
    if parser.next_if_kind(&TokenKind::RParen).is_some() {
        return Ok(Expression::new(
            ExpressionKind::Literal(Literal::Unit),
            position,
        ));
    }

    let open = parser.iter.len() + 1;
    parser.with_comma_arguments(false, |parser| {
        let first = parse_expression(parser)?;
        if parser.next_if_kind(&TokenKind::RParen).is_some() {
            parser.mark_group(open);
            return Ok(first);
        }

        parser.expect_token(TokenKind::Comma)?;
        let mut elements = vec![first];
        elements.extend(parse_sequence(
            parser,
            parse_expression,
            TokenKind::Comma,
            TokenKind::RParen,
        )?);
        Ok(Expression::new(ExpressionKind::Tuple(elements), position))
    })
}

pub(crate) fn parse_sequence<T>(
    parser: &mut Parser,
    parse_element: impl Fn(&mut Parser) -> Result<T, ParseError>,
    separator: TokenKind,
    terminator: TokenKind,
) -> Result<Vec<T>, ParseError> {
    let mut elements = Vec::new();

    loop {
        if parser.next_if_kind(&terminator).is_some() {
            return Ok(elements);
        }
        elements.push(parse_element(parser)?);

        let next = parser.next_token(Expected::Token(terminator.clone()))?;
        if next.kind == separator {
            continue;
        }
        if next.kind == terminator {
            return Ok(elements);
        }
        return Err(ParseError::unexpected_token(terminator, next));
    }
}

fn parse_list_literal(parser: &mut Parser, position: Position) -> Result<Expression, ParseError> {
    let elements = parser.with_comma_arguments(false, |parser| {
        parse_sequence(
            parser,
            parse_expression,
            TokenKind::Comma,
            TokenKind::RBracket,
        )
    })?;
    Ok(Expression::new(ExpressionKind::List(elements), position))
}

fn parse_template(
    segments: Vec<Segment>,
    position: Position,
) -> Result<Expression, ParseError> {
    let mut parts = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Text(text) => parts.push(TemplatePart::Text(text)),
            Segment::Expr(tokens) => {
                let mut inner = Parser::new(tokens);
                let expression = parse_expression(&mut inner)?;
                inner.expect_token(TokenKind::Eof)?;
                parts.push(TemplatePart::Expression(expression));
            }
        }
    }
    Ok(Expression::new(
        ExpressionKind::Literal(Literal::Template(parts)),
        position,
    ))
}

/// An `if` branch: an indented block, or a single application with an
/// optional assignment tail (`then res += s`).
fn parse_branch(parser: &mut Parser) -> Result<Block, ParseError> {
    if parser.peek_is(&TokenKind::BlockStart) {
        return parser.parse_block();
    }

    let expression = parse_application(parser)?;
    let statement = parse_statement_tail(parser, expression)?;
    Ok(Block {
        statements: vec![statement],
    })
}

fn parse_if_expression(parser: &mut Parser, position: Position) -> Result<Expression, ParseError> {
    let condition = Box::new(parse_expression(parser)?);

    let token = parser.next_token(Expected::Token(TokenKind::Then))?;
    if !matches!(token.kind, TokenKind::Then | TokenKind::Colon) {
        return Err(ParseError::unexpected_token(TokenKind::Then, token));
    }

    let consequence = parse_branch(parser)?;

    let alternative = if parser.next_if_kind(&TokenKind::Else).is_some() {
        parser.next_if_kind(&TokenKind::Colon);
        parse_branch(parser)?
    } else {
        Block::default()
    };

    Ok(Expression::new(
        ExpressionKind::If {
            condition,
            consequence,
            alternative,
        },
        position,
    ))
}

/// `fn p1 p2 -> body`. A body on the same line extends as far right as
/// possible, so a trailing lambda captures the rest of its line.
fn parse_function_literal(parser: &mut Parser, position: Position) -> Result<Expression, ParseError> {
    let mut parameters = Vec::new();
    while !parser.peek_is(&TokenKind::Arrow) {
        parameters.push(parse_pattern(parser)?);
    }
    parser.expect_token(TokenKind::Arrow)?;

    let body = if parser.peek_is(&TokenKind::BlockStart) {
        parser.parse_block()?
    } else {
        let expression = parse_expression(parser)?;
        Block {
            statements: vec![parse_statement_tail(parser, expression)?],
        }
    };

    Ok(Expression::new(
        ExpressionKind::Lambda {
            parameters: parameters.into(),
            body: body.into(),
        },
        position,
    ))
}

pub fn prefix_parsing(token: Token, parser: &mut Parser) -> Result<Expression, ParseError> {
    let position = token.start;
    let literal = |literal| Ok(Expression::new(ExpressionKind::Literal(literal), position));

    match token.kind {
        TokenKind::Ident(name) => Ok(Expression::new(ExpressionKind::Identifier(name), position)),
        TokenKind::Number(val) => match val.parse() {
            Ok(number) => literal(Literal::Number(number)),
            Err(source) => Err(ParseError::InvalidNumber {
                literal: val,
                source,
                position,
            }),
        },
        TokenKind::String(val) => literal(Literal::String(val)),
        TokenKind::Template(segments) => parse_template(segments, position),
        TokenKind::True => literal(Literal::Bool(true)),
        TokenKind::False => literal(Literal::Bool(false)),
        TokenKind::Bang => prefix_operation(UnaryOperator::Not, parser, position),
        TokenKind::Minus => prefix_operation(UnaryOperator::Negate, parser, position),
        TokenKind::LParen => parse_grouped_expression(parser, position),
        TokenKind::LBracket => parse_list_literal(parser, position),
        TokenKind::If => parse_if_expression(parser, position),
        TokenKind::Function => parse_function_literal(parser, position),
        _ => Err(ParseError::unexpected_other(Expected::Expression, token)),
    }
}

