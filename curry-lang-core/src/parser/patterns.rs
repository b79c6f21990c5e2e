use super::error::{Expected, ParseError};
use super::expressions::parse_sequence;
use crate::ast::{Expression, ExpressionKind, Identifier, Pattern};
use crate::lexer::TokenKind;
use crate::parser::Parser;

/// A binding pattern in parameter or `for` position: `name` or `(p, q)`.
pub fn parse_pattern(parser: &mut Parser) -> Result<Pattern, ParseError> {
    let token = parser.next_token(Expected::Pattern)?;
    match token.kind {
        TokenKind::Ident(name) => Ok(Pattern::Name(Identifier {
            name,
            position: token.start,
        })),
        TokenKind::LParen => {
            let mut elements = parse_sequence(
                parser,
                parse_pattern,
                TokenKind::Comma,
                TokenKind::RParen,
            )?;
            match elements.len() {
                0 => Err(ParseError::InvalidTarget {
                    target: "()".to_owned(),
                    position: token.start,
                }),
                // `(x)` only groups
                1 => Ok(elements.remove(0)),
                _ => Ok(Pattern::Tuple(elements)),
            }
        }
        _ => Err(ParseError::unexpected_other(Expected::Pattern, token)),
    }
}

/// Reinterprets the already parsed left side of `:=` or `=` as a pattern.
pub fn pattern_from_expression(expression: Expression) -> Result<Pattern, ParseError> {
    match expression.kind {
        ExpressionKind::Identifier(name) => Ok(Pattern::Name(Identifier {
            name,
            position: expression.position,
        })),
        ExpressionKind::Tuple(elements) => {
            let patterns = elements
                .into_iter()
                .map(pattern_from_expression)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Pattern::Tuple(patterns))
        }
        kind => Err(ParseError::InvalidTarget {
            target: Expression::new(kind, expression.position).to_string(),
            position: expression.position,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_pattern;
    use crate::ast::Pattern;
    use crate::layout::normalize;
    use crate::lexer::tokenize;
    use crate::parser::{ParseError, Parser};

    fn pattern(input: &str) -> Result<Pattern, ParseError> {
        let tokens = normalize(tokenize(input)).unwrap();
        parse_pattern(&mut Parser::new(tokens))
    }

    #[test]
    fn test_patterns() {
        let tests = vec![
            ("x", "x"),
            ("(m, s)", "(m, s)"),
            ("((a, b), c)", "((a, b), c)"),
            ("(x)", "x"),
        ];

        for (input, expected) in tests {
            assert_eq!(pattern(input).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            pattern("()"),
            Err(ParseError::InvalidTarget { .. })
        ));
        assert!(matches!(
            pattern("1"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }
}
