pub mod error;
pub mod expressions;
pub mod patterns;
pub mod statements;

use std::rc::Rc;

use crate::ast::{Block, Program, Statement};
use crate::lexer::{Position, Token, TokenKind};
pub use error::ParseError;
use statements::parse_statement;

/// Parses a layout-normalized token stream. Parsing stops at the first error.
pub struct Parser {
    pub iter: std::iter::Peekable<std::vec::IntoIter<Token>>,
    /// Whether `,` may continue the arguments of a call. Cleared inside
    /// brackets and parens, where commas separate elements.
    comma_arguments: Vec<bool>,
    /// Remaining token counts before the `(` and after the `)` of the last
    /// parenthesized expression.
    last_group: Option<(usize, usize)>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let iter = tokens.into_iter().peekable();
        Self {
            iter,
            comma_arguments: vec![true],
            last_group: None,
        }
    }

    /// Whether the tokens consumed since `start` tokens remained were exactly
    /// one parenthesized expression.
    pub(crate) fn consumed_group(&self, start: usize) -> bool {
        self.last_group == Some((start, self.iter.len()))
    }

    pub(crate) fn mark_group(&mut self, open: usize) {
        self.last_group = Some((open, self.iter.len()));
    }

    pub(crate) fn peek_kind(&mut self) -> Option<&TokenKind> {
        self.iter.peek().map(|token| &token.kind)
    }

    pub(crate) fn peek_is(&mut self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    pub(crate) fn next_if_kind(&mut self, kind: &TokenKind) -> Option<Token> {
        self.iter.next_if(|token| &token.kind == kind)
    }

    /// Position of the next token, or of the end of input.
    pub(crate) fn position(&mut self) -> Position {
        self.iter
            .peek()
            .map(|token| token.start)
            .unwrap_or_default()
    }

    pub(crate) fn next_token(&mut self, expected: error::Expected) -> Result<Token, ParseError> {
        match self.iter.next() {
            Some(token) => Ok(token),
            None => Err(ParseError::PrematureEndOfInput {
                expected,
                position: Position::default(),
            }),
        }
    }

    pub(crate) fn parse_ident(&mut self) -> Result<(Rc<str>, Position), ParseError> {
        let token = self.next_token(error::Expected::Identifier)?;
        match token {
            Token {
                kind: TokenKind::Ident(name),
                start,
                ..
            } => Ok((name, start)),
            _ => Err(ParseError::unexpected_other(
                error::Expected::Identifier,
                token,
            )),
        }
    }

    pub(crate) fn expect_token(&mut self, token_kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.next_token(error::Expected::Token(token_kind.clone()))?;
        if token.kind == token_kind {
            Ok(token)
        } else {
            Err(ParseError::unexpected_token(token_kind, token))
        }
    }

    pub(crate) fn comma_arguments(&self) -> bool {
        self.comma_arguments.last().copied().unwrap_or(true)
    }

    /// Runs `parse` with comma arguments enabled or disabled.
    pub(crate) fn with_comma_arguments<T>(
        &mut self,
        enabled: bool,
        parse: impl FnOnce(&mut Parser) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.comma_arguments.push(enabled);
        let result = parse(self);
        self.comma_arguments.pop();
        result
    }

    /// Statements separated by `StatementEnd` up to and including `terminator`.
    pub(crate) fn parse_statements(
        &mut self,
        terminator: TokenKind,
    ) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        loop {
            while self.next_if_kind(&TokenKind::StatementEnd).is_some() {}
            if self.next_if_kind(&terminator).is_some() {
                return Ok(statements);
            }

            statements.push(parse_statement(self)?);

            match self.peek_kind() {
                Some(TokenKind::StatementEnd) => {}
                Some(kind) if *kind == terminator => {}
                _ => {
                    let token = self.next_token(error::Expected::StatementEnd)?;
                    return Err(ParseError::unexpected_other(
                        error::Expected::StatementEnd,
                        token,
                    ));
                }
            }
        }
    }

    /// An indented block: `BlockStart statements BlockEnd`.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect_token(TokenKind::BlockStart)?;
        let statements =
            self.with_comma_arguments(true, |parser| parser.parse_statements(TokenKind::BlockEnd))?;
        Ok(Block { statements })
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let statements = self.parse_statements(TokenKind::Eof)?;
        Ok(Program { statements })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::error::Expected;
    use crate::parser::ParseError;
    use crate::{parse, SyntaxError};

    fn test_parsing(tests: Vec<(&str, &str)>) {
        for (input, expected) in tests {
            let program = parse(input).unwrap();

            assert_eq!(program.to_string(), expected, "input: {input:?}")
        }
    }

    #[test]
    fn test_binary_precedence() {
        let tests = vec![
            ("-a * b", "((-a) * b);\n"),
            ("!-a", "(!(-a));\n"),
            ("a + b - c", "((a + b) - c);\n"),
            ("a * b / c % d", "(((a * b) / c) % d);\n"),
            (
                "a + b * c + d / e - f",
                "(((a + (b * c)) + (d / e)) - f);\n",
            ),
            ("3 + 4; -5 * 5", "(3 + 4);\n((-5) * 5);\n"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4));\n"),
            ("a || b && c == d", "(a || (b && (c == d)));\n"),
            ("s ++ t ++ u", "((s ++ t) ++ u);\n"),
            ("1..n + 1", "(1..(n + 1));\n"),
            ("i % 3 == 0", "((i % 3) == 0);\n"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4);\n"),
            ("-(5 + 5)", "(-(5 + 5));\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_application_forms() {
        let tests = vec![
            ("f a b", "f(a, b);\n"),
            ("f a, b", "f(a, b);\n"),
            ("a .f b", "f(a, b);\n"),
            ("a .f b, c", "f(a, b, c);\n"),
            ("a |> f b", "f(a, b);\n"),
            ("a |> f", "f(a);\n"),
            ("a |> (f b)", "f(b)(a);\n"),
            ("a |> (f) b", "f(a, b);\n"),
            ("print i % 3 == 0", "print(((i % 3) == 0));\n"),
            ("f (g x) y", "f(g(x), y);\n"),
            ("xs .map f .join s", "join(map(xs, f), s);\n"),
            ("xs .len + 1", "(len(xs) + 1);\n"),
            ("f ()", "f(());\n"),
            ("f [a, b], c", "f([a, b], c);\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_commas_inside_brackets_separate_elements() {
        let tests = vec![
            ("[f a, b]", "[f(a), b];\n"),
            ("(f a, b)", "(f(a), b);\n"),
            ("(a,)", "(a,);\n"),
            ("[]", "[];\n"),
            ("(a)", "a;\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_trailing_lambda_takes_the_rest() {
        let tests = vec![
            ("xs .map fn x -> x * 2", "map(xs, fn(x) {(x * 2);});\n"),
            (
                "xs |> map fn x -> x |> print",
                "map(xs, fn(x) {print(x);});\n",
            ),
            ("fn (a, b) c -> a", "fn((a, b), c) {a;};\n"),
            ("fn -> 1", "fn() {1;};\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_statements() {
        let tests = vec![
            ("x := 1", "x := 1;\n"),
            ("x = 1", "x = 1;\n"),
            ("(a, b) := t", "(a, b) := t;\n"),
            ("s += \"x\"", "s += \"x\";\n"),
            ("xs ++= [1]", "xs ++= [1];\n"),
            ("for x <- xs: print x", "for x <- xs {print(x);};\n"),
            (
                "for (m, s) <- rules:\n    print m\n    print s",
                "for (m, s) <- rules {print(m); print(s);};\n",
            ),
            ("while i < 3: i += 1", "while (i < 3) {i += 1;};\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_conditionals() {
        let tests = vec![
            ("if x < y then x else y", "if (x < y) {x;} else {y;};\n"),
            ("if c then s += x", "if c {s += x;};\n"),
            ("if c: a", "if c {a;};\n"),
            (
                "if a then 1 else if b then 2 else 3",
                "if a {1;} else {if b {2;} else {3;};};\n",
            ),
            (
                "if c then\n    a\nelse\n    b",
                "if c {a;} else {b;};\n",
            ),
            ("f (if c then 1 else 2)", "f(if c {1;} else {2;});\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_templates() {
        let tests = vec![
            ("`{i}`", "`{i}`;\n"),
            ("`a{x + 1}b`", "`a{(x + 1)}b`;\n"),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_indented_program() {
        let input = "main := fn n ->\n    (1..n) .map fn i ->\n        i * i\n    .join \", \"\n\nmain 3 |> print";
        let expected = "main := fn(n) {join(map((1..n), fn(i) {(i * i);}), \", \");};\nprint(main(3));\n";

        test_parsing(vec![(input, expected)])
    }

    #[test]
    fn test_empty_program() {
        test_parsing(vec![("", ""), ("\n\n# only a comment\n", "")]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse("x :="),
            Err(SyntaxError::Parse(ParseError::PrematureEndOfInput {
                expected: Expected::Expression,
                ..
            }))
        ));
        assert!(matches!(
            parse("f (a"),
            Err(SyntaxError::Parse(ParseError::PrematureEndOfInput { .. }))
        ));
        assert!(matches!(
            parse("99999999999999999999"),
            Err(SyntaxError::Parse(ParseError::InvalidNumber { .. }))
        ));
        assert!(matches!(
            parse("f x := 1"),
            Err(SyntaxError::Parse(ParseError::InvalidTarget { .. }))
        ));
        assert!(matches!(
            parse("{ x }"),
            Err(SyntaxError::Parse(ParseError::UnexpectedToken { .. }))
        ));
        assert!(matches!(
            parse("x := \"open"),
            Err(SyntaxError::Parse(ParseError::InvalidToken { .. }))
        ));
        assert!(matches!(
            parse("a\n    b"),
            Err(SyntaxError::Layout(_))
        ));
    }
}
