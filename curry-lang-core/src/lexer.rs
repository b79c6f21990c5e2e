use std::fmt::Display;
use std::rc::Rc;

/// Columns a tab advances when measuring indentation.
const TAB_WIDTH: usize = 4;

/// A location in the source text. `line` and `column` start at 1.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Invalid(Rc<str>),
    Ident(Rc<str>),
    Number(Rc<str>),
    String(Rc<str>),
    Template(Vec<Segment>),

    // Operators
    Declare,
    Assign,
    PlusAssign,
    AppendAssign,
    PlusPlus,
    Pipe,
    Dot,
    DotDot,
    Arrow,
    LeftArrow,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Percent,

    Equal,
    NotEqual,

    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    And,
    Or,

    Comma,
    Colon,
    SemiColon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Keywords
    Function,
    If,
    Then,
    Else,
    For,
    While,
    True,
    False,

    // Layout, inserted by `layout::normalize`
    BlockStart,
    BlockEnd,
    StatementEnd,
    Eof,
}

/// Piece of a backtick template literal.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Segment {
    Text(String),
    /// Tokens of an interpolated expression, terminated by `Eof`.
    Expr(Vec<Token>),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub start: Position,
    pub end: Position,
}

impl TokenKind {
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Asterisk
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::PlusPlus
                | TokenKind::DotDot
                | TokenKind::Equal
                | TokenKind::NotEqual
                | TokenKind::LessThan
                | TokenKind::LessEqual
                | TokenKind::GreaterThan
                | TokenKind::GreaterEqual
                | TokenKind::And
                | TokenKind::Or
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TokenKind::*;
        let symbol = match self {
            Invalid(message) => return write!(f, "invalid token ({message})"),
            Ident(name) => return write!(f, "identifier `{name}`"),
            Number(literal) => return write!(f, "number `{literal}`"),
            String(_) => "string literal",
            Template(_) => "template literal",
            Declare => "`:=`",
            Assign => "`=`",
            PlusAssign => "`+=`",
            AppendAssign => "`++=`",
            PlusPlus => "`++`",
            Pipe => "`|>`",
            Dot => "`.`",
            DotDot => "`..`",
            Arrow => "`->`",
            LeftArrow => "`<-`",
            Plus => "`+`",
            Minus => "`-`",
            Bang => "`!`",
            Asterisk => "`*`",
            Slash => "`/`",
            Percent => "`%`",
            Equal => "`==`",
            NotEqual => "`!=`",
            LessThan => "`<`",
            LessEqual => "`<=`",
            GreaterThan => "`>`",
            GreaterEqual => "`>=`",
            And => "`&&`",
            Or => "`||`",
            Comma => "`,`",
            Colon => "`:`",
            SemiColon => "`;`",
            LParen => "`(`",
            RParen => "`)`",
            LBracket => "`[`",
            RBracket => "`]`",
            LBrace => "`{`",
            RBrace => "`}`",
            Function => "`fn`",
            If => "`if`",
            Then => "`then`",
            Else => "`else`",
            For => "`for`",
            While => "`while`",
            True => "`true`",
            False => "`false`",
            BlockStart => "indented block",
            BlockEnd => "end of block",
            StatementEnd => "end of statement",
            Eof => "end of input",
        };
        f.write_str(symbol)
    }
}

fn keywords(ident: &str) -> Option<TokenKind> {
    match ident {
        "fn" => Some(TokenKind::Function),
        "if" => Some(TokenKind::If),
        "then" => Some(TokenKind::Then),
        "else" => Some(TokenKind::Else),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        _ => None,
    }
}

/// Splits source text into tokens. Lexing never fails: anything that cannot
/// be a token becomes `TokenKind::Invalid` and is reported by the parser.
#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    iter: std::iter::Peekable<std::str::CharIndices<'a>>,
    base: usize,
    limit: usize,
    line: usize,
    column: usize,
}

pub fn tokenize(input: &str) -> Vec<Token> {
    Tokenizer::new(input).tokenize()
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        let iter = input.char_indices().peekable();
        Self {
            input,
            iter,
            base: 0,
            limit: input.len(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenizer over `input[start..limit]` reporting positions relative to
    /// the whole input.
    fn nested(input: &'a str, start: usize, limit: usize, origin: Position) -> Self {
        let iter = input[start..limit].char_indices().peekable();
        Self {
            input,
            iter,
            base: start,
            limit,
            line: origin.line,
            column: origin.column,
        }
    }

    /// Collects every token followed by a single `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.by_ref().collect();
        let end = self.position();
        tokens.push(Token {
            kind: TokenKind::Eof,
            start: end,
            end,
        });
        tokens
    }

    fn is_letter(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn next_idx(&mut self) -> usize {
        let base = self.base;
        self.iter
            .peek()
            .map(|(idx, _)| base + idx)
            .unwrap_or(self.limit)
    }

    fn position(&mut self) -> Position {
        Position {
            offset: self.next_idx(),
            line: self.line,
            column: self.column,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.iter.peek().map(|(_, ch)| *ch)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.iter.clone();
        ahead.next();
        ahead.next().map(|(_, ch)| ch)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.iter.next()?;
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\t' => self.column += TAB_WIDTH,
            _ => self.column += 1,
        }
        Some(ch)
    }

    fn bump_if(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while self.peek_char().is_some_and(|ch| ch != '\n') {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self, start: usize) -> TokenKind {
        while self
            .peek_char()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        // `println!` style names, but `a!=b` is still a comparison
        if self.peek_char() == Some('!') && self.peek_second() != Some('=') {
            self.bump();
        }

        let end = self.next_idx();
        let ident = &self.input[start..end];
        keywords(ident).unwrap_or_else(|| TokenKind::Ident(ident.into()))
    }

    fn read_number(&mut self, start: usize) -> TokenKind {
        while self.peek_char().is_some_and(|ch| ch.is_ascii_digit()) {
            self.bump();
        }

        let end = self.next_idx();
        TokenKind::Number(self.input[start..end].into())
    }

    fn read_escape(&mut self) -> Result<char, Rc<str>> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some(ch @ ('\\' | '"' | '`' | '{' | '}')) => Ok(ch),
            Some(ch) => Err(format!("unknown escape sequence `\\{ch}`").into()),
            None => Err("unterminated string literal".into()),
        }
    }

    fn read_string(&mut self) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return TokenKind::String(value.into()),
                Some('\\') => match self.read_escape() {
                    Ok(ch) => value.push(ch),
                    Err(message) => return TokenKind::Invalid(message),
                },
                Some(ch) => value.push(ch),
                None => return TokenKind::Invalid("unterminated string literal".into()),
            }
        }
    }

    fn read_template(&mut self) -> TokenKind {
        let mut segments = Vec::new();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('`') => break,
                Some('\\') => match self.read_escape() {
                    Ok(ch) => text.push(ch),
                    Err(message) => return TokenKind::Invalid(message),
                },
                Some('{') => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    match self.read_interpolation() {
                        Ok(tokens) => segments.push(Segment::Expr(tokens)),
                        Err(message) => return TokenKind::Invalid(message),
                    }
                }
                Some(ch) => text.push(ch),
                None => return TokenKind::Invalid("unterminated template literal".into()),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        TokenKind::Template(segments)
    }

    fn read_interpolation(&mut self) -> Result<Vec<Token>, Rc<str>> {
        let origin = self.position();
        let end = self.skip_interpolation()?;
        let tokens = Tokenizer::nested(self.input, origin.offset, end, origin).tokenize();
        if tokens.len() == 1 {
            return Err("empty interpolation in template literal".into());
        }
        Ok(tokens)
    }

    /// Consumes an interpolated expression and its closing `}`, returning the
    /// offset where the expression source ends.
    fn skip_interpolation(&mut self) -> Result<usize, Rc<str>> {
        let mut depth = 0usize;
        loop {
            let end = self.next_idx();
            match self.bump() {
                Some('}') if depth == 0 => return Ok(end),
                Some('{') => depth += 1,
                Some('}') => depth -= 1,
                Some('"') => self.skip_string()?,
                Some('`') => self.skip_template()?,
                Some(_) => {}
                None => return Err("unterminated interpolation in template literal".into()),
            }
        }
    }

    fn skip_string(&mut self) -> Result<(), Rc<str>> {
        loop {
            match self.bump() {
                Some('"') => return Ok(()),
                Some('\\') => {
                    self.bump();
                }
                Some(_) => {}
                None => return Err("unterminated string literal".into()),
            }
        }
    }

    fn skip_template(&mut self) -> Result<(), Rc<str>> {
        loop {
            match self.bump() {
                Some('`') => return Ok(()),
                Some('\\') => {
                    self.bump();
                }
                Some('{') => {
                    self.skip_interpolation()?;
                }
                Some(_) => {}
                None => return Err("unterminated template literal".into()),
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_trivia();
        let start = self.position();
        let ch = self.bump()?;

        let kind = match ch {
            '=' => {
                if self.bump_if('=') {
                    TokenKind::Equal
                } else {
                    TokenKind::Assign
                }
            }
            ':' => {
                if self.bump_if('=') {
                    TokenKind::Declare
                } else {
                    TokenKind::Colon
                }
            }
            '+' => {
                if self.bump_if('+') {
                    if self.bump_if('=') {
                        TokenKind::AppendAssign
                    } else {
                        TokenKind::PlusPlus
                    }
                } else if self.bump_if('=') {
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.bump_if('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '<' => {
                if self.bump_if('-') {
                    TokenKind::LeftArrow
                } else if self.bump_if('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::LessThan
                }
            }
            '>' => {
                if self.bump_if('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::GreaterThan
                }
            }
            '!' => {
                if self.bump_if('=') {
                    TokenKind::NotEqual
                } else {
                    TokenKind::Bang
                }
            }
            '|' => {
                if self.bump_if('>') {
                    TokenKind::Pipe
                } else if self.bump_if('|') {
                    TokenKind::Or
                } else {
                    TokenKind::Invalid("unexpected character `|`".into())
                }
            }
            '&' => {
                if self.bump_if('&') {
                    TokenKind::And
                } else {
                    TokenKind::Invalid("unexpected character `&`".into())
                }
            }
            '.' => {
                if self.bump_if('.') {
                    TokenKind::DotDot
                } else {
                    TokenKind::Dot
                }
            }
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            ',' => TokenKind::Comma,
            ';' => TokenKind::SemiColon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '"' => self.read_string(),
            '`' => self.read_template(),
            c if Tokenizer::is_letter(c) => self.read_identifier(start.offset),
            c if c.is_ascii_digit() => self.read_number(start.offset),
            c => TokenKind::Invalid(format!("unexpected character `{c}`").into()),
        };

        let end = self.position();
        Some(Token { kind, start, end })
    }
}
