use std::fmt::Display;
use std::rc::Rc;

use crate::lexer::Position;

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Let(LetStatement),
    Assign(AssignStatement),
    For(ForStatement),
    While(WhileStatement),
    Expression(Expression),
}

/// `pattern := value` or `pattern = value`. Both introduce a binding in the
/// current scope.
#[derive(Debug, PartialEq, Clone)]
pub struct LetStatement {
    pub pattern: Pattern,
    pub value: Expression,
    pub kind: BindKind,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BindKind {
    Declare,
    Equals,
}

/// Compound assignment updating the nearest existing binding of `target`.
#[derive(Debug, PartialEq, Clone)]
pub struct AssignStatement {
    pub target: Identifier,
    pub operator: AssignOperator,
    pub value: Expression,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum AssignOperator {
    /// `+=`: string concatenation or numeric addition
    Concat,
    /// `++=`: list append
    Append,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ForStatement {
    pub pattern: Pattern,
    pub iterable: Expression,
    pub body: Block,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExpressionKind {
    Identifier(Rc<str>),
    Literal(Literal),
    List(Vec<Expression>),
    Tuple(Vec<Expression>),
    Range {
        low: Box<Expression>,
        high: Box<Expression>,
    },
    Unary(UnaryOperator, Box<Expression>),
    Binary(BinaryOperator, Box<Expression>, Box<Expression>),
    If {
        condition: Box<Expression>,
        consequence: Block,
        alternative: Block,
    },
    Lambda {
        parameters: Rc<[Pattern]>,
        body: Rc<Block>,
    },
    /// Every application form ends up here: juxtaposition, comma arguments,
    /// `.name` calls and `|>` pipes.
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Number(i64),
    String(Rc<str>),
    Template(Vec<TemplatePart>),
    Bool(bool),
    Unit,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TemplatePart {
    Text(String),
    Expression(Expression),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Pattern {
    Name(Identifier),
    Tuple(Vec<Pattern>),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Identifier {
    pub name: Rc<str>,
    pub position: Position,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Expression {
    pub fn new(kind: ExpressionKind, position: Position) -> Self {
        Expression { kind, position }
    }
}

fn write_separated<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{};", statement)?;
        }
        write!(f, "}}")
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(val) => write!(f, "{}", val),
            Literal::String(val) => write!(f, "{:?}", val),
            Literal::Template(parts) => {
                write!(f, "`")?;
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => write!(f, "{}", text)?,
                        TemplatePart::Expression(expression) => write!(f, "{{{}}}", expression)?,
                    }
                }
                write!(f, "`")
            }
            Literal::Bool(val) => write!(f, "{}", val),
            Literal::Unit => write!(f, "()"),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ExpressionKind::*;
        match &self.kind {
            Identifier(name) => write!(f, "{}", name),
            Literal(literal) => write!(f, "{}", literal),
            List(elements) => {
                write!(f, "[")?;
                write_separated(f, elements, ", ")?;
                write!(f, "]")
            }
            Tuple(elements) => {
                write!(f, "(")?;
                write_separated(f, elements, ", ")?;
                if elements.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Range { low, high } => write!(f, "({}..{})", low, high),
            Unary(operator, operand) => write!(f, "({}{})", operator.to_str(), operand),
            Binary(operator, left, right) => {
                write!(f, "({} {} {})", left, operator.to_str(), right)
            }
            If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {}", condition, consequence)?;
                if !alternative.statements.is_empty() {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Lambda { parameters, body } => {
                write!(f, "fn(")?;
                write_separated(f, &parameters[..], ", ")?;
                write!(f, ") {}", body)
            }
            Call {
                function,
                arguments,
            } => {
                write!(f, "{}(", function)?;
                write_separated(f, arguments, ", ")?;
                write!(f, ")")
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Let(statement) => {
                let operator = match statement.kind {
                    BindKind::Declare => ":=",
                    BindKind::Equals => "=",
                };
                write!(f, "{} {} {}", statement.pattern, operator, statement.value)
            }
            Statement::Assign(statement) => {
                let operator = match statement.operator {
                    AssignOperator::Concat => "+=",
                    AssignOperator::Append => "++=",
                };
                write!(f, "{} {} {}", statement.target.name, operator, statement.value)
            }
            Statement::For(statement) => write!(
                f,
                "for {} <- {} {}",
                statement.pattern, statement.iterable, statement.body
            ),
            Statement::While(statement) => {
                write!(f, "while {} {}", statement.condition, statement.body)
            }
            Statement::Expression(expression) => write!(f, "{}", expression),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{};", statement)?;
        }
        Ok(())
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pattern::Name(ident) => write!(f, "{}", ident.name),
            Pattern::Tuple(elements) => {
                write!(f, "(")?;
                write_separated(f, elements, ", ")?;
                write!(f, ")")
            }
        }
    }
}

impl UnaryOperator {
    fn to_str(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "!",
        }
    }
}

impl BinaryOperator {
    pub fn to_str(&self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Add => "+",
            Subtract => "-",
            Multiply => "*",
            Divide => "/",
            Modulo => "%",
            Concat => "++",
            Equal => "==",
            NotEqual => "!=",
            LessThan => "<",
            LessEqual => "<=",
            GreaterThan => ">",
            GreaterEqual => ">=",
            And => "&&",
            Or => "||",
        }
    }
}
