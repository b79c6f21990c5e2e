use std::fmt::Display;
use std::rc::Rc;

use curry_lang_core::ast;
use curry_lang_core::Position;
use thiserror::Error;

use crate::environment::Environment;
use crate::evaluator::Evaluator;

#[derive(Debug, Clone)]
pub enum Value {
    Number(i64),
    String(Rc<str>),
    Bool(bool),
    Unit,
    List(Vec<Rc<Value>>),
    Tuple(Vec<Rc<Value>>),
    /// Inclusive integer range, materialized only when iterated.
    Range { low: i64, high: i64 },
    Closure(Closure),
    Builtin(Builtin),
}

thread_local! {
    static UNIT: Rc<Value> = Rc::new(Value::Unit);
    static TRUE: Rc<Value> = Rc::new(Value::Bool(true));
    static FALSE: Rc<Value> = Rc::new(Value::Bool(false));
}

impl Value {
    pub fn unit() -> Rc<Value> {
        UNIT.with(|x| x.clone())
    }
    pub fn boolean(value: bool) -> Rc<Value> {
        if value {
            TRUE.with(|x| x.clone())
        } else {
            FALSE.with(|x| x.clone())
        }
    }
    pub fn number(value: i64) -> Rc<Value> {
        Rc::new(Value::Number(value))
    }
    pub fn string(value: impl Into<Rc<str>>) -> Rc<Value> {
        Rc::new(Value::String(value.into()))
    }
    pub fn list(values: Vec<Rc<Value>>) -> Rc<Value> {
        Rc::new(Value::List(values))
    }
    pub fn tuple(values: Vec<Rc<Value>>) -> Rc<Value> {
        Rc::new(Value::Tuple(values))
    }
    pub fn range(low: i64, high: i64) -> Rc<Value> {
        Rc::new(Value::Range { low, high })
    }
    pub fn closure(
        parameters: Rc<[ast::Pattern]>,
        body: Rc<ast::Block>,
        env: Environment,
    ) -> Rc<Value> {
        Rc::new(Value::Closure(Closure {
            parameters,
            body,
            env,
            bound: Vec::new(),
        }))
    }
    pub fn builtin(builtin: Builtin) -> Rc<Value> {
        Rc::new(Value::Builtin(builtin))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Unit => "unit",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Range { .. } => "range",
            Value::Closure(_) | Value::Builtin(_) => "function",
        }
    }

    /// Elements of a list, tuple or range, in order.
    pub fn elements(&self) -> Option<Elements<'_>> {
        match self {
            Value::List(values) | Value::Tuple(values) => Some(Elements::Values(values.iter())),
            Value::Range { low, high } => Some(Elements::Range(*low..=*high)),
            _ => None,
        }
    }

    /// How the value appears nested inside a list or tuple: strings quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::String(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

pub enum Elements<'a> {
    Values(std::slice::Iter<'a, Rc<Value>>),
    Range(std::ops::RangeInclusive<i64>),
}

impl Iterator for Elements<'_> {
    type Item = Rc<Value>;

    fn next(&mut self) -> Option<Rc<Value>> {
        match self {
            Elements::Values(values) => values.next().cloned(),
            Elements::Range(range) => range.next().map(Value::number),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Bool(left), Value::Bool(right)) => left == right,
            (Value::Unit, Value::Unit) => true,
            (Value::Tuple(left), Value::Tuple(right)) => left == right,
            (Value::Closure(left), Value::Closure(right)) => left == right,
            (Value::Builtin(left), Value::Builtin(right)) => left == right,
            (Value::List(_) | Value::Range { .. }, Value::List(_) | Value::Range { .. }) => {
                match (self.elements(), other.elements()) {
                    (Some(left), Some(right)) => left.eq(right),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(value) => write!(f, "{}", value),
            Value::String(value) => write!(f, "{}", value),
            Value::Bool(value) => write!(f, "{}", value),
            Value::Unit => write!(f, "()"),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value.repr())?;
                }
                write!(f, "]")
            }
            Value::Tuple(values) => {
                write!(f, "(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value.repr())?;
                }
                if values.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::Range { low, high } => write!(f, "{}..{}", low, high),
            Value::Closure(closure) => write!(f, "<fn/{}>", closure.remaining()),
            Value::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
        }
    }
}

/// A lambda together with the environment it was created in. `bound` holds
/// arguments of a partial application.
#[derive(Clone)]
pub struct Closure {
    pub parameters: Rc<[ast::Pattern]>,
    pub body: Rc<ast::Block>,
    pub env: Environment,
    pub bound: Vec<Rc<Value>>,
}

impl Closure {
    pub fn remaining(&self) -> usize {
        self.parameters.len().saturating_sub(self.bound.len())
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
            && self.env.ptr_eq(&other.env)
            && self.bound == other.bound
    }
}

impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closure")
            .field("arity", &self.parameters.len())
            .field("bound", &self.bound)
            .finish()
    }
}

pub type BuiltinFn =
    fn(&mut Evaluator<'_>, Vec<Rc<Value>>, Position) -> Result<Rc<Value>, EvaluationError>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub func: BuiltinFn,
    pub bound: Vec<Rc<Value>>,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.bound == other.bound
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("bound", &self.bound)
            .finish()
    }
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum EvaluationError {
    #[error("unbound name `{name}`")]
    UnboundName { name: Rc<str>, position: Position },
    #[error("`{value}` is not a function")]
    NotCallable { value: String, position: Position },
    #[error("{message}")]
    TypeMismatch { message: String, position: Position },
    #[error("`{name}` expects {expected} arguments, got {actual}")]
    WrongArgumentCount {
        name: &'static str,
        expected: usize,
        actual: usize,
        position: Position,
    },
    #[error("{message}")]
    PatternMismatch { message: String, position: Position },
    #[error("division by zero")]
    DivisionByZero { position: Position },
    #[error("arithmetic overflow")]
    ArithmeticOverflow { position: Position },
    #[error("maximum call depth of {limit} exceeded")]
    RecursionLimit { limit: usize, position: Position },
    #[error("failed to write output: {message}")]
    Output { message: String, position: Position },
}

impl EvaluationError {
    pub fn type_mismatch(message: impl Into<String>, position: Position) -> Self {
        EvaluationError::TypeMismatch {
            message: message.into(),
            position,
        }
    }

    pub fn position(&self) -> Position {
        use EvaluationError::*;
        match self {
            UnboundName { position, .. }
            | NotCallable { position, .. }
            | TypeMismatch { position, .. }
            | WrongArgumentCount { position, .. }
            | PatternMismatch { position, .. }
            | DivisionByZero { position }
            | ArithmeticOverflow { position }
            | RecursionLimit { position, .. }
            | Output { position, .. } => *position,
        }
    }
}
