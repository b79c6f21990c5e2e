use std::io::Write;
use std::rc::Rc;

use curry_lang_core::ast::{
    self, AssignOperator, BinaryOperator, Expression, ExpressionKind, Literal, Pattern,
    TemplatePart, UnaryOperator,
};
use curry_lang_core::Position;
use tracing::{debug, trace};

use crate::environment::{Environment, ScopeTracker};
use crate::value::{Builtin, Closure, EvaluationError, Value};

/// Closure calls nested deeper than this fail with `RecursionLimit`.
pub const MAX_CALL_DEPTH: usize = 10_000;

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Tree-walking evaluator. Output of the printing builtins goes to `output`.
pub struct Evaluator<'a> {
    output: &'a mut dyn Write,
    globals: Environment,
    scopes: ScopeTracker,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(output: &'a mut dyn Write) -> Self {
        let globals = Environment::new();
        let mut scopes = ScopeTracker::new();
        scopes.track(&globals);
        Evaluator {
            output,
            globals,
            scopes,
            depth: 0,
        }
    }

    /// Evaluates the program in the global scope and returns the value of its
    /// last statement.
    pub fn eval_program(&mut self, program: &ast::Program) -> Result<Rc<Value>, EvaluationError> {
        let globals = self.globals.clone();
        let result = self.eval_statements(&program.statements, &globals)?;
        self.output
            .flush()
            .map_err(|err| EvaluationError::Output {
                message: err.to_string(),
                position: Position::default(),
            })?;
        Ok(result)
    }

    pub(crate) fn write_output(&mut self, text: &str, position: Position) -> Result<(), EvaluationError> {
        self.output
            .write_all(text.as_bytes())
            .map_err(|err| EvaluationError::Output {
                message: err.to_string(),
                position,
            })
    }

    fn eval_statements(
        &mut self,
        statements: &[ast::Statement],
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        let mut result = Value::unit();
        for statement in statements {
            result = self.eval_statement(statement, environment)?;
        }
        Ok(result)
    }

    /// Opens a scope nested in `outer`, collecting unreachable scopes first
    /// when enough have piled up.
    fn enclose(&mut self, outer: &Environment) -> Environment {
        self.scopes.maybe_collect();
        let scope = Environment::new_enclosed(outer);
        self.scopes.track(&scope);
        scope
    }

    fn eval_block(
        &mut self,
        block: &ast::Block,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        let scope = self.enclose(environment);
        self.eval_statements(&block.statements, &scope)
    }

    fn eval_statement(
        &mut self,
        statement: &ast::Statement,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        match statement {
            ast::Statement::Let(statement) => {
                let value = self.eval_expression(&statement.value, environment)?;
                bind_pattern(&statement.pattern, value.clone(), environment, statement.position)?;
                Ok(value)
            }
            ast::Statement::Assign(statement) => self.eval_assign_statement(statement, environment),
            ast::Statement::For(statement) => self.eval_for_statement(statement, environment),
            ast::Statement::While(statement) => self.eval_while_statement(statement, environment),
            ast::Statement::Expression(expression) => self.eval_expression(expression, environment),
        }
    }

    fn eval_assign_statement(
        &mut self,
        statement: &ast::AssignStatement,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        let name = &statement.target.name;
        let position = statement.position;
        let unbound = || EvaluationError::UnboundName {
            name: name.clone(),
            position: statement.target.position,
        };

        let current = environment.get(name).ok_or_else(unbound)?;
        let value = self.eval_expression(&statement.value, environment)?;

        let updated = match (statement.operator, current.as_ref(), value.as_ref()) {
            (AssignOperator::Concat, Value::String(left), Value::String(right)) => {
                Value::string(format!("{}{}", left, right))
            }
            (AssignOperator::Concat, Value::Number(left), Value::Number(right)) => left
                .checked_add(*right)
                .map(Value::number)
                .ok_or(EvaluationError::ArithmeticOverflow { position })?,
            (AssignOperator::Append, Value::List(left), _) if value.elements().is_some() => {
                let mut list = left.clone();
                list.extend(value.elements().into_iter().flatten());
                Value::list(list)
            }
            (operator, _, _) => {
                let symbol = match operator {
                    AssignOperator::Concat => "+=",
                    AssignOperator::Append => "++=",
                };
                return Err(EvaluationError::type_mismatch(
                    format!(
                        "cannot apply `{}` to {} and {}",
                        symbol,
                        current.type_name(),
                        value.type_name()
                    ),
                    position,
                ));
            }
        };

        // a name that only resolves to a builtin has no binding to update
        if !environment.update(name, updated.clone()) {
            return Err(unbound());
        }
        Ok(updated)
    }

    fn eval_for_statement(
        &mut self,
        statement: &ast::ForStatement,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        let iterable = self.eval_expression(&statement.iterable, environment)?;
        let Some(elements) = iterable.elements() else {
            return Err(EvaluationError::type_mismatch(
                format!("cannot iterate over {}", iterable.type_name()),
                statement.iterable.position,
            ));
        };

        for element in elements {
            let scope = self.enclose(environment);
            bind_pattern(&statement.pattern, element, &scope, statement.position)?;
            self.eval_statements(&statement.body.statements, &scope)?;
        }
        Ok(Value::unit())
    }

    fn eval_while_statement(
        &mut self,
        statement: &ast::WhileStatement,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        loop {
            let condition = self.eval_expression(&statement.condition, environment)?;
            if !expect_bool(&condition, statement.condition.position)? {
                return Ok(Value::unit());
            }
            self.eval_block(&statement.body, environment)?;
        }
    }

    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
        environment: &Environment,
    ) -> Result<Vec<Rc<Value>>, EvaluationError> {
        let mut result = Vec::with_capacity(expressions.len());
        for expression in expressions {
            result.push(self.eval_expression(expression, environment)?);
        }
        Ok(result)
    }

    fn eval_expression(
        &mut self,
        expression: &Expression,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_expression_inner(expression, environment)
        })
    }

    fn eval_expression_inner(
        &mut self,
        expression: &Expression,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        let position = expression.position;
        match &expression.kind {
            ExpressionKind::Identifier(name) => {
                environment
                    .get(name)
                    .ok_or_else(|| EvaluationError::UnboundName {
                        name: name.clone(),
                        position,
                    })
            }
            ExpressionKind::Literal(literal) => self.eval_literal(literal, environment),
            ExpressionKind::List(elements) => {
                Ok(Value::list(self.eval_expressions(elements, environment)?))
            }
            ExpressionKind::Tuple(elements) => {
                Ok(Value::tuple(self.eval_expressions(elements, environment)?))
            }
            ExpressionKind::Range { low, high } => {
                let low = self.eval_expression(low, environment)?;
                let high = self.eval_expression(high, environment)?;
                match (low.as_ref(), high.as_ref()) {
                    (Value::Number(low), Value::Number(high)) => Ok(Value::range(*low, *high)),
                    _ => Err(EvaluationError::type_mismatch(
                        format!(
                            "range bounds must be numbers, got {} and {}",
                            low.type_name(),
                            high.type_name()
                        ),
                        position,
                    )),
                }
            }
            ExpressionKind::Unary(operator, operand) => {
                let operand = self.eval_expression(operand, environment)?;
                eval_unary_operation(*operator, operand, position)
            }
            ExpressionKind::Binary(operator @ (BinaryOperator::And | BinaryOperator::Or), left, right) => {
                let left = self.eval_expression(left, environment)?;
                let decided = expect_bool(&left, position)?;
                if decided == (*operator == BinaryOperator::Or) {
                    return Ok(left);
                }
                let right = self.eval_expression(right, environment)?;
                expect_bool(&right, position)?;
                Ok(right)
            }
            ExpressionKind::Binary(operator, left, right) => {
                let left = self.eval_expression(left, environment)?;
                let right = self.eval_expression(right, environment)?;
                eval_binary_operation(*operator, left, right, position)
            }
            ExpressionKind::If {
                condition,
                consequence,
                alternative,
            } => {
                let value = self.eval_expression(condition, environment)?;
                if expect_bool(&value, condition.position)? {
                    self.eval_block(consequence, environment)
                } else {
                    self.eval_block(alternative, environment)
                }
            }
            ExpressionKind::Lambda { parameters, body } => Ok(Value::closure(
                parameters.clone(),
                body.clone(),
                environment.clone(),
            )),
            ExpressionKind::Call {
                function,
                arguments,
            } => {
                let function = self.eval_expression(function, environment)?;
                let arguments = self.eval_expressions(arguments, environment)?;
                self.apply(function, arguments, position)
            }
        }
    }

    fn eval_literal(
        &mut self,
        literal: &Literal,
        environment: &Environment,
    ) -> Result<Rc<Value>, EvaluationError> {
        match literal {
            Literal::Number(value) => Ok(Value::number(*value)),
            Literal::String(value) => Ok(Value::string(value.clone())),
            Literal::Bool(value) => Ok(Value::boolean(*value)),
            Literal::Unit => Ok(Value::unit()),
            Literal::Template(parts) => {
                let mut text = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(segment) => text.push_str(segment),
                        TemplatePart::Expression(expression) => {
                            let value = self.eval_expression(expression, environment)?;
                            text.push_str(&value.to_string());
                        }
                    }
                }
                Ok(Value::string(text))
            }
        }
    }

    /// Applies a callable to arguments, currying in both directions: too few
    /// arguments give a partial application, surplus arguments are applied to
    /// the result.
    pub fn apply(
        &mut self,
        callee: Rc<Value>,
        arguments: Vec<Rc<Value>>,
        position: Position,
    ) -> Result<Rc<Value>, EvaluationError> {
        match callee.as_ref() {
            Value::Closure(closure) => {
                let mut supplied = closure.bound.clone();
                supplied.extend(arguments);
                let arity = closure.parameters.len();

                if arity == 0 {
                    // `f ()` runs a parameterless lambda
                    let unit_first =
                        matches!(supplied.first().map(|value| value.as_ref()), Some(Value::Unit));
                    let rest = if unit_first {
                        supplied.split_off(1)
                    } else {
                        supplied
                    };
                    let result = self.invoke_closure(closure, Vec::new(), position)?;
                    return self.apply_rest(result, rest, position);
                }

                if supplied.len() < arity {
                    debug!(arity, supplied = supplied.len(), "partial application");
                    return Ok(Rc::new(Value::Closure(Closure {
                        bound: supplied,
                        ..closure.clone()
                    })));
                }

                let rest = supplied.split_off(arity);
                let result = self.invoke_closure(closure, supplied, position)?;
                self.apply_rest(result, rest, position)
            }
            Value::Builtin(builtin) => {
                let mut supplied = builtin.bound.clone();
                supplied.extend(arguments);

                if supplied.len() < builtin.arity {
                    debug!(name = builtin.name, supplied = supplied.len(), "partial application");
                    return Ok(Value::builtin(Builtin {
                        bound: supplied,
                        ..builtin.clone()
                    }));
                }

                let rest = supplied.split_off(builtin.arity);
                trace!(name = builtin.name, "calling builtin");
                let result = (builtin.func)(self, supplied, position)?;
                self.apply_rest(result, rest, position)
            }
            _ => Err(EvaluationError::NotCallable {
                value: callee.to_string(),
                position,
            }),
        }
    }

    fn apply_rest(
        &mut self,
        result: Rc<Value>,
        rest: Vec<Rc<Value>>,
        position: Position,
    ) -> Result<Rc<Value>, EvaluationError> {
        if rest.is_empty() {
            Ok(result)
        } else {
            self.apply(result, rest, position)
        }
    }

    fn invoke_closure(
        &mut self,
        closure: &Closure,
        arguments: Vec<Rc<Value>>,
        position: Position,
    ) -> Result<Rc<Value>, EvaluationError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(EvaluationError::RecursionLimit {
                limit: MAX_CALL_DEPTH,
                position,
            });
        }

        trace!(arity = closure.parameters.len(), depth = self.depth, "invoking closure");
        let scope = self.enclose(&closure.env);
        for (parameter, argument) in closure.parameters.iter().zip(arguments) {
            bind_pattern(parameter, argument, &scope, position)?;
        }

        self.depth += 1;
        let result = self.eval_statements(&closure.body.statements, &scope);
        self.depth -= 1;
        result
    }
}

impl Drop for Evaluator<'_> {
    fn drop(&mut self) {
        drop(std::mem::take(&mut self.globals));
        self.scopes.collect();
    }
}

/// Binds `value` to `pattern` in `environment`. Tuple patterns need a tuple
/// of the same arity.
fn bind_pattern(
    pattern: &Pattern,
    value: Rc<Value>,
    environment: &Environment,
    position: Position,
) -> Result<(), EvaluationError> {
    match pattern {
        Pattern::Name(identifier) => {
            environment.set(identifier.name.clone(), value);
            Ok(())
        }
        Pattern::Tuple(patterns) => match value.as_ref() {
            Value::Tuple(values) if values.len() == patterns.len() => {
                for (pattern, value) in patterns.iter().zip(values) {
                    bind_pattern(pattern, value.clone(), environment, position)?;
                }
                Ok(())
            }
            Value::Tuple(values) => Err(EvaluationError::PatternMismatch {
                message: format!(
                    "cannot bind a tuple of {} elements to `{}`",
                    values.len(),
                    pattern
                ),
                position,
            }),
            other => Err(EvaluationError::PatternMismatch {
                message: format!("cannot bind {} `{}` to `{}`", other.type_name(), other, pattern),
                position,
            }),
        },
    }
}

fn expect_bool(value: &Value, position: Position) -> Result<bool, EvaluationError> {
    match value {
        Value::Bool(value) => Ok(*value),
        other => Err(EvaluationError::type_mismatch(
            format!("expected a bool, got {}", other.type_name()),
            position,
        )),
    }
}

fn eval_unary_operation(
    operator: UnaryOperator,
    operand: Rc<Value>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    match (operator, operand.as_ref()) {
        (UnaryOperator::Not, Value::Bool(value)) => Ok(Value::boolean(!value)),
        (UnaryOperator::Negate, Value::Number(value)) => value
            .checked_neg()
            .map(Value::number)
            .ok_or(EvaluationError::ArithmeticOverflow { position }),
        (UnaryOperator::Not, other) => Err(EvaluationError::type_mismatch(
            format!("cannot apply `!` to {}", other.type_name()),
            position,
        )),
        (UnaryOperator::Negate, other) => Err(EvaluationError::type_mismatch(
            format!("cannot negate {}", other.type_name()),
            position,
        )),
    }
}

fn eval_binary_operation(
    operator: BinaryOperator,
    left: Rc<Value>,
    right: Rc<Value>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    use BinaryOperator::*;

    let overflow = || EvaluationError::ArithmeticOverflow { position };
    match (operator, left.as_ref(), right.as_ref()) {
        (Equal, _, _) => Ok(Value::boolean(left == right)),
        (NotEqual, _, _) => Ok(Value::boolean(left != right)),
        (Divide | Modulo, Value::Number(_), Value::Number(0)) => {
            Err(EvaluationError::DivisionByZero { position })
        }
        (Add, Value::Number(l), Value::Number(r)) => {
            l.checked_add(*r).map(Value::number).ok_or_else(overflow)
        }
        (Subtract, Value::Number(l), Value::Number(r)) => {
            l.checked_sub(*r).map(Value::number).ok_or_else(overflow)
        }
        (Multiply, Value::Number(l), Value::Number(r)) => {
            l.checked_mul(*r).map(Value::number).ok_or_else(overflow)
        }
        (Divide, Value::Number(l), Value::Number(r)) => {
            l.checked_div(*r).map(Value::number).ok_or_else(overflow)
        }
        (Modulo, Value::Number(l), Value::Number(r)) => {
            l.checked_rem(*r).map(Value::number).ok_or_else(overflow)
        }
        (Add | Concat, Value::String(l), Value::String(r)) => {
            Ok(Value::string(format!("{}{}", l, r)))
        }
        (
            Concat,
            Value::List(_) | Value::Range { .. },
            Value::List(_) | Value::Range { .. },
        ) => {
            let joined = left
                .elements()
                .into_iter()
                .flatten()
                .chain(right.elements().into_iter().flatten())
                .collect();
            Ok(Value::list(joined))
        }
        (LessThan | LessEqual | GreaterThan | GreaterEqual, _, _) => {
            let ordering = match (left.as_ref(), right.as_ref()) {
                (Value::Number(l), Value::Number(r)) => l.cmp(r),
                (Value::String(l), Value::String(r)) => l.cmp(r),
                _ => return Err(unsupported_operands(operator, &left, &right, position)),
            };
            let result = match operator {
                LessThan => ordering.is_lt(),
                LessEqual => ordering.is_le(),
                GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::boolean(result))
        }
        _ => Err(unsupported_operands(operator, &left, &right, position)),
    }
}

fn unsupported_operands(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
    position: Position,
) -> EvaluationError {
    EvaluationError::type_mismatch(
        format!(
            "unsupported operands for `{}`: {} and {}",
            operator.to_str(),
            left.type_name(),
            right.type_name()
        ),
        position,
    )
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{Evaluator, MAX_CALL_DEPTH};
    use crate::value::{EvaluationError, Value};

    fn evaluate(input: &str) -> (Result<Rc<Value>, EvaluationError>, String) {
        let program = curry_lang_core::parse(input).unwrap();
        let mut output = Vec::new();
        let result = Evaluator::new(&mut output).eval_program(&program);
        (result, String::from_utf8(output).unwrap())
    }

    fn test_evaluation(inputs: Vec<(&str, Result<Rc<Value>, EvaluationError>)>) {
        for (input, output) in inputs {
            let (result, _) = evaluate(input);

            assert_eq!(result, output, "input: {input:?}");
        }
    }

    fn numbers(values: &[i64]) -> Rc<Value> {
        Value::list(values.iter().copied().map(Value::number).collect())
    }

    #[test]
    fn test_literal() {
        let inputs = vec![
            ("5", Ok(Value::number(5))),
            ("true", Ok(Value::boolean(true))),
            ("false", Ok(Value::boolean(false))),
            ("\"hello\"", Ok(Value::string("hello"))),
            ("()", Ok(Value::unit())),
            ("", Ok(Value::unit())),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_operators() {
        let inputs = vec![
            ("--5", Ok(Value::number(5))),
            ("-10", Ok(Value::number(-10))),
            ("!false", Ok(Value::boolean(true))),
            ("2 + 3 * 4 - 1", Ok(Value::number(13))),
            ("7 / 2", Ok(Value::number(3))),
            ("7 % 3", Ok(Value::number(1))),
            ("\"ab\" ++ \"cd\"", Ok(Value::string("abcd"))),
            ("\"ab\" + \"cd\"", Ok(Value::string("abcd"))),
            ("[1] ++ [2, 3]", Ok(numbers(&[1, 2, 3]))),
            ("1 < 2 && 2 <= 2", Ok(Value::boolean(true))),
            ("\"a\" < \"b\"", Ok(Value::boolean(true))),
            ("false || 3 > 4", Ok(Value::boolean(false))),
            ("(1, \"a\") == (1, \"a\")", Ok(Value::boolean(true))),
            ("[1, 2] != [1, 2]", Ok(Value::boolean(false))),
            ("1 == \"1\"", Ok(Value::boolean(false))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        let inputs = vec![
            ("false && missing", Ok(Value::boolean(false))),
            ("true || missing", Ok(Value::boolean(true))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_arithmetic_errors() {
        let (result, _) = evaluate("1 / 0");
        assert!(matches!(result, Err(EvaluationError::DivisionByZero { .. })));

        let (result, _) = evaluate("9223372036854775807 + 1");
        assert!(matches!(
            result,
            Err(EvaluationError::ArithmeticOverflow { .. })
        ));

        let (result, _) = evaluate("1 + \"a\"");
        assert!(matches!(result, Err(EvaluationError::TypeMismatch { .. })));
    }

    #[test]
    fn test_let_statements() {
        let inputs = vec![
            ("a := 5\na", Ok(Value::number(5))),
            ("a := 5 * 5; a", Ok(Value::number(25))),
            ("a = 5; b := a; b", Ok(Value::number(5))),
            ("a := 5; b := a; c := a + b + 5; c", Ok(Value::number(15))),
            ("(a, b) := (1, 2); b - a", Ok(Value::number(1))),
            ("((a, b), c) := ((1, 2), 3); a + b + c", Ok(Value::number(6))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_function_application() {
        let inputs = vec![
            ("identity := fn x -> x; identity 5", Ok(Value::number(5))),
            ("double := fn x -> x * 2; double 5", Ok(Value::number(10))),
            ("add := fn x y -> x + y; add 5 5", Ok(Value::number(10))),
            ("add := fn x y -> x + y; add 5, 5", Ok(Value::number(10))),
            ("add := fn x y -> x + y; 5 .add 5", Ok(Value::number(10))),
            ("add := fn x y -> x + y; 5 |> add 5", Ok(Value::number(10))),
            ("sub := fn x y -> x - y; 10 |> sub 1", Ok(Value::number(9))),
            ("sub := fn x y -> x - y; 10 |> (sub 1)", Ok(Value::number(-9))),
            ("sub := fn x y -> x - y; (sub 1) 10", Ok(Value::number(-9))),
            (
                "add := fn x y -> x + y; add (5 + 5) (add 5 5)",
                Ok(Value::number(20)),
            ),
            ("(fn x -> x) 5", Ok(Value::number(5))),
            (
                "factorial := fn n ->\n    if n < 2 then 1 else n * (factorial (n - 1))\nfactorial 5",
                Ok(Value::number(120)),
            ),
            ("swap := fn (a, b) -> (b, a); swap (1, 2)", Ok(Value::tuple(vec![Value::number(2), Value::number(1)]))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_currying() {
        let inputs = vec![
            (
                "add3 := fn a b c -> a * 100 + b * 10 + c\nadd3 1 2 3",
                Ok(Value::number(123)),
            ),
            (
                "add3 := fn a b c -> a * 100 + b * 10 + c\np := add3 1 2\np 3",
                Ok(Value::number(123)),
            ),
            (
                "add3 := fn a b c -> a * 100 + b * 10 + c\n(add3 1) 2 3",
                Ok(Value::number(123)),
            ),
            (
                "make := fn a -> fn b -> a - b\nmake 10 4",
                Ok(Value::number(6)),
            ),
            ("each := map [1, 2]; each fn x -> x + 1", Ok(numbers(&[2, 3]))),
            ("thunk := fn -> 42; thunk ()", Ok(Value::number(42))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_closure() {
        let inputs = vec![
            (
                "func := fn a ->\n    fn b -> a + b\nfunc 5 10",
                Ok(Value::number(15)),
            ),
            (
                "counter := fn ->\n    count := 0\n    fn -> count\nc := counter ()\nc ()",
                Ok(Value::number(0)),
            ),
            (
                "x := 1\nf := fn -> x\nx = 2\nf ()",
                Ok(Value::number(2)),
            ),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_conditionals_and_loops() {
        let inputs = vec![
            ("if 1 < 2 then 10 else 20", Ok(Value::number(10))),
            ("if 1 > 2 then 10", Ok(Value::unit())),
            (
                "x := 15\nif x % 15 == 0 then \"both\" else if x % 3 == 0 then \"three\" else \"none\"",
                Ok(Value::string("both")),
            ),
            (
                "total := 0\nfor i <- 1..4: total += i\ntotal",
                Ok(Value::number(10)),
            ),
            (
                "res := \"\"\nfor (n, s) <- [(1, \"a\"), (2, \"b\")]:\n    res += s\nres",
                Ok(Value::string("ab")),
            ),
            (
                "i := 0\nwhile i < 5: i += 1\ni",
                Ok(Value::number(5)),
            ),
            (
                "xs := []\nfor x <- [3, 4]: xs ++= [x]\nxs",
                Ok(numbers(&[3, 4])),
            ),
            ("for x <- 3..1: missing\n1", Ok(Value::number(1))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_branch_scopes_do_not_leak() {
        let (result, _) = evaluate("if true then\n    inner := 1\ninner");
        assert!(matches!(
            result,
            Err(EvaluationError::UnboundName { ref name, .. }) if name.as_ref() == "inner"
        ));
    }

    #[test]
    fn test_templates() {
        let inputs = vec![
            ("i := 3\n`{i}`", Ok(Value::string("3"))),
            ("`a{1 + 2}b{\"c\"}`", Ok(Value::string("a3bc"))),
            ("`{[1, 2]}`", Ok(Value::string("[1, 2]"))),
        ];

        test_evaluation(inputs);
    }

    #[test]
    fn test_printing() {
        let (result, output) = evaluate("print 1\nprintln! \"two\"\nprint! 3\n[1, 2] |> print");
        assert_eq!(result, Ok(Value::unit()));
        assert_eq!(output, "1\ntwo\n3[1, 2]\n");
    }

    #[test]
    fn test_errors() {
        let (result, _) = evaluate("foo := 1\nbar");
        assert_eq!(
            result,
            Err(EvaluationError::UnboundName {
                name: "bar".into(),
                position: curry_lang_core::Position {
                    offset: 9,
                    line: 2,
                    column: 1
                }
            })
        );

        let (result, _) = evaluate("1 2");
        assert!(matches!(
            result,
            Err(EvaluationError::NotCallable { ref value, .. }) if value == "1"
        ));

        let (result, _) = evaluate("(a, b) := (1, 2, 3)");
        assert!(matches!(
            result,
            Err(EvaluationError::PatternMismatch { .. })
        ));

        let (result, _) = evaluate("(a, b) := 5");
        assert!(matches!(
            result,
            Err(EvaluationError::PatternMismatch { .. })
        ));

        let (result, _) = evaluate("if 1 then 2");
        assert!(matches!(result, Err(EvaluationError::TypeMismatch { .. })));

        let (result, _) = evaluate("for x <- 5: x");
        assert!(matches!(result, Err(EvaluationError::TypeMismatch { .. })));

        let (result, _) = evaluate("s += \"x\"");
        assert!(matches!(result, Err(EvaluationError::UnboundName { .. })));
    }

    #[test]
    fn test_recursion_limit() {
        let count = "count := fn n -> if n == 0 then 0 else count (n - 1)\n";

        let (result, _) = evaluate(&format!("{count}count 2000"));
        assert_eq!(result, Ok(Value::number(0)));

        let (result, _) = evaluate(&format!("{count}count 100000"));
        assert!(matches!(
            result,
            Err(EvaluationError::RecursionLimit { limit, .. }) if limit == MAX_CALL_DEPTH
        ));

        let (result, _) = evaluate(&format!("{count}count 100000\n1"));
        assert!(result.is_err());
    }

    #[test]
    fn test_dropping_the_evaluator_frees_the_global_scope() {
        let program = curry_lang_core::parse("f := fn x -> x\ng := fn -> f").unwrap();
        let mut output = Vec::new();
        let mut evaluator = Evaluator::new(&mut output);
        let globals = evaluator.globals.downgrade();

        evaluator.eval_program(&program).unwrap();
        assert!(globals.upgrade().is_some());

        drop(evaluator);
        assert!(globals.upgrade().is_none());
    }

    #[test]
    fn test_loop_scopes_holding_closures_are_collected() {
        let program =
            curry_lang_core::parse("for i <- 1..5000:\n    g := fn x -> x + i\n    g 1").unwrap();
        let mut output = Vec::new();
        let mut evaluator = Evaluator::new(&mut output);

        evaluator.eval_program(&program).unwrap();
        evaluator.scopes.collect();
        assert_eq!(evaluator.scopes.live(), 1);
    }

    #[test]
    fn test_captured_scopes_survive_collection() {
        let input = "add := fn a -> fn b -> a + b
inc := add 1
for i <- 1..3000:
    g := fn x -> x
inc 41";
        test_evaluation(vec![(input, Ok(Value::number(42)))]);
    }
}
