use std::rc::Rc;

use curry_lang_core::Position;

use crate::evaluator::Evaluator;
use crate::value::{Builtin, BuiltinFn, EvaluationError, Value};

fn unexpected_number_of_arguments_error(
    name: &'static str,
    expected: usize,
    got: usize,
    position: Position,
) -> EvaluationError {
    EvaluationError::WrongArgumentCount {
        name,
        expected,
        actual: got,
        position,
    }
}

fn unexpected_argument_type_error(
    name: &str,
    expected: &str,
    got: &Value,
    position: Position,
) -> EvaluationError {
    EvaluationError::type_mismatch(
        format!("`{}` expects {}, got {}", name, expected, got.type_name()),
        position,
    )
}

fn expect_arguments<const N: usize>(
    name: &'static str,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<[Rc<Value>; N], EvaluationError> {
    let got = args.len();
    args.try_into()
        .map_err(|_| unexpected_number_of_arguments_error(name, N, got, position))
}

fn builtin_map(
    evaluator: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [sequence, function] = expect_arguments("map", args, position)?;
    let Some(elements) = sequence.elements() else {
        return Err(unexpected_argument_type_error(
            "map",
            "a list or range",
            &sequence,
            position,
        ));
    };

    let mut mapped = Vec::new();
    for element in elements {
        mapped.push(evaluator.apply(function.clone(), vec![element], position)?);
    }
    Ok(Value::list(mapped))
}

fn builtin_join(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [sequence, separator] = expect_arguments("join", args, position)?;
    let Value::String(separator) = separator.as_ref() else {
        return Err(unexpected_argument_type_error(
            "join",
            "a string separator",
            &separator,
            position,
        ));
    };
    let Some(elements) = sequence.elements() else {
        return Err(unexpected_argument_type_error(
            "join",
            "a list or range",
            &sequence,
            position,
        ));
    };

    let joined = elements
        .map(|element| element.to_string())
        .collect::<Vec<String>>()
        .join(&**separator);
    Ok(Value::string(joined))
}

fn print_with(
    evaluator: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
    name: &'static str,
    terminator: &str,
) -> Result<Rc<Value>, EvaluationError> {
    let [value] = expect_arguments(name, args, position)?;
    evaluator.write_output(&format!("{}{}", value, terminator), position)?;
    Ok(Value::unit())
}

fn builtin_print(
    evaluator: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    print_with(evaluator, args, position, "print", "\n")
}

fn builtin_println(
    evaluator: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    print_with(evaluator, args, position, "println!", "\n")
}

fn builtin_print_inline(
    evaluator: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    print_with(evaluator, args, position, "print!", "")
}

fn builtin_range(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [low, high] = expect_arguments("range", args, position)?;
    match (low.as_ref(), high.as_ref()) {
        (Value::Number(low), Value::Number(high)) => Ok(Value::range(*low, *high)),
        (Value::Number(_), other) | (other, _) => Err(unexpected_argument_type_error(
            "range",
            "number bounds",
            other,
            position,
        )),
    }
}

fn builtin_reverse(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [sequence] = expect_arguments("reverse", args, position)?;
    if let Value::String(s) = sequence.as_ref() {
        return Ok(Value::string(s.chars().rev().collect::<String>()));
    }
    match sequence.elements() {
        Some(elements) => {
            let mut reversed: Vec<Rc<Value>> = elements.collect();
            reversed.reverse();
            Ok(Value::list(reversed))
        }
        None => Err(unexpected_argument_type_error(
            "reverse",
            "a list, range or string",
            &sequence,
            position,
        )),
    }
}

fn builtin_len(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [value] = expect_arguments("len", args, position)?;
    match value.as_ref() {
        Value::String(s) => Ok(Value::number(s.chars().count() as i64)),
        Value::List(values) | Value::Tuple(values) => Ok(Value::number(values.len() as i64)),
        Value::Range { low, high } if high < low => Ok(Value::number(0)),
        Value::Range { low, high } => high
            .checked_sub(*low)
            .and_then(|width| width.checked_add(1))
            .map(Value::number)
            .ok_or(EvaluationError::ArithmeticOverflow { position }),
        other => Err(unexpected_argument_type_error(
            "len",
            "a string, list or range",
            other,
            position,
        )),
    }
}

fn builtin_first(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [sequence] = expect_arguments("first", args, position)?;
    match sequence.elements() {
        Some(mut elements) => Ok(elements.next().unwrap_or_else(Value::unit)),
        None => Err(unexpected_argument_type_error(
            "first",
            "a list or range",
            &sequence,
            position,
        )),
    }
}

fn builtin_last(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [sequence] = expect_arguments("last", args, position)?;
    match sequence.as_ref() {
        Value::List(values) | Value::Tuple(values) => {
            Ok(values.last().cloned().unwrap_or_else(Value::unit))
        }
        Value::Range { low, high } if low <= high => Ok(Value::number(*high)),
        Value::Range { .. } => Ok(Value::unit()),
        other => Err(unexpected_argument_type_error(
            "last",
            "a list or range",
            other,
            position,
        )),
    }
}

fn builtin_push(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [list, value] = expect_arguments("push", args, position)?;
    match list.as_ref() {
        Value::List(values) => {
            let mut new_list = values.clone();
            new_list.push(value);
            Ok(Value::list(new_list))
        }
        other => Err(unexpected_argument_type_error(
            "push",
            "a list",
            other,
            position,
        )),
    }
}

fn builtin_tail(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [sequence] = expect_arguments("tail", args, position)?;
    match sequence.elements() {
        Some(elements) => Ok(Value::list(elements.skip(1).collect())),
        None => Err(unexpected_argument_type_error(
            "tail",
            "a list or range",
            &sequence,
            position,
        )),
    }
}

fn builtin_to_string(
    _: &mut Evaluator,
    args: Vec<Rc<Value>>,
    position: Position,
) -> Result<Rc<Value>, EvaluationError> {
    let [value] = expect_arguments("to_string", args, position)?;
    Ok(Value::string(value.to_string()))
}

fn builtin(name: &'static str, arity: usize, func: BuiltinFn) -> Builtin {
    Builtin {
        name,
        arity,
        func,
        bound: Vec::new(),
    }
}

/// Builtins are resolved after every user scope, so user bindings shadow them.
pub(crate) fn map_builtins(name: &str) -> Option<Builtin> {
    match name {
        "map" => Some(builtin("map", 2, builtin_map)),
        "join" => Some(builtin("join", 2, builtin_join)),
        "print" => Some(builtin("print", 1, builtin_print)),
        "println!" => Some(builtin("println!", 1, builtin_println)),
        "print!" => Some(builtin("print!", 1, builtin_print_inline)),
        "range" => Some(builtin("range", 2, builtin_range)),
        "reverse" => Some(builtin("reverse", 1, builtin_reverse)),
        "len" => Some(builtin("len", 1, builtin_len)),
        "first" => Some(builtin("first", 1, builtin_first)),
        "last" => Some(builtin("last", 1, builtin_last)),
        "push" => Some(builtin("push", 2, builtin_push)),
        "tail" => Some(builtin("tail", 1, builtin_tail)),
        "to_string" => Some(builtin("to_string", 1, builtin_to_string)),
        _ => None,
    }
}
