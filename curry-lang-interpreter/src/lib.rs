pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod value;

#[cfg(test)]
mod prop_tests;

use std::io::Write;
use std::rc::Rc;

pub use error::{Error, ErrorKind};
pub use evaluator::Evaluator;
pub use value::{EvaluationError, Value};

/// Parses and evaluates `source`, writing printed output to `output`.
/// Returns the value of the last top-level statement.
pub fn run(source: &str, output: &mut dyn Write) -> Result<Rc<Value>, Error> {
    let program = curry_lang_core::parse(source)?;
    let mut evaluator = Evaluator::new(output);
    Ok(evaluator.eval_program(&program)?)
}
