use std::io::Write;

use curry_lang_core::Position;
use curry_lang_interpreter::{Error, ErrorKind, Value};
use tracing::debug;

pub const EXIT_IO: u8 = 1;
pub const EXIT_STATIC: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;

pub struct Options {
    pub check: bool,
    pub print_result: bool,
}

/// Runs `source` against stdout, reporting any error on stderr.
pub fn execute(source: &str, options: &Options) -> std::process::ExitCode {
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    match execute_with(source, options, &mut stdout) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            std::process::ExitCode::from(exit_code(&err))
        }
    }
}

pub fn exit_code(err: &Error) -> u8 {
    if err.kind.is_static() {
        EXIT_STATIC
    } else {
        EXIT_RUNTIME
    }
}

fn execute_with(source: &str, options: &Options, output: &mut dyn Write) -> Result<(), Error> {
    if options.check {
        let program = curry_lang_core::parse(source)?;
        debug!(statements = program.statements.len(), "parsed program");
        return write!(output, "{program}").map_err(output_error);
    }

    let value = curry_lang_interpreter::run(source, output)?;
    if options.print_result && !matches!(value.as_ref(), Value::Unit) {
        writeln!(output, "{value}").map_err(output_error)?;
    }
    Ok(())
}

fn output_error(err: std::io::Error) -> Error {
    Error {
        kind: ErrorKind::Output,
        message: err.to_string(),
        position: Position::default(),
    }
}
