mod runner;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use tracing::debug;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Program to run. Reads stdin when absent or `-`
    path: Option<PathBuf>,

    /// More logging, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Print the value of the last statement unless it is unit
    #[arg(long)]
    print_result: bool,

    /// Parse only and print the parsed program
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet, cli.log_level);

    let source = match read_source(cli.path.as_ref()) {
        Ok(source) => source,
        Err(err) => {
            let name = cli
                .path
                .as_ref()
                .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string());
            eprintln!("error: could not read {name}: {err}");
            return ExitCode::from(runner::EXIT_IO);
        }
    };
    debug!(bytes = source.len(), "read program");

    let options = runner::Options {
        check: cli.check,
        print_result: cli.print_result,
    };
    runner::execute(&source, &options)
}

fn read_source(path: Option<&PathBuf>) -> std::io::Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path),
        _ => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool, log_level: Option<LogLevel>) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}
