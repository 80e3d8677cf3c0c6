use std::{env, io, process::ExitCode};

use cfe::{
    driver,
    error::DriverError,
    options::{self, Invocation},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logs go to stderr, and only when `RUST_LOG` is set.
fn init_tracing() {
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();

    let options = match options::parse_arguments(env::args_os()) {
        Ok(Invocation::Help(text)) => {
            print!("{text}");
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Compile(options)) => options,
        Err(error) => {
            eprint!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    match driver::run(&options, &mut stdout) {
        Ok(summary) => {
            for failure in &summary.failures {
                eprintln!("error: {failure}");
            }
            if summary.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            if let DriverError::Lex { path, .. } = &error {
                eprintln!("error: failed to lex file with errors: '{}'", path.display());
            }
            eprintln!("{:?}", error.into_report());
            ExitCode::FAILURE
        }
    }
}
