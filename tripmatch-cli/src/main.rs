//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match tripmatch_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(tripmatch_cli::CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => report(&err),
    }
}

#[expect(clippy::print_stderr, reason = "fatal errors are reported on stderr")]
fn report(err: &tripmatch_cli::CliError) -> ExitCode {
    eprintln!("tripmatch: {err}");
    ExitCode::FAILURE
}
