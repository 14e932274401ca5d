//! Command-line interface for Tripmatch matchmaking runs.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod match_cmd;

pub use error::CliError;
use match_cmd::MatchArgs;

pub(crate) const ARG_PARAMS: &str = "params";
pub(crate) const ARG_ITINERARIES_DB: &str = "itineraries-db";
pub(crate) const ARG_ITINERARIES_JSON: &str = "itineraries-json";
pub(crate) const ARG_STAGES: &str = "stages";
pub(crate) const ARG_TRACE: &str = "trace";
pub(crate) const ENV_PARAMS: &str = "TRIPMATCH_CMDS_MATCH_PARAMS_PATH";

/// Run the Tripmatch CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Match(args) => match_cmd::run_match(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tripmatch",
    about = "Match travellers with compatible trip itineraries",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Filter candidate itineraries against a traveller's trip parameters.
    Match(MatchArgs),
}

#[cfg(test)]
mod tests;
