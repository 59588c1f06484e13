//! # buildplan CLI
//!
//! This is the binary entry point for the `buildplan` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Reporting errors on stderr and mapping them to exit codes (see
//!   [`buildplan::exit_codes`]).
//!
//! The resolution logic lives in the `buildplan` library; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use std::process::ExitCode;

use buildplan::exit_codes;
use clap::Parser;

fn main() -> ExitCode {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are reported through the same path
            let _ = err.print();
            let code = if err.use_stderr() {
                exit_codes::USAGE
            } else {
                exit_codes::SUCCESS
            };
            return ExitCode::from(code);
        }
    };

    match cli.execute() {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::from(exit_codes::for_error(&err))
        }
    }
}
