//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use dependsload::{cli, runner};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let (cli, matches) = match cli::parse_from(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    };
    let cli = cli.with_default_command();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    };
    fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();
    match runner::run(&cli, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("dependsload failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
