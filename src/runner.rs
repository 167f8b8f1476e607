//! CLI execution and command dispatch logic.
//!
//! This module keeps [`main`] minimal by providing a single entry point that
//! builds the suite and renders it for the requested command.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::ArgMatches;
use itertools::Itertools;
use tracing::{debug, info};

use crate::cli::{self, Cli, Commands};
use crate::graph;
use crate::loader::FeatureLoader;
use crate::suite::{SuitePlan, build_suite};

/// Execute the parsed [`Cli`] commands, writing to standard output.
///
/// # Errors
///
/// Returns an error if configuration cannot be read, the suite cannot be
/// resolved, or output cannot be written.
pub fn run(cli: &Cli, matches: &ArgMatches) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(cli, matches, &mut out)
}

/// Merge configuration over the parsed [`Cli`] and execute its command,
/// writing to `out`.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(cli: &Cli, matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let merged = cli::merge_with_config(cli, matches).context("loading configuration")?;
    let config = merged.suite_config();
    debug!(?config, "suite configuration");
    let loader = FeatureLoader::new(config.root.clone());
    let plan = build_suite(&config, &loader)
        .with_context(|| format!("resolving suite under {}", config.root))?;

    match merged.command.unwrap_or(Commands::Plan { json: false }) {
        Commands::Plan { json: false } => write_plan(out, &plan)?,
        Commands::Plan { json: true } => {
            let json = serde_json::to_string_pretty(&plan).context("serialising plan")?;
            writeln!(out, "{json}").context("writing plan")?;
        }
        Commands::Graph => {
            out.write_all(graph::to_dot(&plan).as_bytes())
                .context("writing graph")?;
        }
        Commands::Check => {
            info!(scenarios = plan.len(), "suite resolved");
        }
    }
    Ok(())
}

/// Write one scenario per line in execution order, followed by the
/// signatures it depends on.
fn write_plan(out: &mut dyn Write, plan: &SuitePlan) -> Result<()> {
    for (idx, scenario) in plan.scenarios().iter().enumerate() {
        let position = idx + 1;
        let written = if scenario.dependencies().is_empty() {
            writeln!(out, "{position}. {}", scenario.signature())
        } else {
            writeln!(
                out,
                "{position}. {} (after {})",
                scenario.signature(),
                scenario.dependencies().iter().join(", ")
            )
        };
        written.context("writing plan")?;
    }
    Ok(())
}
