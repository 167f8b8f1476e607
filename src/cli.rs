//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands, and merges
//! the configuration layers (defaults, discovered files, an explicit
//! `--config` file, `DEPENDSLOAD_*` environment variables, command line) into
//! the [`SuiteConfig`] for a run.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use indexmap::IndexMap;
use ortho_config::declarative::LayerComposition;
use ortho_config::figment::{Figment, providers::Env};
use ortho_config::uncased::Uncased;
use ortho_config::{
    ConfigDiscovery, MergeComposer, OrthoConfig, OrthoError, OrthoMergeExt, OrthoResult,
    sanitize_value,
};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, DEFAULT_ROOT, SuiteConfig};

const CONFIG_ENV_VAR: &str = "DEPENDSLOAD_CONFIG_PATH";
const ENV_PREFIX: &str = "DEPENDSLOAD_";

/// Settings only the command line may supply.
const CLI_FIELDS: &[&str] = &[
    "root",
    "paths",
    "groups",
    "exclude_groups",
    "filter",
    "actor",
    "modules",
    "verbose",
];

/// Resolve `DependsLoad` directives between feature scenarios into an
/// ordered suite.
#[derive(Debug, Parser, Serialize, Deserialize, OrthoConfig)]
#[command(author, version, about, long_about = None)]
#[ortho_config(prefix = "DEPENDSLOAD")]
pub struct Cli {
    /// YAML configuration file layered over any discovered configuration.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip)]
    #[ortho_config(skip_cli)]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding the feature directories.
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_ROOT)]
    #[ortho_config(default = default_root())]
    pub root: Utf8PathBuf,

    /// Suite path, relative to the root, whose scenarios are candidates.
    #[arg(short, long = "path", value_name = "PATH")]
    #[ortho_config(merge_strategy = "append")]
    pub paths: Vec<Utf8PathBuf>,

    /// Only select scenarios carrying this group.
    #[arg(short, long = "group", value_name = "GROUP")]
    #[ortho_config(merge_strategy = "append")]
    pub groups: Vec<String>,

    /// Drop scenarios carrying this group.
    #[arg(short = 'x', long = "exclude-group", value_name = "GROUP")]
    #[ortho_config(merge_strategy = "append")]
    pub exclude_groups: Vec<String>,

    /// Only select scenarios whose title contains this text.
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Actor bound to selected scenarios and inherited by their dependencies.
    #[arg(long, value_name = "NAME")]
    pub actor: Option<String>,

    /// Module enabled for the actor.
    #[arg(long = "module", value_name = "NAME")]
    #[ortho_config(merge_strategy = "append")]
    pub modules: Vec<String>,

    /// Named services bound to selected scenarios. Configuration files only.
    #[arg(skip)]
    #[serde(default)]
    #[ortho_config(skip_cli)]
    pub services: IndexMap<String, String>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    #[ortho_config(default = false)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `plan` when omitted.
    ///
    /// `OrthoConfig` merging ignores this field; CLI parsing supplies it.
    #[serde(skip)]
    #[command(subcommand)]
    #[ortho_config(skip_cli)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Plan { json: false });
        }
        self
    }

    /// The suite settings carried by these (merged) values.
    #[must_use]
    pub fn suite_config(&self) -> SuiteConfig {
        SuiteConfig {
            root: self.root.clone(),
            paths: self.paths.clone(),
            groups: self.groups.clone(),
            exclude_groups: self.exclude_groups.clone(),
            filter: self.filter.clone(),
            actor: self.actor.clone(),
            modules: self.modules.clone(),
            services: self.services.clone(),
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            root: default_root(),
            paths: Vec::new(),
            groups: Vec::new(),
            exclude_groups: Vec::new(),
            filter: None,
            actor: None,
            modules: Vec::new(),
            services: IndexMap::new(),
            verbose: false,
            command: None,
        }
        .with_default_command()
    }
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Commands {
    /// Print the resolved execution order `default`.
    Plan {
        /// Emit the plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the dependency graph in DOT format.
    Graph,

    /// Resolve the suite and report only success or failure.
    Check,
}

fn default_root() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_ROOT)
}

/// Parse CLI arguments.
///
/// Returns both the parsed CLI struct and the `ArgMatches` required for
/// configuration merging.
///
/// # Errors
///
/// Returns a `clap::Error` when parsing fails.
pub fn parse_from<I, T>(iter: I) -> Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = Cli::command();
    let matches = command.try_get_matches_from_mut(iter)?;
    // Clone matches before from_arg_matches_mut consumes the values.
    let matches_for_merge = matches.clone();
    let mut matches_for_parse = matches;
    let cli = Cli::from_arg_matches_mut(&mut matches_for_parse)
        .map_err(|err| err.with_cmd(&command))?;
    Ok((cli, matches_for_merge))
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
}

fn config_discovery() -> ConfigDiscovery {
    ConfigDiscovery::builder("dependsload")
        .env_var(CONFIG_ENV_VAR)
        .build()
}

fn is_empty_value(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Object(map) if map.is_empty())
}

fn cli_overrides_from_matches(cli: &Cli, matches: &ArgMatches) -> OrthoResult<serde_json::Value> {
    let mut map = match sanitize_value(cli)? {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(Arc::new(OrthoError::Validation {
                key: String::from("cli"),
                message: format!("expected parsed CLI values to serialize to an object, got {other:?}"),
            }));
        }
    };

    map.remove("command");
    map.remove("services");
    for field in CLI_FIELDS {
        if matches.value_source(field) != Some(ValueSource::CommandLine) {
            map.remove(*field);
        }
    }
    Ok(serde_json::Value::Object(map))
}

/// Merge configuration layers over the parsed CLI values.
///
/// Scalars from higher layers replace lower ones; suite paths, groups,
/// excluded groups and modules append in layer order.
///
/// # Errors
///
/// Returns [`ConfigError`] when the `--config` file cannot be read or parsed,
/// or when layer composition or merging fails.
pub fn merge_with_config(cli: &Cli, matches: &ArgMatches) -> Result<Cli, ConfigError> {
    let mut errors = Vec::new();
    let mut composer = MergeComposer::with_capacity(5);

    match sanitize_value(&Cli::default()) {
        Ok(value) => composer.push_defaults(value),
        Err(err) => errors.push(err),
    }

    let mut file_layers = config_discovery().compose_layers();
    errors.append(&mut file_layers.required_errors);
    if file_layers.value.is_empty() {
        errors.append(&mut file_layers.optional_errors);
    }
    for layer in file_layers.value {
        composer.push_layer(layer);
    }
    if let Some(path) = &cli.config {
        composer.push_file(SuiteConfig::file_layer(path)?, None);
    }

    let env_provider = env_provider()
        .map(|key| Uncased::new(key.as_str().to_ascii_uppercase()))
        .split("__");
    match Figment::from(env_provider)
        .extract::<serde_json::Value>()
        .into_ortho_merge()
    {
        Ok(value) => composer.push_environment(value),
        Err(err) => errors.push(err),
    }

    match cli_overrides_from_matches(cli, matches) {
        Ok(value) if !is_empty_value(&value) => composer.push_cli(value),
        Ok(_) => {}
        Err(err) => errors.push(err),
    }

    let composition = LayerComposition::new(composer.layers(), errors);
    let mut merged = composition.into_merge_result(Cli::merge_from_layers)?;
    merged.config.clone_from(&cli.config);
    merged.command.clone_from(&cli.command);
    Ok(merged)
}
