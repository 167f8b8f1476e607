//! Suite construction.
//!
//! [`build_suite`] loads the candidate scenarios for a run, applies the group
//! and title filters, binds each selected candidate to the suite context and
//! hands it to a fresh [`Resolver`]. The result is a [`SuitePlan`]: every
//! selected scenario and its dependency closure, each exactly once, with
//! dependencies first.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SuiteConfig;
use crate::directive;
use crate::loader::{LoaderError, ScenarioLoader};
use crate::resolver::{ResolveError, Resolver};
use crate::scenario::{Scenario, ScenarioId, Signature};

/// Errors that abort a suite build.
#[derive(Debug, Error, Diagnostic)]
pub enum SuiteError {
    /// A suite path could not be loaded.
    #[error("failed to load suite path {path}")]
    #[diagnostic(code(dependsload::suite::load))]
    Load {
        /// Suite path that failed.
        path: Utf8PathBuf,
        /// Underlying loader error.
        #[source]
        #[diagnostic_source]
        source: LoaderError,
    },

    /// Dependency resolution failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),
}

/// The finalised, dependency-ordered list of scenarios for one run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct SuitePlan {
    scenarios: Vec<Scenario>,
}

impl SuitePlan {
    /// Wrap an already ordered list.
    #[must_use]
    pub const fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    /// Scenarios in execution order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Mutable access for the test runner's hooks.
    pub fn scenarios_mut(&mut self) -> &mut [Scenario] {
        &mut self.scenarios
    }

    /// Signatures in execution order.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.scenarios.iter().map(Scenario::signature)
    }

    /// Index of the scenario with `signature`.
    #[must_use]
    pub fn position_of(&self, signature: &Signature) -> Option<usize> {
        self.scenarios
            .iter()
            .position(|s| s.signature() == signature)
    }

    /// The scenario with `signature`.
    #[must_use]
    pub fn get(&self, signature: &Signature) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.signature() == signature)
    }

    /// Number of scenarios.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the plan is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// Why a candidate was left out of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rejection {
    NotInGroups,
    ExcludedGroup,
    TitleFilter,
}

fn select(config: &SuiteConfig, scenario: &Scenario) -> Result<(), Rejection> {
    let groups = scenario.groups();
    if !config.groups.is_empty() && !config.groups.iter().any(|g| groups.contains(g)) {
        return Err(Rejection::NotInGroups);
    }
    if config.exclude_groups.iter().any(|g| groups.contains(g)) {
        return Err(Rejection::ExcludedGroup);
    }
    if let Some(filter) = &config.filter {
        if !scenario
            .title()
            .to_lowercase()
            .contains(&filter.to_lowercase())
        {
            return Err(Rejection::TitleFilter);
        }
    }
    Ok(())
}

fn bind_context(config: &SuiteConfig, scenario: &mut Scenario) {
    scenario.set_current_actor(config.actor.clone());
    scenario.set_services(config.service_bindings());
}

/// Build the ordered suite described by `config`.
///
/// # Errors
///
/// Returns [`SuiteError`] when a suite path cannot be loaded or any selected
/// scenario's dependency closure cannot be resolved. No partial plan is
/// produced.
pub fn build_suite<L>(config: &SuiteConfig, loader: &L) -> Result<SuitePlan, SuiteError>
where
    L: ScenarioLoader + ?Sized,
{
    let mut resolver =
        Resolver::new(config.root.clone(), loader).with_filter_groups(config.groups.clone());

    let suite_paths = if config.paths.is_empty() {
        vec![Utf8PathBuf::new()]
    } else {
        config.paths.clone()
    };

    let mut candidates: Vec<ScenarioId> = Vec::new();
    for relative in suite_paths {
        let ids = resolver
            .load(&relative)
            .map_err(|source| SuiteError::Load {
                path: config.root.join(&relative),
                source,
            })?;
        candidates.extend(ids);
    }

    let mut selected = 0_usize;
    for id in candidates {
        if resolver.state().is_admitted(id) {
            continue;
        }
        let Some(scenario) = resolver.scenario_mut(id) else {
            continue;
        };
        scenario.preload();
        if let Err(rejection) = select(config, scenario) {
            debug!(signature = %scenario.signature(), ?rejection, "candidate not selected");
            continue;
        }
        selected += 1;
        bind_context(config, scenario);
        let directives = directive::parse(scenario.tags());
        if directives.is_empty() {
            resolver.admit(id)?;
        } else {
            resolver.resolve(id, &directives)?;
        }
    }

    let plan = SuitePlan::new(resolver.finish());
    info!(
        selected,
        scheduled = plan.len(),
        "suite resolved"
    );
    Ok(plan)
}
