//! Dependency resolution.
//!
//! The [`Resolver`] walks a scenario's directives depth first. Each directive
//! names a directory, loaded on first use and cached for the rest of the run,
//! and a title matched against the signatures found there. Matched
//! dependencies are resolved before they are admitted, so the admission order
//! held in [`ResolutionState`] always lists a dependency before anything that
//! depends on it. Each scenario is admitted at most once.
//!
//! All state is owned by one resolver and discarded with it; building a new
//! suite means creating a new resolver.

mod cache;
mod cycle;
mod error;

use std::collections::HashSet;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use tracing::debug;

use crate::directive::{self, DependencyDirective};
use crate::loader::{LoaderError, ScenarioLoader};
use crate::scenario::{Scenario, ScenarioId, ScenarioStore, ServiceBindings, Signature};

use cache::DirectoryCache;
pub use error::ResolveError;

/// Admission order and active path of one suite build.
#[derive(Debug, Default)]
pub struct ResolutionState {
    admitted: IndexSet<ScenarioId>,
    chain: IndexSet<ScenarioId>,
}

impl ResolutionState {
    /// Whether `id` has been placed in the output.
    #[must_use]
    pub fn is_admitted(&self, id: ScenarioId) -> bool {
        self.admitted.contains(&id)
    }
}

/// Actor and service bindings handed down to dependencies.
#[derive(Clone, Debug, Default)]
struct ScenarioContext {
    actor: Option<String>,
    services: ServiceBindings,
}

impl ScenarioContext {
    fn capture(scenario: &Scenario) -> Self {
        Self {
            actor: scenario.current_actor().map(str::to_owned),
            services: scenario.services().clone(),
        }
    }

    fn apply(&self, scenario: &mut Scenario) {
        scenario.set_services(self.services.clone());
        scenario.set_current_actor(self.actor.clone());
    }
}

/// Resolves dependency directives into an ordered, deduplicated suite.
pub struct Resolver<'a, L: ScenarioLoader + ?Sized> {
    root: Utf8PathBuf,
    loader: &'a L,
    filter_groups: Vec<String>,
    store: ScenarioStore,
    cache: DirectoryCache,
    state: ResolutionState,
}

impl<'a, L: ScenarioLoader + ?Sized> Resolver<'a, L> {
    /// Create a resolver loading directories under `root` with `loader`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>, loader: &'a L) -> Self {
        Self {
            root: root.into(),
            loader,
            filter_groups: Vec::new(),
            store: ScenarioStore::new(),
            cache: DirectoryCache::default(),
            state: ResolutionState::default(),
        }
    }

    /// Replace the groups of every admitted scenario with `groups`.
    ///
    /// This keeps dependencies visible to group filtering even when their
    /// own tags do not carry the filtered group. An empty list disables the
    /// overwrite.
    #[must_use]
    pub fn with_filter_groups(mut self, groups: Vec<String>) -> Self {
        self.filter_groups = groups;
        self
    }

    /// Load every scenario under `relative`, a path below the resolver root.
    ///
    /// Each directory is scanned at most once per resolver. Loading the root
    /// itself also records every top-level directory it covered, so directives
    /// naming those directories reuse the scan.
    ///
    /// # Errors
    ///
    /// Propagates any [`LoaderError`].
    pub fn load(&mut self, relative: &Utf8Path) -> Result<Vec<ScenarioId>, LoaderError> {
        let key = cache_key(relative);
        if let Some(ids) = self.cache.get(&key) {
            debug!(directory = %key, "feature directory cache hit");
            return Ok(ids.to_vec());
        }
        let path = if key.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&key)
        };
        let loaded = self.loader.load_directory(&path)?;
        let ids: Vec<ScenarioId> = loaded
            .into_iter()
            .map(|scenario| self.store.intern(scenario))
            .collect();
        debug!(directory = %key, path = %path, scenarios = ids.len(), "loaded feature directory");
        if key.is_empty() {
            self.remember_top_level(&ids);
        }
        self.cache.insert(key, ids.clone());
        Ok(ids)
    }

    fn remember_top_level(&mut self, ids: &[ScenarioId]) {
        let mut by_directory: IndexMap<String, Vec<ScenarioId>> = IndexMap::new();
        for id in ids {
            let top = self
                .store
                .get(*id)
                .and_then(|scenario| scenario.directory().first());
            if let Some(top) = top {
                by_directory.entry(top.clone()).or_default().push(*id);
            }
        }
        for (directory, ids) in by_directory {
            if self.cache.get(&directory).is_none() {
                self.cache.insert(directory, ids);
            }
        }
    }

    /// Borrow a scenario held by the resolver.
    #[must_use]
    pub fn scenario(&self, id: ScenarioId) -> Option<&Scenario> {
        self.store.get(id)
    }

    /// Mutably borrow a scenario held by the resolver.
    #[must_use]
    pub fn scenario_mut(&mut self, id: ScenarioId) -> Option<&mut Scenario> {
        self.store.get_mut(id)
    }

    /// Current resolution state.
    #[must_use]
    pub const fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Place `id` in the output unless it is already there.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownScenario`] when `id` is not held by this
    /// resolver.
    pub fn admit(&mut self, id: ScenarioId) -> Result<(), ResolveError> {
        if self.state.is_admitted(id) {
            return Ok(());
        }
        let filter_groups = &self.filter_groups;
        let scenario = self
            .store
            .get_mut(id)
            .ok_or(ResolveError::UnknownScenario(id))?;
        scenario.preload();
        if !filter_groups.is_empty() {
            scenario.set_groups(filter_groups.iter().cloned());
        }
        debug!(signature = %scenario.signature(), "admitted scenario");
        self.state.admitted.insert(id);
        Ok(())
    }

    /// Resolve `directives` declared by `id`, admitting every dependency and
    /// then `id` itself.
    ///
    /// The direct dependency signatures are recorded on the scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when a directory or title cannot be found, a
    /// directory fails to load, or the directives form a cycle.
    pub fn resolve(
        &mut self,
        id: ScenarioId,
        directives: &[DependencyDirective],
    ) -> Result<(), ResolveError> {
        self.state.chain.insert(id);
        let resolved = self.resolve_directives(id, directives);
        self.state.chain.pop();
        let dependencies = resolved?;
        self.store
            .get_mut(id)
            .ok_or(ResolveError::UnknownScenario(id))?
            .set_dependencies(dependencies);
        self.admit(id)
    }

    /// Resolve each directive of `id`, returning its direct dependencies.
    ///
    /// A dependency takes `id`'s actor and services before its own directives
    /// are resolved, so the whole chain below a candidate runs in the
    /// candidate's context. Already admitted dependencies are recorded and
    /// rebound but not resolved again.
    fn resolve_directives(
        &mut self,
        id: ScenarioId,
        directives: &[DependencyDirective],
    ) -> Result<Vec<Signature>, ResolveError> {
        let (file, context) = {
            let scenario = self.store.get(id).ok_or(ResolveError::UnknownScenario(id))?;
            (
                scenario.filename().to_owned(),
                ScenarioContext::capture(scenario),
            )
        };
        let mut dependencies = Vec::new();
        let mut seen = HashSet::new();
        for directive in directives {
            for dep in self.matching(directive, &file)? {
                if !seen.insert(dep) {
                    continue;
                }
                self.check_cycle(dep)?;
                let nested = {
                    let scenario = self
                        .store
                        .get_mut(dep)
                        .ok_or(ResolveError::UnknownScenario(dep))?;
                    scenario.preload();
                    dependencies.push(scenario.signature().clone());
                    context.apply(scenario);
                    directive::parse(scenario.tags())
                };
                if self.state.is_admitted(dep) {
                    continue;
                }
                if nested.is_empty() {
                    self.admit(dep)?;
                } else {
                    debug!(dependency = %dep, directives = nested.len(), "resolving nested directives");
                    self.resolve(dep, &nested)?;
                }
            }
        }
        Ok(dependencies)
    }

    /// Find every scenario in the directive's directory whose title matches.
    fn matching(
        &mut self,
        directive: &DependencyDirective,
        file: &Utf8Path,
    ) -> Result<Vec<ScenarioId>, ResolveError> {
        let candidates = self.directory(&directive.directory, file)?;
        let matches: Vec<ScenarioId> = candidates
            .into_iter()
            .filter(|id| {
                self.store
                    .get(*id)
                    .is_some_and(|s| s.signature().matches_title(&directive.scenario_title))
            })
            .collect();
        if matches.is_empty() {
            return Err(ResolveError::DependencyNotFound {
                file: file.to_owned(),
                title: directive.scenario_title.clone(),
                directory: directive.directory.clone(),
            });
        }
        Ok(matches)
    }

    fn directory(&mut self, name: &str, file: &Utf8Path) -> Result<Vec<ScenarioId>, ResolveError> {
        self.load(Utf8Path::new(name)).map_err(|err| match err {
            LoaderError::NotADirectory { .. } => ResolveError::DirectoryNotFound {
                file: file.to_owned(),
                directory: name.to_owned(),
            },
            source => ResolveError::Load {
                file: file.to_owned(),
                directory: name.to_owned(),
                source,
            },
        })
    }

    fn check_cycle(&self, dep: ScenarioId) -> Result<(), ResolveError> {
        if !self.state.chain.contains(&dep) {
            return Ok(());
        }
        let path: Vec<Signature> = self
            .state
            .chain
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(|s| s.signature().clone())
            .collect();
        let reentered = self
            .store
            .get(dep)
            .ok_or(ResolveError::UnknownScenario(dep))?
            .signature()
            .clone();
        Err(ResolveError::CyclicDependency {
            cycle: cycle::close_cycle(&path, &reentered),
        })
    }

    /// Consume the resolver, returning admitted scenarios in admission order.
    #[must_use]
    pub fn finish(self) -> Vec<Scenario> {
        let Self { store, state, .. } = self;
        store.into_ordered(state.admitted)
    }
}

/// Normalise a root-relative path into its cache key, `/` separated.
fn cache_key(relative: &Utf8Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Utf8Component::Normal(segment) => Some(segment),
            _ => None,
        })
        .join("/")
}
