//! Scenario records and their mutable metadata.
//!
//! A [`Scenario`] is produced by a [`ScenarioLoader`](crate::loader::ScenarioLoader)
//! and owned by a [`ScenarioStore`] while a suite is being resolved. All
//! mutation of groups, dependencies, skip state and context bindings goes
//! through the accessor methods on the owning scenario.

mod signature;
mod store;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

pub use signature::Signature;
pub use store::{ScenarioId, ScenarioStore};

/// Runtime context shared with dependency scenarios.
///
/// The bag is opaque to the resolver: it is captured from the scenario that
/// pulls a dependency in and copied onto that dependency verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ServiceBindings {
    /// Named service references, for example a container or dispatcher id.
    pub services: IndexMap<String, String>,
    /// Modules enabled for the scenario's actor.
    pub modules: Vec<String>,
}

impl ServiceBindings {
    /// Return `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.modules.is_empty()
    }
}

/// Mutable per-scenario state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    groups: IndexSet<String>,
    dependencies: Vec<Signature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actor: Option<String>,
    #[serde(skip_serializing_if = "ServiceBindings::is_empty")]
    services: ServiceBindings,
}

/// One behaviour scenario loaded from a feature file.
#[derive(Clone, Debug, Serialize)]
pub struct Scenario {
    signature: Signature,
    title: String,
    file: Utf8PathBuf,
    directory: Vec<String>,
    line: usize,
    #[serde(skip)]
    tags: Vec<String>,
    #[serde(skip)]
    preloaded: bool,
    #[serde(flatten)]
    metadata: Metadata,
}

/// Source location and raw content used to construct a [`Scenario`].
#[derive(Clone, Debug)]
pub struct ScenarioSource {
    /// Feature file the scenario was read from.
    pub file: Utf8PathBuf,
    /// File path relative to the feature root, without the extension.
    pub location: String,
    /// Scenario title as written.
    pub title: String,
    /// One-based line of the scenario keyword.
    pub line: usize,
    /// Raw tags, feature-level tags first.
    pub tags: Vec<String>,
    /// Outline example row, empty for plain scenarios.
    pub row: Vec<String>,
}

impl Scenario {
    /// Build a scenario from its source description.
    ///
    /// The directory is taken from the parent segments of `location`.
    #[must_use]
    pub fn new(source: ScenarioSource) -> Self {
        let ScenarioSource {
            file,
            location,
            title,
            line,
            tags,
            row,
        } = source;
        let signature = Signature::from_parts(&location, &title, &row);
        let directory = Utf8Path::new(&location)
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .map(|c| c.as_str().to_owned())
                    .collect()
            })
            .unwrap_or_default();
        Self {
            signature,
            title,
            file,
            directory,
            line,
            tags,
            preloaded: false,
            metadata: Metadata::default(),
        }
    }

    /// The scenario's unique signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The scenario title as written in the feature file.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Source file the scenario was read from.
    #[must_use]
    pub fn filename(&self) -> &Utf8Path {
        &self.file
    }

    /// One-based line of the scenario keyword.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Directory segments relative to the feature root.
    #[must_use]
    pub fn directory(&self) -> &[String] {
        &self.directory
    }

    /// Raw tags as read from the feature file.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Materialise groups from the raw tags.
    ///
    /// Calling this more than once has no further effect, so groups replaced
    /// after preloading are kept.
    pub fn preload(&mut self) {
        if self.preloaded {
            return;
        }
        self.metadata.groups = self.tags.iter().cloned().collect();
        self.preloaded = true;
    }

    /// Groups attached to the scenario.
    #[must_use]
    pub const fn groups(&self) -> &IndexSet<String> {
        &self.metadata.groups
    }

    /// Replace the scenario's groups.
    pub fn set_groups<I, S>(&mut self, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.groups = groups.into_iter().map(Into::into).collect();
    }

    /// Signatures of the scenarios this one depends on, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[Signature] {
        &self.metadata.dependencies
    }

    /// Record the scenario's dependencies.
    pub fn set_dependencies(&mut self, dependencies: Vec<Signature>) {
        self.metadata.dependencies = dependencies;
    }

    /// Reason the scenario will be skipped, if any.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        self.metadata.skip.as_deref()
    }

    /// Mark the scenario as skipped.
    pub fn set_skip(&mut self, reason: impl Into<String>) {
        self.metadata.skip = Some(reason.into());
    }

    /// Clear a previously recorded skip.
    pub fn clear_skip(&mut self) {
        self.metadata.skip = None;
    }

    /// Actor the scenario runs as.
    #[must_use]
    pub fn current_actor(&self) -> Option<&str> {
        self.metadata.actor.as_deref()
    }

    /// Bind the actor the scenario runs as.
    pub fn set_current_actor(&mut self, actor: Option<String>) {
        self.metadata.actor = actor;
    }

    /// Service bindings the scenario runs with.
    #[must_use]
    pub const fn services(&self) -> &ServiceBindings {
        &self.metadata.services
    }

    /// Look up one named service.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&str> {
        self.metadata.services.services.get(name).map(String::as_str)
    }

    /// Replace the scenario's service bindings.
    pub fn set_services(&mut self, services: ServiceBindings) {
        self.metadata.services = services;
    }
}
