//! Error types for dependency resolution.

use camino::Utf8PathBuf;
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::loader::LoaderError;
use crate::scenario::{ScenarioId, Signature};

/// Fatal errors raised while resolving dependency directives.
///
/// Every variant aborts the suite build; nothing is retried.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// A directive names a directory that does not exist under the root.
    #[error(
        "{file}: DependsLoad - \"{directory}\" feature directory name is invalid or not available"
    )]
    #[diagnostic(
        code(dependsload::resolve::directory_not_found),
        help("make sure the directory exists under the feature root")
    )]
    DirectoryNotFound {
        /// Source file of the scenario declaring the directive.
        file: Utf8PathBuf,
        /// Directory named by the directive.
        directory: String,
    },

    /// No scenario in the directive's directory carries the requested title.
    #[error(
        "{file}: DependsLoad - \"{title}\" is invalid or not available in specified \"{directory}\" feature directory"
    )]
    #[diagnostic(
        code(dependsload::resolve::dependency_not_found),
        help("make sure the directory and scenario exist")
    )]
    DependencyNotFound {
        /// Source file of the scenario declaring the directive.
        file: Utf8PathBuf,
        /// Scenario title named by the directive.
        title: String,
        /// Directory named by the directive.
        directory: String,
    },

    /// Following directives leads back to a scenario still being resolved.
    #[error("circular dependency detected: {}", cycle.iter().join(" -> "))]
    #[diagnostic(code(dependsload::resolve::cyclic_dependency))]
    CyclicDependency {
        /// The cycle, starting and ending with the same signature.
        cycle: Vec<Signature>,
    },

    /// A dependency directory exists but could not be loaded.
    #[error("{file}: failed to load feature directory \"{directory}\"")]
    #[diagnostic(code(dependsload::resolve::load))]
    Load {
        /// Source file of the scenario declaring the directive.
        file: Utf8PathBuf,
        /// Directory named by the directive.
        directory: String,
        /// Underlying loader error.
        #[source]
        source: LoaderError,
    },

    /// An identity not owned by the resolver's store was used.
    #[error("unknown scenario {0}")]
    #[diagnostic(code(dependsload::resolve::unknown_scenario))]
    UnknownScenario(ScenarioId),
}
