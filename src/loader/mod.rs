//! Scenario discovery.
//!
//! [`ScenarioLoader`] is the seam between the resolver and whatever produces
//! scenarios. [`FeatureLoader`] is the filesystem implementation: it walks a
//! directory for `.feature` files (extension matched case-insensitively,
//! dot files skipped) and reads the scenarios they declare.

mod feature;

use std::fs;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::scenario::Scenario;

/// Extension identifying feature files.
const FEATURE_EXTENSION: &str = "feature";

/// Errors raised while loading scenarios from a directory.
#[derive(Debug, Error, Diagnostic)]
pub enum LoaderError {
    /// The requested path does not name a directory.
    #[error("{path} is not a directory")]
    #[diagnostic(code(dependsload::loader::not_a_directory))]
    NotADirectory {
        /// Path that was requested.
        path: Utf8PathBuf,
    },

    /// Walking the directory tree failed.
    #[error("failed to walk {path}")]
    #[diagnostic(code(dependsload::loader::walk))]
    Walk {
        /// Directory being walked.
        path: Utf8PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// A discovered path is not valid UTF-8.
    #[error("feature path {path:?} is not valid UTF-8")]
    #[diagnostic(code(dependsload::loader::non_utf8_path))]
    NonUtf8Path {
        /// Offending path.
        path: PathBuf,
    },

    /// A feature file could not be read.
    #[error("failed to read {path}")]
    #[diagnostic(code(dependsload::loader::read))]
    Read {
        /// Feature file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A feature file is malformed.
    #[error("{path}:{line}: {message}")]
    #[diagnostic(code(dependsload::loader::syntax))]
    Syntax {
        /// Feature file path.
        path: Utf8PathBuf,
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

/// Produces the scenarios found under a directory.
pub trait ScenarioLoader {
    /// Load every scenario under `path`, recursively.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::NotADirectory`] when `path` is not a directory,
    /// or another [`LoaderError`] when a file cannot be read or parsed.
    fn load_directory(&self, path: &Utf8Path) -> Result<Vec<Scenario>, LoaderError>;
}

/// Loads scenarios from `.feature` files on disk.
///
/// Signatures are derived from each file's path relative to `root`.
#[derive(Clone, Debug)]
pub struct FeatureLoader {
    root: Utf8PathBuf,
}

impl FeatureLoader {
    /// Create a loader whose signatures are relative to `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn location(&self, file: &Utf8Path) -> String {
        let relative = file.strip_prefix(&self.root).unwrap_or(file);
        relative
            .with_extension("")
            .components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn load_file(&self, file: &Utf8Path) -> Result<Vec<Scenario>, LoaderError> {
        let text = fs::read_to_string(file).map_err(|source| LoaderError::Read {
            path: file.to_owned(),
            source,
        })?;
        let location = self.location(file);
        let sources =
            feature::read_feature(&text, file, &location).map_err(|err| LoaderError::Syntax {
                path: file.to_owned(),
                line: err.line,
                message: err.message,
            })?;
        Ok(sources.into_iter().map(Scenario::new).collect())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_feature_file(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(FEATURE_EXTENSION))
}

impl ScenarioLoader for FeatureLoader {
    fn load_directory(&self, path: &Utf8Path) -> Result<Vec<Scenario>, LoaderError> {
        if !path.is_dir() {
            return Err(LoaderError::NotADirectory {
                path: path.to_owned(),
            });
        }
        let mut scenarios = Vec::new();
        let walker = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry = entry.map_err(|source| LoaderError::Walk {
                path: path.to_owned(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|raw| LoaderError::NonUtf8Path { path: raw })?;
            if !is_feature_file(&file) {
                continue;
            }
            let loaded = self.load_file(&file)?;
            debug!(file = %file, scenarios = loaded.len(), "loaded feature file");
            scenarios.extend(loaded);
        }
        Ok(scenarios)
    }
}
