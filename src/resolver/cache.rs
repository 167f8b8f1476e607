//! Per-run cache of loaded dependency directories.

use std::collections::HashMap;

use crate::scenario::ScenarioId;

/// Maps a root-relative directory to the scenarios loaded from it.
///
/// Entries live for one suite build; a directory is scanned at most once.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    entries: HashMap<String, Vec<ScenarioId>>,
}

impl DirectoryCache {
    /// Scenarios previously loaded for `directory`.
    #[must_use]
    pub fn get(&self, directory: &str) -> Option<&[ScenarioId]> {
        self.entries.get(directory).map(Vec::as_slice)
    }

    /// Remember the scenarios loaded for `directory`.
    pub fn insert(&mut self, directory: impl Into<String>, scenarios: Vec<ScenarioId>) {
        self.entries.insert(directory.into(), scenarios);
    }
}
