//! Shared helpers for integration tests.
//!
//! Integration tests under `tests/` compile as independent crates. This module
//! is included via `mod common;` in individual test files to share fixtures and
//! helpers while keeping test modules small and avoiding duplication.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Checked-in feature tree used by the end-to-end tests.
pub const SAMPLE_FEATURES: &str = "tests/data/features";

/// A temporary feature root populated file by file.
pub struct FeatureTree {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl FeatureTree {
    /// Create an empty feature root.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp feature root")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow::anyhow!("non UTF-8 temp dir {}", p.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Write `body` to `rel` under the root, creating parent directories.
    pub fn feature(self, rel: &str, body: &str) -> Result<Self> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        fs::write(&path, body).with_context(|| format!("write {path}"))?;
        Ok(self)
    }

    /// The feature root.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}
