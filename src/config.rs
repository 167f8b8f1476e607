//! Suite configuration.
//!
//! [`SuiteConfig`] carries everything the suite builder needs: where feature
//! directories live, which candidates are selected, and the context bound to
//! each candidate. It is produced by [`crate::cli`] once the configuration
//! layers are merged. A YAML file passed with `--config` is validated here
//! before it joins the merge.
//!
//! ```yaml
//! root: tests/features
//! groups: [smoke]
//! exclude_groups: [wip]
//! actor: AcceptanceTester
//! modules: [WebDriver, Db]
//! ```

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use miette::Diagnostic;
use ortho_config::OrthoError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scenario::ServiceBindings;

/// Default directory holding feature directories.
pub const DEFAULT_ROOT: &str = "features";

/// Errors raised while reading or merging configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    #[diagnostic(code(dependsload::config::read))]
    Read {
        /// Configuration file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid.
    #[error("invalid configuration in {path}")]
    #[diagnostic(
        code(dependsload::config::parse),
        help("see the keys accepted by SuiteConfig")
    )]
    Parse {
        /// Configuration file path.
        path: Utf8PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_saphyr::Error,
    },

    /// Discovered files, the environment or the command line could not be
    /// merged.
    #[error("failed to merge configuration layers")]
    #[diagnostic(code(dependsload::config::merge))]
    Merge(#[from] Arc<OrthoError>),
}

/// Settings for one suite build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Directory that dependency directories are resolved against.
    pub root: Utf8PathBuf,
    /// Suite paths, relative to `root`, whose scenarios are candidates. Empty
    /// means the whole root.
    pub paths: Vec<Utf8PathBuf>,
    /// Only candidates carrying one of these groups are selected.
    pub groups: Vec<String>,
    /// Candidates carrying one of these groups are dropped.
    pub exclude_groups: Vec<String>,
    /// Only candidates whose title contains this text are selected.
    pub filter: Option<String>,
    /// Actor bound to selected candidates.
    pub actor: Option<String>,
    /// Modules bound to selected candidates.
    pub modules: Vec<String>,
    /// Named services bound to selected candidates.
    pub services: IndexMap<String, String>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from(DEFAULT_ROOT),
            paths: Vec::new(),
            groups: Vec::new(),
            exclude_groups: Vec::new(),
            filter: None,
            actor: None,
            modules: Vec::new(),
            services: IndexMap::new(),
        }
    }
}

impl SuiteConfig {
    /// Create a configuration rooted at `root` with no filters.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the YAML is invalid or contains
    /// unknown keys.
    pub fn from_yaml(yaml: &str, origin: &Utf8Path) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: origin.to_owned(),
            source,
        })
    }

    /// Read a YAML configuration file as a merge layer.
    ///
    /// The file is checked against [`SuiteConfig`] first; the layer holds only
    /// the keys the file sets, so unset keys fall through to lower layers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn file_layer(path: &Utf8Path) -> Result<serde_json::Value, ConfigError> {
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml(&yaml, path)?;
        serde_saphyr::from_str(&yaml).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// The service bindings selected candidates run with.
    #[must_use]
    pub fn service_bindings(&self) -> ServiceBindings {
        ServiceBindings {
            services: self.services.clone(),
            modules: self.modules.clone(),
        }
    }
}
