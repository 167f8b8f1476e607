//! Dependency directive parsing.
//!
//! A scenario declares a dependency by carrying a tag of the form
//! `DependsLoad <dir>:<scenario title>`. The keyword is matched
//! case-insensitively, the directory is a bare word and the title may contain
//! word characters, whitespace and double quotes. Tags that do not match are
//! ordinary tags and pass through untouched.
//!
//! # Examples
//!
//! ```
//! use dependsload::directive::{DependencyDirective, parse};
//!
//! let tags = ["smoke", "DependsLoad setup:Create Base User"];
//! let directives = parse(tags);
//! assert_eq!(
//!     directives,
//!     vec![DependencyDirective::new("setup", "Create Base User")],
//! );
//! ```

use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

#[expect(
    clippy::expect_used,
    reason = "the directive pattern is a literal and always compiles"
)]
static DIRECTIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?ims)^DependsLoad\s+(\w+):([\w\s"]*)$"#).expect("valid directive pattern")
});

/// A dependency on the scenario titled `scenario_title` in `directory`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyDirective {
    /// Directory name relative to the configured feature root.
    pub directory: String,
    /// Title of the scenario being depended on, whitespace-trimmed.
    pub scenario_title: String,
}

impl DependencyDirective {
    /// Construct a directive from its parts.
    #[must_use]
    pub fn new(directory: impl Into<String>, scenario_title: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            scenario_title: scenario_title.into(),
        }
    }
}

/// Extract every dependency directive carried by `tags`.
///
/// Identical tags are considered once. A single tag may hold several
/// directives on separate lines; they are returned in the order found.
#[must_use]
pub fn parse<I, S>(tags: I) -> Vec<DependencyDirective>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().to_owned())
        .unique()
        .flat_map(|tag| parse_tag(&tag))
        .collect()
}

fn parse_tag(tag: &str) -> Vec<DependencyDirective> {
    DIRECTIVE_PATTERN
        .captures_iter(tag)
        .filter_map(|caps| {
            let directory = caps.get(1)?.as_str();
            let title = caps.get(2)?.as_str().trim();
            Some(DependencyDirective::new(directory, title))
        })
        .collect()
}
