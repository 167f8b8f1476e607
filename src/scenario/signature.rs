//! Scenario signatures.

use std::fmt;

use serde::Serialize;

/// Separates the location prefix from the scenario title.
const TITLE_SEPARATOR: char = ':';
/// Separates the titled portion from an outline example row.
const ROW_SEPARATOR: char = '|';

/// Deterministic identifier of a scenario.
///
/// The format is `<location>:<title>` optionally followed by
/// `|<cell>|<cell>...` for a single scenario outline example row. The location
/// is the source file path relative to the feature root, without extension.
///
/// ```
/// use dependsload::scenario::Signature;
///
/// let sig = Signature::from_parts("setup/users", "Create Base User", &[]);
/// assert_eq!(sig.as_str(), "setup/users:Create Base User");
/// assert!(sig.matches_title("  create base user "));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Wrap a raw signature string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a signature from a location, a title and an optional example row.
    #[must_use]
    pub fn from_parts(location: &str, title: &str, row: &[String]) -> Self {
        let mut raw = format!("{location}{TITLE_SEPARATOR}{title}");
        for cell in row {
            raw.push(ROW_SEPARATOR);
            raw.push_str(cell);
        }
        Self(raw)
    }

    /// Borrow the raw signature.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The comparable title portion: the text before the first `|`, after the
    /// first `:`, trimmed.
    #[must_use]
    pub fn title(&self) -> &str {
        let titled = self
            .0
            .split_once(ROW_SEPARATOR)
            .map_or(self.0.as_str(), |(head, _)| head);
        titled
            .split_once(TITLE_SEPARATOR)
            .map_or("", |(_, title)| title)
            .trim()
    }

    /// Compare the title portion with `title`, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn matches_title(&self, title: &str) -> bool {
        self.title().to_lowercase() == title.trim().to_lowercase()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
