//! Line-oriented reader for the subset of feature-file syntax the resolver
//! needs: tags, features, scenarios and outline example tables.
//!
//! Tag lines are split on `@` rather than whitespace, so a single tag may
//! contain spaces. This is what allows directives such as
//! `@DependsLoad setup:Create Base User` to survive as one tag.

use camino::Utf8Path;

use crate::scenario::ScenarioSource;

/// A syntax problem found while reading a feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub(crate) line: usize,
    pub(crate) message: String,
}

impl SyntaxError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Keyword {
    Feature,
    Background,
    Rule,
    Scenario,
    Outline,
    Examples,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("Feature:", Keyword::Feature),
    ("Background:", Keyword::Background),
    ("Rule:", Keyword::Rule),
    ("Scenario Outline:", Keyword::Outline),
    ("Scenario Template:", Keyword::Outline),
    ("Scenario:", Keyword::Scenario),
    ("Example:", Keyword::Scenario),
    ("Examples:", Keyword::Examples),
    ("Scenarios:", Keyword::Examples),
];

fn split_keyword(line: &str) -> Option<(Keyword, &str)> {
    KEYWORDS.iter().find_map(|(prefix, keyword)| {
        line.strip_prefix(prefix)
            .map(|rest| (*keyword, rest.trim()))
    })
}

fn split_tags(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split('@')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.trim().trim_start_matches('|');
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_owned()).collect()
}

struct ExampleRow {
    cells: Vec<String>,
    tags: Vec<String>,
}

struct PendingScenario {
    title: String,
    line: usize,
    tags: Vec<String>,
    outline: bool,
    rows: Vec<ExampleRow>,
}

struct FeatureReader<'a> {
    file: &'a Utf8Path,
    location: &'a str,
    feature_seen: bool,
    feature_tags: Vec<String>,
    rule_tags: Vec<String>,
    pending_tags: Vec<String>,
    current: Option<PendingScenario>,
    examples: Option<ExamplesBlock>,
    docstring: Option<&'static str>,
    out: Vec<ScenarioSource>,
}

struct ExamplesBlock {
    tags: Vec<String>,
    header: Option<usize>,
}

impl<'a> FeatureReader<'a> {
    fn new(file: &'a Utf8Path, location: &'a str) -> Self {
        Self {
            file,
            location,
            feature_seen: false,
            feature_tags: Vec::new(),
            rule_tags: Vec::new(),
            pending_tags: Vec::new(),
            current: None,
            examples: None,
            docstring: None,
            out: Vec::new(),
        }
    }

    fn line(&mut self, number: usize, raw: &str) -> Result<(), SyntaxError> {
        let line = raw.trim();
        if let Some(delimiter) = self.docstring {
            if line.starts_with(delimiter) {
                self.docstring = None;
            }
            return Ok(());
        }
        for delimiter in ["\"\"\"", "```"] {
            if line.starts_with(delimiter) {
                self.docstring = Some(delimiter);
                return Ok(());
            }
        }
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        if line.starts_with('@') {
            self.pending_tags.extend(split_tags(line));
            return Ok(());
        }
        if let Some((keyword, rest)) = split_keyword(line) {
            return self.keyword(number, keyword, rest);
        }
        if line.starts_with('|') {
            return self.table_row(number, line);
        }
        Ok(())
    }

    fn keyword(&mut self, number: usize, keyword: Keyword, rest: &str) -> Result<(), SyntaxError> {
        if keyword == Keyword::Examples {
            let outline = self.current.as_ref().is_some_and(|s| s.outline);
            if !outline {
                return Err(SyntaxError::new(
                    number,
                    "examples block without a scenario outline",
                ));
            }
            self.examples = Some(ExamplesBlock {
                tags: std::mem::take(&mut self.pending_tags),
                header: None,
            });
            return Ok(());
        }

        self.flush();
        match keyword {
            Keyword::Feature => {
                if self.feature_seen {
                    return Err(SyntaxError::new(number, "more than one feature in file"));
                }
                self.feature_seen = true;
                self.feature_tags = std::mem::take(&mut self.pending_tags);
                self.rule_tags.clear();
            }
            Keyword::Rule => self.rule_tags = std::mem::take(&mut self.pending_tags),
            Keyword::Background => self.pending_tags.clear(),
            Keyword::Scenario | Keyword::Outline => {
                if !self.feature_seen {
                    return Err(SyntaxError::new(
                        number,
                        "scenario declared before the feature keyword",
                    ));
                }
                let mut tags = self.feature_tags.clone();
                tags.extend(self.rule_tags.iter().cloned());
                tags.append(&mut self.pending_tags);
                self.current = Some(PendingScenario {
                    title: rest.to_owned(),
                    line: number,
                    tags,
                    outline: keyword == Keyword::Outline,
                    rows: Vec::new(),
                });
            }
            Keyword::Examples => {}
        }
        Ok(())
    }

    fn table_row(&mut self, number: usize, line: &str) -> Result<(), SyntaxError> {
        let (Some(block), Some(current)) = (self.examples.as_mut(), self.current.as_mut()) else {
            // Step data tables carry nothing the resolver needs.
            return Ok(());
        };
        let cells = split_cells(line);
        match block.header {
            None => block.header = Some(cells.len()),
            Some(width) if width == cells.len() => current.rows.push(ExampleRow {
                cells,
                tags: block.tags.clone(),
            }),
            Some(width) => {
                return Err(SyntaxError::new(
                    number,
                    format!(
                        "examples row has {} cells but the header has {width}",
                        cells.len()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn flush(&mut self) {
        self.examples = None;
        let Some(pending) = self.current.take() else {
            return;
        };
        if pending.rows.is_empty() {
            let source = self.source(&pending, pending.tags.clone(), Vec::new());
            self.out.push(source);
            return;
        }
        for row in &pending.rows {
            let mut tags = pending.tags.clone();
            tags.extend(row.tags.iter().cloned());
            let source = self.source(&pending, tags, row.cells.clone());
            self.out.push(source);
        }
    }

    fn source(&self, pending: &PendingScenario, tags: Vec<String>, row: Vec<String>) -> ScenarioSource {
        ScenarioSource {
            file: self.file.to_owned(),
            location: self.location.to_owned(),
            title: pending.title.clone(),
            line: pending.line,
            tags,
            row,
        }
    }

    fn finish(mut self) -> Vec<ScenarioSource> {
        self.flush();
        self.out
    }
}

/// Read every scenario declared in `text`.
///
/// `file` is recorded on each scenario as its source and `location` becomes
/// the signature prefix.
pub(crate) fn read_feature(
    text: &str,
    file: &Utf8Path,
    location: &str,
) -> Result<Vec<ScenarioSource>, SyntaxError> {
    let mut reader = FeatureReader::new(file, location);
    for (idx, raw) in text.lines().enumerate() {
        reader.line(idx + 1, raw)?;
    }
    Ok(reader.finish())
}
