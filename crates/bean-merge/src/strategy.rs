//! Strategy tags and the path-keyed table that selects them.

use std::fmt;

/// How two values found at the same path are combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Right value supersedes left entirely.
    Replace,
    /// Sequences concatenated, left then right. No de-duplication.
    Append,
    /// Mappings merged key by key, recursing with the same table.
    Merge,
    /// Sequences of records paired by a match key; see [`MatchRule`].
    MatchReplace(MatchRule),
}

impl Strategy {
    /// Stable tag used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::Replace => "replace",
            Strategy::Append => "append",
            Strategy::Merge => "merge",
            Strategy::MatchReplace(_) => "match-then-replace",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Pairing rule for `match-then-replace`.
///
/// Two records match when both carry `key` and the values are deeply
/// equal. On a match, each field listed in `fields` is combined with its
/// own strategy; unlisted fields fall back to the structural default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    key: String,
    fields: Vec<(String, Strategy)>,
}

impl MatchRule {
    /// Match records on the given field.
    pub fn on(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: Vec::new(),
        }
    }

    /// Declare the sub-strategy for one field of matched records.
    pub fn field(mut self, name: impl Into<String>, strategy: Strategy) -> Self {
        self.fields.push((name.into(), strategy));
        self
    }

    /// The field records are matched on.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Sub-strategy declared for `name`, if any.
    pub fn field_strategy(&self, name: &str) -> Option<&Strategy> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, strategy)| strategy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Any,
}

/// Dotted path pattern; a `*` segment matches any single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a dotted pattern such as `optimization.splitChunks.cacheGroups.*`.
    ///
    /// Empty segments are ignored, so `""` is the root path.
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    Segment::Any
                } else {
                    Segment::Key(s.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Number of wildcard segments.
    pub fn wildcards(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Any))
            .count()
    }

    /// True if the pattern matches the concrete path segment for segment.
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.segments.len() == path.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(segment, key)| match segment {
                    Segment::Any => true,
                    Segment::Key(k) => k == key.as_ref(),
                })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Any => "*",
                Segment::Key(k) => k.as_str(),
            })
            .collect();
        f.write_str(&parts.join("."))
    }
}

/// Path-keyed strategy table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyTable {
    entries: Vec<(PathPattern, Strategy)>,
}

impl StrategyTable {
    /// Empty table: every path uses the structural default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn with(mut self, pattern: &str, strategy: Strategy) -> Self {
        self.entries.push((PathPattern::new(pattern), strategy));
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the declared strategy for a concrete path.
    ///
    /// Exact patterns win over wildcard patterns; among equally specific
    /// patterns the first declared wins. `None` means the caller applies
    /// the structural default.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Option<&Strategy> {
        self.entries
            .iter()
            .filter(|(pattern, _)| pattern.matches(path))
            .min_by_key(|(pattern, _)| pattern.wildcards())
            .map(|(_, strategy)| strategy)
    }

    /// Iterate over the declared entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&PathPattern, &Strategy)> {
        self.entries.iter().map(|(p, s)| (p, s))
    }
}
