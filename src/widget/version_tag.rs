use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("malformed version tag `{0}`: expected <gerrit>.<gitblit>.<plugin>")]
    Malformed(String),
}

/// How the `gitblit` and `plugin` components are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonMode {
    /// Plain string ordering, so "9" sorts above "10".
    #[default]
    Lexicographic,
    /// Unsigned integer ordering, falling back to strings when either side
    /// is not a number.
    Numeric,
}

impl ComparisonMode {
    fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            ComparisonMode::Lexicographic => a.cmp(b),
            ComparisonMode::Numeric => match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => a.cmp(b),
            },
        }
    }
}

impl FromStr for ComparisonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lexicographic" | "string" => Ok(ComparisonMode::Lexicographic),
            "numeric" | "number" => Ok(ComparisonMode::Numeric),
            _ => Err(format!("Unknown comparison mode: {}", s)),
        }
    }
}

/// A plugin release tag: `v?<gerrit version>.<gitblit patch>.<plugin patch>`.
///
/// The gerrit part keeps its own dots, e.g. `v2.15.3.1` is gerrit `2.15`,
/// gitblit `3`, plugin `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTag {
    pub gerrit: String,
    pub gitblit: String,
    pub plugin: String,
}

impl VersionTag {
    /// Splits a tag without validating it. Missing dots leave the leading
    /// components empty.
    pub fn split(raw: &str) -> Self {
        let tag = raw.strip_prefix('v').unwrap_or(raw);

        let (rest, plugin) = tag.rsplit_once('.').unwrap_or(("", tag));
        let (gerrit, gitblit) = rest.rsplit_once('.').unwrap_or(("", rest));

        Self {
            gerrit: gerrit.to_string(),
            gitblit: gitblit.to_string(),
            plugin: plugin.to_string(),
        }
    }

    pub fn is_newer_than(&self, current: &VersionTag, mode: ComparisonMode) -> bool {
        if self.gerrit != current.gerrit {
            return false;
        }

        match mode.compare(&self.gitblit, &current.gitblit) {
            Ordering::Greater => true,
            Ordering::Equal => mode.compare(&self.plugin, &current.plugin) == Ordering::Greater,
            Ordering::Less => false,
        }
    }
}

impl FromStr for VersionTag {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = Self::split(s.trim());

        if tag.gerrit.is_empty() || tag.gitblit.is_empty() || tag.plugin.is_empty() {
            return Err(VersionError::Malformed(s.to_string()));
        }

        Ok(tag)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.gerrit, self.gitblit, self.plugin)
    }
}
