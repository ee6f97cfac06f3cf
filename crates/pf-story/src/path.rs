use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchical identifier of a location in a compiled story.
///
/// Segments are joined with `.`; the leading segment names the top-level
/// scope (the knot). `"cellar.door.c2"` is a decision site inside the
/// `cellar` scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationPath(String);

impl LocationPath {
    /// Wrap a dot-separated path string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The full path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The top-level scope this path belongs to: everything before the
    /// first `.`, or the whole path when there is none.
    pub fn scope(&self) -> &str {
        match self.0.split_once('.') {
            Some((scope, _)) => scope,
            None => &self.0,
        }
    }

    /// Extend the path with one more segment.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        Self(format!("{}.{}", self.0, segment.as_ref()))
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LocationPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for LocationPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}
