//! Dotted path from the schema root to a leaf column.

use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Provides a type-safe representation for the path of a column in a
/// nested schema.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnPath(Vec<String>);

impl Deref for ColumnPath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&[&str]> for ColumnPath {
    fn from(slice: &[&str]) -> Self {
        ColumnPath(slice.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&str> for ColumnPath {
    fn from(dotted: &str) -> Self {
        if dotted.is_empty() {
            ColumnPath::default()
        } else {
            ColumnPath(dotted.split('.').map(String::from).collect())
        }
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(vec: Vec<String>) -> Self {
        ColumnPath(vec)
    }
}

impl Display for ColumnPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.join("."))
        }
    }
}

impl ColumnPath {
    /// Checks if path represents the root (is empty)
    pub fn is_root(&self) -> bool {
        self.is_empty()
    }

    /// Creates a new `ColumnPath` by appending a path component.
    pub fn append_name(&self, name: impl Into<String>) -> Self {
        ColumnPath(
            self.iter()
                .cloned()
                .chain(std::iter::once(name.into()))
                .collect(),
        )
    }

    /// Returns the count of components(depth) in a path
    pub fn depth(&self) -> usize {
        self.len()
    }

    /// Creates a new `ColumnPath` containing the first `len` components.
    pub fn prefix(&self, len: usize) -> ColumnPath {
        ColumnPath(self.iter().take(len).cloned().collect())
    }

    /// Returns the path as a dotted string.
    pub fn to_dotted(&self) -> String {
        self.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_roundtrip() {
        let path = ColumnPath::from("Name.Language.Code");
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_dotted(), "Name.Language.Code");
        assert_eq!(path.prefix(1), ColumnPath::from("Name"));
    }

    #[test]
    fn test_root_display() {
        let root = ColumnPath::default();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "<root>");
        assert_eq!(root.append_name("a").to_string(), "a");
    }
}
