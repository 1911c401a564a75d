//! The in-memory tree shape the compiler consumes and the loader produces.

use std::collections::BTreeMap;

/// A directory or a file, recursively.
///
/// `Dir` is keyed by a [`BTreeMap`] rather than a hash map: the compiler
/// needs ascending byte-lexicographic child order regardless (it is a
/// format invariant, not a convenience), and a `BTreeMap` gives it for free
/// at both construction time (scanning a path) and encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tree {
    Dir(BTreeMap<String, Tree>),
    File(Vec<u8>),
}

impl Tree {
    /// Convenience constructor for an empty directory.
    pub fn empty_dir() -> Self {
        Self::Dir(BTreeMap::new())
    }

    pub fn dir(children: impl IntoIterator<Item = (String, Tree)>) -> Self {
        Self::Dir(children.into_iter().collect())
    }

    pub fn file(bytes: impl Into<Vec<u8>>) -> Self {
        Self::File(bytes.into())
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir(_))
    }

    pub fn as_dir(&self) -> Option<&BTreeMap<String, Tree>> {
        match self {
            Self::Dir(m) => Some(m),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&[u8]> {
        match self {
            Self::File(b) => Some(b),
            Self::Dir(_) => None,
        }
    }
}
