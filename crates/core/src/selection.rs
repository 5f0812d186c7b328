use crate::models::FileId;
use serde::Serialize;
use std::collections::BTreeSet;

/// The evaluated answer to a [`Selector`](crate::selector::Selector).
///
/// Holds handles, not files: resolve it against the store it came from with
/// [`FileStore::resolve`](crate::store::FileStore::resolve). It is a snapshot
/// and should be recomputed after the store is mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    universe: usize,
    files: BTreeSet<FileId>,
    subtags: BTreeSet<String>,
}

impl Selection {
    pub(crate) fn new(universe: usize, files: BTreeSet<FileId>, subtags: BTreeSet<String>) -> Self {
        Self {
            universe,
            files,
            subtags,
        }
    }

    pub(crate) fn empty(universe: usize) -> Self {
        Self::new(universe, BTreeSet::new(), BTreeSet::new())
    }

    /// Number of files in the store when this selection was evaluated.
    pub fn universe(&self) -> usize {
        self.universe
    }

    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.iter().copied()
    }

    pub fn contains(&self, file: FileId) -> bool {
        self.files.contains(&file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Every tag carried by at least one selected file.
    pub fn subtags(&self) -> impl Iterator<Item = &str> + '_ {
        self.subtags.iter().map(String::as_str)
    }

    pub fn has_subtag(&self, tag: &str) -> bool {
        self.subtags.contains(tag)
    }
}
