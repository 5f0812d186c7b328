//! Index records: files and the tag entries that point back at them.
//!
//! Neither side holds a reference to the other. A [`File`] remembers the
//! names of its tags and a [`TagEntry`] remembers the [`FileId`]s of its
//! members; the [`FileStore`](crate::store::FileStore) owns both collections
//! and is the only thing that links or unlinks them.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Position of a file in the store's discovery-ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(usize);

impl FileId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    id: FileId,
    path: String,
    tags: BTreeSet<String>,
}

impl File {
    pub(crate) fn new(id: FileId, path: String) -> Self {
        Self {
            id,
            path,
            tags: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    /// Path relative to the working root, `/`-separated.
    pub fn relative_path(&self) -> &str {
        &self.path
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.iter().map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Returns false if the file already carried the tag.
    pub(crate) fn link(&mut self, tag: &str) -> bool {
        if self.tags.contains(tag) {
            return false;
        }
        self.tags.insert(tag.to_string())
    }

    /// Returns false if the file did not carry the tag.
    pub(crate) fn unlink(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    name: String,
    files: BTreeSet<FileId>,
}

impl TagEntry {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member files in discovery order.
    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.iter().copied()
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.files.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub(crate) fn members(&self) -> &BTreeSet<FileId> {
        &self.files
    }

    pub(crate) fn insert(&mut self, id: FileId) -> bool {
        self.files.insert(id)
    }

    pub(crate) fn remove(&mut self, id: FileId) -> bool {
        self.files.remove(&id)
    }
}
