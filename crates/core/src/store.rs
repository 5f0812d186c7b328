//! The file↔tag index and its query evaluator.

use crate::error::IndexError;
use crate::models::{File, FileId, TagEntry};
use crate::operation::{Operation, OperationKind};
use crate::scanner::FileDiscovery;
use crate::selection::Selection;
use crate::selector::Selector;
use crate::tagger::TagDeriver;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What an [`Operation`] changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub kind: OperationKind,
    pub tag: Option<String>,
    /// File/tag links added.
    pub linked: usize,
    /// File/tag links removed.
    pub unlinked: usize,
    /// The tag was new to the index and is still present.
    pub tag_created: bool,
    /// The tag lost its last file and was dropped from the index.
    pub tag_removed: bool,
    /// Selected handles that do not belong to this store.
    pub skipped: usize,
}

impl ApplyReport {
    fn new(op: &Operation) -> Self {
        let tag = match op {
            Operation::DeleteFiles => None,
            other => Some(other.payload().to_string()),
        };
        Self {
            kind: op.kind(),
            tag,
            linked: 0,
            unlinked: 0,
            tag_created: false,
            tag_removed: false,
            skipped: 0,
        }
    }
}

/// Owns every [`File`] and every [`TagEntry`].
///
/// Files live in discovery order and are addressed by [`FileId`]; tags are
/// keyed by name. Both sides of every link are updated together, and a tag
/// left without files is dropped before any method returns.
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    root: PathBuf,
    files: Vec<File>,
    tags: BTreeMap<String, TagEntry>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Indexes `paths` in order, tagging each with `tagger`.
    pub fn build<I, S>(root: impl Into<PathBuf>, paths: I, tagger: &dyn TagDeriver) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = Self::new(root);
        for path in paths {
            store.insert_file(path.into(), tagger);
        }
        info!(
            root = %store.root.display(),
            files = store.files.len(),
            tags = store.tags.len(),
            "index built"
        );
        store
    }

    /// Asks `discovery` for the file list once. A failed discovery leaves the
    /// index empty.
    pub fn from_discovery(
        root: impl Into<PathBuf>,
        discovery: &dyn FileDiscovery,
        tagger: &dyn TagDeriver,
    ) -> Self {
        let paths = match discovery.discover() {
            Ok(paths) => paths,
            Err(err) => {
                warn!(error = %err, "file discovery failed; starting with an empty index");
                Vec::new()
            }
        };
        Self::build(root, paths, tagger)
    }

    fn insert_file(&mut self, path: String, tagger: &dyn TagDeriver) -> FileId {
        let id = FileId::new(self.files.len());
        let mut file = File::new(id, path);
        for tag in tagger.compute_tags(file.relative_path()) {
            file.link(&tag);
            self.tags
                .entry(tag)
                .or_insert_with_key(|name| TagEntry::new(name.as_str()))
                .insert(id);
        }
        self.files.push(file);
        id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.files.get(id.index())
    }

    /// First file indexed under `path`.
    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.files
            .iter()
            .find(|f| f.relative_path() == path)
            .map(File::id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn tag(&self, tag: &str) -> Option<&TagEntry> {
        self.tags.get(tag)
    }

    /// All tags in name order.
    pub fn tags(&self) -> impl Iterator<Item = &TagEntry> + '_ {
        self.tags.values()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// The files of `selection`, in discovery order.
    pub fn resolve<'a>(&'a self, selection: &'a Selection) -> impl Iterator<Item = &'a File> + 'a {
        selection.files().filter_map(move |id| self.file(id))
    }

    /// Evaluates `selector` against the current index.
    ///
    /// Clauses run in a fixed order: required tags, excluded tags, then
    /// overrides. Unknown tag names are skipped. A required tag whose
    /// intersection would leave nothing is ignored rather than applied.
    pub fn select(&self, selector: Selector) -> Selection {
        if selector.is_empty() {
            return Selection::empty(self.files.len());
        }

        let mut result: BTreeSet<FileId> = BTreeSet::new();
        let mut seeded = false;
        for tag in selector.required_tags() {
            let Some(entry) = self.tags.get(tag) else {
                debug!(tag = %tag, "unknown required tag skipped");
                continue;
            };
            if !seeded {
                result = entry.members().clone();
                seeded = true;
                continue;
            }
            let narrowed: BTreeSet<FileId> = result.intersection(entry.members()).copied().collect();
            if narrowed.is_empty() {
                debug!(tag = %tag, "required tag would empty the selection; ignored");
            } else {
                result = narrowed;
            }
        }

        for tag in selector.excluded_tags() {
            if let Some(entry) = self.tags.get(tag) {
                for id in entry.files() {
                    result.remove(&id);
                }
            }
        }

        for &(id, include) in selector.overrides() {
            if self.file(id).is_none() {
                warn!(file = %id, "override for a file outside this index ignored");
                continue;
            }
            if include {
                result.insert(id);
            } else {
                result.remove(&id);
            }
        }

        let mut subtags = BTreeSet::new();
        for file in result.iter().filter_map(|&id| self.file(id)) {
            subtags.extend(file.tags().map(str::to_string));
        }

        debug!(files = result.len(), subtags = subtags.len(), "selection evaluated");
        Selection::new(self.files.len(), result, subtags)
    }

    /// Applies `op` to every file in `selection`.
    ///
    /// Missing tags, files already tagged and files not tagged are all
    /// treated as nothing to do.
    pub fn apply(&mut self, selection: &Selection, op: &Operation) -> ApplyReport {
        let mut report = ApplyReport::new(op);
        match op {
            Operation::AddTag { tag } => self.add_tag(selection, tag, &mut report),
            Operation::RemoveTag { tag } => self.remove_tag(selection, tag, &mut report),
            Operation::DeleteFiles => {}
        }
        debug!(?report, "operation applied");
        report
    }

    fn add_tag(&mut self, selection: &Selection, tag: &str, report: &mut ApplyReport) {
        let entry = match self.tags.entry(tag.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                report.tag_created = true;
                e.insert(TagEntry::new(tag))
            }
        };
        for id in selection.files() {
            let Some(file) = self.files.get_mut(id.index()) else {
                report.skipped += 1;
                continue;
            };
            if file.link(tag) {
                entry.insert(id);
                report.linked += 1;
            }
        }

        // A brand-new tag applied to nothing must not linger.
        if self.collect_if_empty(tag) {
            report.tag_created = false;
        }
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "selection holds files outside this index");
        }
    }

    fn remove_tag(&mut self, selection: &Selection, tag: &str, report: &mut ApplyReport) {
        let Some(entry) = self.tags.get_mut(tag) else {
            debug!(tag = %tag, "remove of unknown tag is a no-op");
            return;
        };
        for id in selection.files() {
            let Some(file) = self.files.get_mut(id.index()) else {
                report.skipped += 1;
                continue;
            };
            if file.unlink(tag) {
                entry.remove(id);
                report.unlinked += 1;
            }
        }

        report.tag_removed = self.collect_if_empty(tag);
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "selection holds files outside this index");
        }
    }

    /// Drops `tag` from the index if no file carries it any more.
    fn collect_if_empty(&mut self, tag: &str) -> bool {
        if self.tags.get(tag).is_some_and(TagEntry::is_empty) {
            self.tags.remove(tag);
            debug!(tag = %tag, "empty tag dropped");
            return true;
        }
        false
    }

    /// Verifies that every file/tag link exists in both directions and that
    /// no indexed tag is empty.
    pub fn check_consistency(&self) -> Result<(), IndexError> {
        for (position, file) in self.files.iter().enumerate() {
            if file.id().index() != position {
                return Err(IndexError::MisplacedFile {
                    position,
                    file: file.id(),
                });
            }
            for tag in file.tags() {
                match self.tags.get(tag) {
                    None => {
                        return Err(IndexError::DanglingTag {
                            file: file.id(),
                            tag: tag.to_string(),
                        })
                    }
                    Some(entry) if !entry.contains(file.id()) => {
                        return Err(IndexError::MissingMember {
                            file: file.id(),
                            tag: tag.to_string(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        for (key, entry) in &self.tags {
            if entry.name() != key {
                return Err(IndexError::KeyMismatch {
                    key: key.clone(),
                    name: entry.name().to_string(),
                });
            }
            if entry.is_empty() {
                return Err(IndexError::EmptyTag { tag: key.clone() });
            }
            for id in entry.files() {
                match self.file(id) {
                    None => {
                        return Err(IndexError::UnknownFile {
                            file: id,
                            tag: key.clone(),
                        })
                    }
                    Some(file) if !file.has_tag(key) => {
                        return Err(IndexError::MissingBackReference {
                            file: id,
                            tag: key.clone(),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::StaticDiscovery;
    use crate::tagger::PathTagger;

    /// files 0..=2 under `a/`, 3..=4 under `b/`, 5 tagged nowhere.
    fn sample() -> FileStore {
        FileStore::build(
            "/work",
            [
                "a/one.txt",
                "a/two.txt",
                "a/three.txt",
                "b/four.txt",
                "b/five.txt",
                "loose",
            ],
            &PathTagger::new().with_extension(false),
        )
    }

    fn ids(store: &FileStore, selection: &Selection) -> Vec<String> {
        store
            .resolve(selection)
            .map(|f| f.relative_path().to_string())
            .collect()
    }

    fn id(store: &FileStore, path: &str) -> FileId {
        store.file_id(path).unwrap()
    }

    #[test]
    fn build_links_both_directions() {
        let store = sample();
        assert_eq!(store.len(), 6);
        assert_eq!(store.tag_count(), 2);
        assert_eq!(store.tag("a").unwrap().len(), 3);
        assert!(store.file(id(&store, "b/four.txt")).unwrap().has_tag("b"));
        assert_eq!(store.file(id(&store, "loose")).unwrap().tag_count(), 0);
        store.check_consistency().unwrap();
    }

    #[test]
    fn duplicate_paths_are_indexed_twice() {
        let store = FileStore::build("/", ["x/f", "x/f"], &PathTagger::new());
        assert_eq!(store.len(), 2);
        assert_eq!(store.tag("x").unwrap().len(), 2);
        store.check_consistency().unwrap();
    }

    #[test]
    fn empty_selector_selects_nothing() {
        let store = sample();
        let selection = store.select(Selector::new());
        assert!(selection.is_empty());
        assert_eq!(selection.subtags().count(), 0);
        assert_eq!(selection.universe(), 6);
    }

    #[test]
    fn no_required_tags_means_no_implicit_universe() {
        let store = sample();
        let selection = store.select(Selector::new().exclude("a"));
        assert!(selection.is_empty());
    }

    #[test]
    fn required_tag_selects_members_and_subtags() {
        let store = sample();
        let selection = store.select(Selector::new().require("a"));
        assert_eq!(ids(&store, &selection), ["a/one.txt", "a/two.txt", "a/three.txt"]);
        assert_eq!(selection.subtags().collect::<Vec<_>>(), ["a"]);
    }

    #[test]
    fn disjoint_required_tag_is_ignored() {
        let store = sample();
        let selection = store.select(Selector::new().require("a").require("b"));
        assert_eq!(ids(&store, &selection), ["a/one.txt", "a/two.txt", "a/three.txt"]);
    }

    #[test]
    fn unknown_tags_do_not_restrict() {
        let store = sample();
        let selection = store.select(Selector::new().require("ghost").require("b").exclude("ghost"));
        assert_eq!(ids(&store, &selection), ["b/four.txt", "b/five.txt"]);
    }

    #[test]
    fn only_unknown_required_tags_select_nothing() {
        let store = sample();
        assert!(store.select(Selector::new().require("ghost")).is_empty());
    }

    #[test]
    fn intersection_narrows_when_overlapping() {
        let store = FileStore::build(
            "/",
            ["music/live/a", "music/studio/b", "music/live/c", "live/d"],
            &PathTagger::new(),
        );
        let selection = store.select(Selector::new().require("music").require("live"));
        assert_eq!(ids(&store, &selection), ["music/live/a", "music/live/c"]);
        assert!(selection.has_subtag("music"));
        assert!(selection.has_subtag("live"));
        assert!(!selection.has_subtag("studio"));
    }

    #[test]
    fn exclusion_removes_what_intersection_added() {
        let store = sample();
        let selection = store.select(Selector::new().require("a").exclude("a"));
        assert!(selection.is_empty());
        assert_eq!(selection.subtags().count(), 0);
    }

    #[test]
    fn overrides_win() {
        let store = sample();
        let selector = Selector::new()
            .require("a")
            .include_file(id(&store, "b/five.txt"))
            .exclude_file(id(&store, "a/one.txt"))
            .include_file(id(&store, "loose"));
        let selection = store.select(selector);
        assert_eq!(
            ids(&store, &selection),
            ["a/two.txt", "a/three.txt", "b/five.txt", "loose"]
        );
        assert!(selection.has_subtag("b"));
    }

    #[test]
    fn override_beats_exclusion() {
        let store = sample();
        let four = id(&store, "b/four.txt");
        let selection = store.select(Selector::new().require("b").exclude("b").include_file(four));
        assert_eq!(selection.files().collect::<Vec<_>>(), [four]);
    }

    #[test]
    fn foreign_override_is_ignored() {
        let store = sample();
        let selection = store.select(Selector::new().include_file(FileId::new(99)));
        assert!(selection.is_empty());
    }

    #[test]
    fn add_tag_links_and_is_idempotent() {
        let mut store = sample();
        let selection = store.select(Selector::new().require("b"));
        let first = store.apply(&selection, &Operation::add_tag("keep"));
        assert_eq!(first.linked, 2);
        assert!(first.tag_created);

        let tags_after_first: Vec<TagEntry> = store.tags().cloned().collect();
        let second = store.apply(&selection, &Operation::add_tag("keep"));
        assert_eq!(second.linked, 0);
        assert!(!second.tag_created);
        assert_eq!(store.tags().cloned().collect::<Vec<_>>(), tags_after_first);
        store.check_consistency().unwrap();
    }

    #[test]
    fn add_tag_to_empty_selection_creates_nothing() {
        let mut store = sample();
        let selection = store.select(Selector::new());
        let report = store.apply(&selection, &Operation::add_tag("phantom"));
        assert!(!report.tag_created);
        assert!(!store.has_tag("phantom"));
        store.check_consistency().unwrap();
    }

    #[test]
    fn remove_tag_collects_emptied_tag() {
        let mut store = sample();
        let selection = store.select(Selector::new().require("b"));
        let report = store.apply(&selection, &Operation::remove_tag("b"));
        assert_eq!(report.unlinked, 2);
        assert!(report.tag_removed);
        assert!(!store.has_tag("b"));
        assert!(store.select(Selector::new().require("b")).is_empty());
        store.check_consistency().unwrap();
    }

    #[test]
    fn partial_remove_keeps_tag() {
        let mut store = sample();
        let one = id(&store, "a/one.txt");
        let selection = store.select(Selector::new().include_file(one));
        let report = store.apply(&selection, &Operation::remove_tag("a"));
        assert_eq!(report.unlinked, 1);
        assert!(!report.tag_removed);
        assert_eq!(store.tag("a").unwrap().len(), 2);
        assert!(!store.file(one).unwrap().has_tag("a"));
        store.check_consistency().unwrap();
    }

    #[test]
    fn remove_unknown_or_unheld_tag_is_a_no_op() {
        let mut store = sample();
        let selection = store.select(Selector::new().require("a"));
        let before: Vec<File> = store.files().to_vec();

        let report = store.apply(&selection, &Operation::remove_tag("ghost"));
        assert_eq!(report.unlinked, 0);
        let report = store.apply(&selection, &Operation::remove_tag("b"));
        assert_eq!(report.unlinked, 0);
        assert!(store.has_tag("b"));
        assert_eq!(store.files(), before.as_slice());
    }

    #[test]
    fn add_then_remove_restores_state() {
        let mut store = sample();
        let before_files: Vec<File> = store.files().to_vec();
        let before_tags: Vec<TagEntry> = store.tags().cloned().collect();

        let selection = store.select(Selector::new().require("a").include_file(id(&store, "loose")));
        store.apply(&selection, &Operation::add_tag("x"));
        assert_eq!(store.tag("x").unwrap().len(), 4);
        store.apply(&selection, &Operation::remove_tag("x"));

        assert_eq!(store.files(), before_files.as_slice());
        assert_eq!(store.tags().cloned().collect::<Vec<_>>(), before_tags);
    }

    #[test]
    fn delete_files_leaves_index_untouched() {
        let mut store = sample();
        let selection = store.select(Selector::new().require("a"));
        let report = store.apply(&selection, &Operation::DeleteFiles);
        assert_eq!(report.kind, OperationKind::DeleteFiles);
        assert_eq!(report.tag, None);
        assert_eq!(store.len(), 6);
        assert_eq!(store.tag("a").unwrap().len(), 3);
    }

    #[test]
    fn foreign_selection_handles_are_skipped() {
        let big = sample();
        let mut small = FileStore::build("/", ["a/only"], &PathTagger::new());
        let selection = big.select(Selector::new().require("b"));
        let report = small.apply(&selection, &Operation::add_tag("b"));
        assert_eq!(report.skipped, 2);
        assert!(!small.has_tag("b"));
        small.check_consistency().unwrap();
    }

    #[test]
    fn failed_discovery_yields_empty_index() {
        struct Broken;
        impl FileDiscovery for Broken {
            fn discover(&self) -> anyhow::Result<Vec<String>> {
                anyhow::bail!("find is not installed")
            }
        }
        let store = FileStore::from_discovery("/", &Broken, &PathTagger::new());
        assert!(store.is_empty());
        assert_eq!(store.tag_count(), 0);
    }

    #[test]
    fn discovery_feeds_build_in_order() {
        let discovery = StaticDiscovery(vec!["z/1".into(), "a/2".into()]);
        let store = FileStore::from_discovery("/", &discovery, &PathTagger::new());
        let paths: Vec<&str> = store.files().iter().map(File::relative_path).collect();
        assert_eq!(paths, ["z/1", "a/2"]);
    }

    #[test]
    fn consistency_check_reports_broken_links() {
        let mut store = sample();
        let one = id(&store, "a/one.txt");
        store.files[one.index()].unlink("a");
        assert_eq!(
            store.check_consistency(),
            Err(IndexError::MissingBackReference {
                file: one,
                tag: "a".into()
            })
        );
    }
}
