//! Results and events produced by a sort run.
//!
//! The sorter builds a [`ClassificationResult`] per directory and merges child
//! results into the parent. Per-level statistics ([`LevelReport`]), performed
//! mutations ([`Action`]) and per-entry errors ([`EntryFailure`]) are pushed to
//! a [`SortReporter`] as they happen.

use crate::file_category::Category;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Original file names grouped by the category they were sorted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    files: BTreeMap<Category, Vec<String>>,
}

impl ClassificationResult {
    /// Creates a result with an empty sequence for every category.
    pub fn new() -> Self {
        Self {
            files: Category::ALL
                .iter()
                .map(|category| (*category, Vec::new()))
                .collect(),
        }
    }

    /// Records a file name under a category.
    pub fn push(&mut self, category: Category, name: impl Into<String>) {
        self.files.entry(category).or_default().push(name.into());
    }

    /// Appends every sequence of `child` after the matching sequence of `self`.
    pub fn merge(&mut self, child: ClassificationResult) {
        for (category, names) in child.files {
            self.files.entry(category).or_default().extend(names);
        }
    }

    /// Returns the names recorded under a category, in the order they were seen.
    pub fn names(&self, category: Category) -> &[String] {
        self.files.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the number of files recorded under a category.
    pub fn count(&self, category: Category) -> usize {
        self.names(category).len()
    }

    /// Returns the number of files recorded across all categories.
    pub fn total(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Returns true if no file was recorded.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-extension file counts for a single directory level.
///
/// Extensions are kept as written on disk and in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionTally {
    counts: Vec<(String, usize)>,
}

impl ExtensionTally {
    pub fn record(&mut self, extension: &str) {
        match self.counts.iter_mut().find(|(ext, _)| ext == extension) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((extension.to_string(), 1)),
        }
    }

    pub fn count(&self, extension: &str) -> usize {
        self.counts
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(ext, count)| (ext.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Count and distinct extensions of unrecognized files at one level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnknownTally {
    pub count: usize,
    /// Extensions with their leading dot; an empty string stands for "no extension".
    pub extensions: BTreeSet<String>,
}

impl UnknownTally {
    pub fn record(&mut self, extension: &str) {
        self.count += 1;
        self.extensions.insert(extension.to_string());
    }
}

/// Statistics for one visited directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelReport {
    /// The directory as it was named while its entries were processed.
    pub directory: PathBuf,
    pub extensions: ExtensionTally,
    pub unknown: UnknownTally,
}

/// A filesystem mutation performed by the sorter.
///
/// In a dry run the same actions are reported without being carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// A file was moved into its category folder under a normalized name.
    Moved {
        from: PathBuf,
        to: PathBuf,
        category: Category,
    },
    /// An unrecognized file was renamed where it was.
    RenamedInPlace { from: PathBuf, to: PathBuf },
    /// A subdirectory was renamed to its normalized name before descending into it.
    RenamedDir { from: PathBuf, to: PathBuf },
    /// An empty subdirectory was deleted.
    RemovedEmptyDir { path: PathBuf },
    /// An archive was unpacked into a folder next to it.
    Extracted { archive: PathBuf, into: PathBuf },
}

/// An error confined to one directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Receives everything a sort run reports while it walks the tree.
///
/// All methods default to doing nothing.
pub trait SortReporter {
    fn action(&mut self, _action: &Action) {}

    fn failure(&mut self, _failure: &EntryFailure) {}

    /// Called once per visited directory, after all of its entries.
    fn level_finished(&mut self, _level: &LevelReport) {}
}

/// Discards all events.
impl SortReporter for () {}

/// Keeps every event in memory, in the order it was reported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectingReporter {
    pub actions: Vec<Action>,
    pub failures: Vec<EntryFailure>,
    pub levels: Vec<LevelReport>,
}

impl SortReporter for CollectingReporter {
    fn action(&mut self, action: &Action) {
        self.actions.push(action.clone());
    }

    fn failure(&mut self, failure: &EntryFailure) {
        self.failures.push(failure.clone());
    }

    fn level_finished(&mut self, level: &LevelReport) {
        self.levels.push(level.clone());
    }
}
