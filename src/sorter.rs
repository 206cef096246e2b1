/// Recursive directory sorting.
///
/// The [`Sorter`] walks a directory depth-first. Files are classified by
/// extension and moved into category folders under normalized names, archives
/// are additionally unpacked, unknown files are renamed in place, empty
/// subdirectories are deleted and every other subdirectory is renamed and sorted
/// the same way.
use crate::archive::{ArchiveError, ArchiveExpander};
use crate::classification::{
    Action, ClassificationResult, EntryFailure, ExtensionTally, LevelReport, SortReporter,
    UnknownTally,
};
use crate::config::CompiledFilters;
use crate::file_category::{Category, CategoryRegistry};
use crate::normalize::{normalize_stem, split_name};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when a normalized destination name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append `_1`, `_2`, ... to the stem until the name is free.
    #[default]
    Suffix,
    /// Replace an existing file. Directories are never replaced.
    Overwrite,
}

/// Options controlling a sort run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptions {
    pub collision: CollisionPolicy,
    /// Maximum number of directory levels below the root that are sorted.
    pub max_depth: usize,
    /// Report actions without touching the filesystem.
    pub dry_run: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            collision: CollisionPolicy::Suffix,
            max_depth: 64,
            dry_run: false,
        }
    }
}

/// Errors that can occur while sorting a directory tree.
#[derive(Debug)]
pub enum SortError {
    /// The target path does not exist or is not a directory.
    InvalidInput { path: PathBuf, reason: String },
    /// A directory listing could not be read.
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a category directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move or rename an entry.
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// The destination exists and the collision policy does not allow replacing it.
    Conflict {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Failed to delete an empty directory.
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An archive could not be unpacked.
    Extraction(ArchiveError),
    /// The directory lies deeper than the configured limit and was left untouched.
    DepthLimitExceeded { path: PathBuf, limit: usize },
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { path, reason } => {
                write!(f, "Invalid target {}: {}", path.display(), reason)
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::MoveFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::Conflict {
                source,
                destination,
            } => {
                write!(
                    f,
                    "Cannot move {} to {}: destination already exists",
                    source.display(),
                    destination.display()
                )
            }
            Self::RemoveFailed { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            Self::Extraction(e) => write!(f, "{}", e),
            Self::DepthLimitExceeded { path, limit } => {
                write!(
                    f,
                    "Skipped {}: deeper than {} levels",
                    path.display(),
                    limit
                )
            }
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadDirFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::RemoveFailed { source, .. } => Some(source),
            Self::MoveFailed { source_error, .. } => Some(source_error),
            Self::Extraction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArchiveError> for SortError {
    fn from(e: ArchiveError) -> Self {
        Self::Extraction(e)
    }
}

impl SortError {
    /// The path this error is about, used when reporting it for one entry.
    pub fn path(&self) -> &Path {
        match self {
            Self::InvalidInput { path, .. }
            | Self::ReadDirFailed { path, .. }
            | Self::DirectoryCreationFailed { path, .. }
            | Self::RemoveFailed { path, .. }
            | Self::DepthLimitExceeded { path, .. } => path,
            Self::MoveFailed { source, .. } | Self::Conflict { source, .. } => source,
            Self::Extraction(ArchiveError::Unsupported { path, .. })
            | Self::Extraction(ArchiveError::Corrupt { path, .. })
            | Self::Extraction(ArchiveError::Io { path, .. }) => path,
        }
    }
}

/// Result type for sorting operations.
pub type SortResult<T> = Result<T, SortError>;

/// A directory entry captured before anything in its directory is changed.
struct EntrySnapshot {
    path: PathBuf,
    name: String,
    kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
    Other,
}

/// Paths a dry run would have changed, so later names are resolved as if the
/// earlier moves had happened.
#[derive(Debug, Default)]
struct DryRunPlan {
    claimed: HashSet<PathBuf>,
    vacated: HashSet<PathBuf>,
}

/// Sorts a directory tree in place.
///
/// # Examples
///
/// ```no_run
/// use dirsort::classification::CollectingReporter;
/// use dirsort::file_category::Category;
/// use dirsort::sorter::Sorter;
/// use std::path::Path;
///
/// let mut reporter = CollectingReporter::default();
/// let result = Sorter::default()
///     .sort(Path::new("/home/user/Downloads"), &mut reporter)
///     .expect("Failed to sort");
/// println!("{} images", result.count(Category::Images));
/// ```
pub struct Sorter {
    registry: CategoryRegistry,
    options: SortOptions,
    filters: Option<CompiledFilters>,
    plan: RefCell<DryRunPlan>,
}

impl Sorter {
    pub fn new(options: SortOptions) -> Self {
        Self {
            registry: CategoryRegistry::default(),
            options,
            filters: None,
            plan: RefCell::new(DryRunPlan::default()),
        }
    }

    /// Leaves entries rejected by `filters` untouched.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn options(&self) -> &SortOptions {
        &self.options
    }

    /// Sorts `dir` and everything below it.
    ///
    /// Only a failure to list `dir` itself is returned as an error. Failures on
    /// individual entries are passed to `reporter` and the walk continues.
    pub fn sort(
        &self,
        dir: &Path,
        reporter: &mut dyn SortReporter,
    ) -> SortResult<ClassificationResult> {
        if !dir.is_dir() {
            return Err(SortError::InvalidInput {
                path: dir.to_path_buf(),
                reason: "not an existing directory".to_string(),
            });
        }
        *self.plan.borrow_mut() = DryRunPlan::default();
        self.sort_level(dir, 0, reporter)
    }

    fn sort_level(
        &self,
        dir: &Path,
        depth: usize,
        reporter: &mut dyn SortReporter,
    ) -> SortResult<ClassificationResult> {
        let entries = self.snapshot(dir)?;

        let mut result = ClassificationResult::new();
        let mut extensions = ExtensionTally::default();
        let mut unknown = UnknownTally::default();

        for entry in entries {
            if let Some(filters) = &self.filters
                && !filters.should_include(&entry.path)
            {
                continue;
            }

            let outcome = match entry.kind {
                EntryKind::File => self.sort_file(
                    dir,
                    &entry,
                    &mut result,
                    &mut extensions,
                    &mut unknown,
                    reporter,
                ),
                EntryKind::Dir => self.sort_subdir(&entry, depth, &mut result, reporter),
                EntryKind::Other => Ok(()),
            };

            if let Err(e) = outcome {
                reporter.failure(&EntryFailure {
                    path: e.path().to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }

        reporter.level_finished(&LevelReport {
            directory: dir.to_path_buf(),
            extensions,
            unknown,
        });

        Ok(result)
    }

    /// Lists `dir` completely before any of its entries is touched.
    fn snapshot(&self, dir: &Path) -> SortResult<Vec<EntrySnapshot>> {
        let read_dir = fs::read_dir(dir).map_err(|e| SortError::ReadDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| SortError::ReadDirFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
            // file_type() does not follow symlinks, so links are never sorted.
            let kind = match entry.file_type() {
                Ok(t) if t.is_file() => EntryKind::File,
                Ok(t) if t.is_dir() => EntryKind::Dir,
                _ => EntryKind::Other,
            };
            entries.push(EntrySnapshot {
                path: entry.path(),
                name: entry.file_name().to_string_lossy().to_string(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn sort_file(
        &self,
        dir: &Path,
        entry: &EntrySnapshot,
        result: &mut ClassificationResult,
        extensions: &mut ExtensionTally,
        unknown: &mut UnknownTally,
        reporter: &mut dyn SortReporter,
    ) -> SortResult<()> {
        let (stem, extension) = split_name(&entry.name);
        let category = self.registry.classify(extension);
        let target_stem = normalize_stem(stem);

        let Some(folder_name) = category.dir_name() else {
            // Unknown files stay where they are, so they count as seen even if
            // the rename fails.
            result.push(Category::Unknown, entry.name.as_str());
            unknown.record(extension);

            let destination =
                self.resolve_destination(dir, &target_stem, extension, &entry.path, false);
            if destination != entry.path {
                self.move_entry(&entry.path, &destination)?;
                reporter.action(&Action::RenamedInPlace {
                    from: entry.path.clone(),
                    to: destination,
                });
            }
            return Ok(());
        };

        let folder = dir.join(folder_name);
        if !self.options.dry_run && !folder.is_dir() {
            fs::create_dir(&folder).map_err(|e| SortError::DirectoryCreationFailed {
                path: folder.clone(),
                source: e,
            })?;
        }

        let destination =
            self.resolve_destination(&folder, &target_stem, extension, &entry.path, false);
        self.move_entry(&entry.path, &destination)?;

        result.push(category, entry.name.as_str());
        extensions.record(extension);
        reporter.action(&Action::Moved {
            from: entry.path.clone(),
            to: destination.clone(),
            category,
        });

        if category == Category::Archives {
            self.extract(&destination, reporter)?;
        }
        Ok(())
    }

    /// Unpacks a moved archive into a folder named after its final stem.
    fn extract(&self, archive: &Path, reporter: &mut dyn SortReporter) -> SortResult<()> {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let (stem, _) = split_name(&file_name);
        let parent = archive.parent().unwrap_or(Path::new(""));
        let into = self.resolve_destination(parent, stem, "", archive, false);

        if self.options.dry_run {
            self.plan.borrow_mut().claimed.insert(into.clone());
        } else {
            ArchiveExpander::expand(archive, &into)?;
        }
        reporter.action(&Action::Extracted {
            archive: archive.to_path_buf(),
            into,
        });
        Ok(())
    }

    fn sort_subdir(
        &self,
        entry: &EntrySnapshot,
        depth: usize,
        result: &mut ClassificationResult,
        reporter: &mut dyn SortReporter,
    ) -> SortResult<()> {
        let is_empty = fs::read_dir(&entry.path)
            .map_err(|e| SortError::ReadDirFailed {
                path: entry.path.clone(),
                source: e,
            })?
            .next()
            .is_none();

        if is_empty {
            if !self.options.dry_run {
                fs::remove_dir(&entry.path).map_err(|e| SortError::RemoveFailed {
                    path: entry.path.clone(),
                    source: e,
                })?;
            }
            reporter.action(&Action::RemovedEmptyDir {
                path: entry.path.clone(),
            });
            return Ok(());
        }

        if self.registry.is_reserved_dir_name(&entry.name) {
            return Ok(());
        }

        if depth + 1 > self.options.max_depth {
            return Err(SortError::DepthLimitExceeded {
                path: entry.path.clone(),
                limit: self.options.max_depth,
            });
        }

        let parent = entry.path.parent().unwrap_or(Path::new(""));
        let renamed =
            self.resolve_destination(parent, &normalize_stem(&entry.name), "", &entry.path, true);
        if renamed != entry.path {
            self.move_entry(&entry.path, &renamed)?;
            reporter.action(&Action::RenamedDir {
                from: entry.path.clone(),
                to: renamed.clone(),
            });
        }

        // A dry run leaves the directory under its old name.
        let walk_path = if self.options.dry_run {
            &entry.path
        } else {
            &renamed
        };
        let child = self.sort_level(walk_path, depth + 1, reporter)?;
        result.merge(child);
        Ok(())
    }

    /// Renames `dir` to `new_name` within its parent and returns the new path.
    ///
    /// The collision policy applies; in a dry run the would-be path is returned
    /// and nothing is renamed.
    pub fn rename_dir(&self, dir: &Path, new_name: &str) -> SortResult<PathBuf> {
        let parent = dir.parent().ok_or_else(|| SortError::InvalidInput {
            path: dir.to_path_buf(),
            reason: "directory has no parent to be renamed in".to_string(),
        })?;

        let destination = self.resolve_destination(parent, new_name, "", dir, false);
        if destination != dir {
            self.move_entry(dir, &destination)?;
        }
        Ok(destination)
    }

    /// Picks the destination path for `<stem><extension>` inside `dir`.
    ///
    /// The source's own path is always acceptable. Under the suffix policy an
    /// occupied name gets `_1`, `_2`, ... appended to the stem. With
    /// `avoid_reserved`, category folder names count as occupied under either
    /// policy, so a renamed folder never becomes a category folder.
    fn resolve_destination(
        &self,
        dir: &Path,
        stem: &str,
        extension: &str,
        source: &Path,
        avoid_reserved: bool,
    ) -> PathBuf {
        let mut name = format!("{}{}", stem, extension);
        let mut counter = 1;
        loop {
            let candidate = dir.join(&name);
            let reserved = avoid_reserved && self.registry.is_reserved_dir_name(&name);
            if !reserved
                && (candidate == source
                    || self.options.collision == CollisionPolicy::Overwrite
                    || !self.is_taken(&candidate))
            {
                return candidate;
            }
            name = format!("{}_{}{}", stem, counter, extension);
            counter += 1;
        }
    }

    /// Whether `path` is occupied, counting the moves a dry run has planned.
    fn is_taken(&self, path: &Path) -> bool {
        if self.options.dry_run {
            let plan = self.plan.borrow();
            if plan.claimed.contains(path) {
                return true;
            }
            if plan.vacated.contains(path) {
                return false;
            }
        }
        path.symlink_metadata().is_ok()
    }

    fn move_entry(&self, source: &Path, destination: &Path) -> SortResult<()> {
        if self.options.dry_run {
            let mut plan = self.plan.borrow_mut();
            plan.vacated.insert(source.to_path_buf());
            plan.claimed.insert(destination.to_path_buf());
            return Ok(());
        }

        if let Ok(existing) = destination.symlink_metadata() {
            if existing.is_dir() || source.is_dir() {
                return Err(SortError::Conflict {
                    source: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                });
            }
            // Plain files are replaced; remove first so this also holds where
            // rename refuses to overwrite.
            fs::remove_file(destination).map_err(|e| SortError::MoveFailed {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                source_error: e,
            })?;
        }

        fs::rename(source, destination).map_err(|e| SortError::MoveFailed {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        })
    }
}

impl Default for Sorter {
    fn default() -> Self {
        Self::new(SortOptions::default())
    }
}
