//! dirsort - recursive directory sorting
//!
//! This library sorts a directory tree in place: files are classified by
//! extension into category folders, file and folder names are normalized to
//! filesystem-safe ASCII (including Cyrillic transliteration), and archives
//! are unpacked next to themselves.

pub mod archive;
pub mod classification;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod normalize;
pub mod output;
pub mod sorter;

pub use archive::{ArchiveError, ArchiveExpander, ArchiveFormat};
pub use classification::{
    Action, ClassificationResult, CollectingReporter, EntryFailure, LevelReport, SortReporter,
};
pub use cli::{RunArgs, RunOutcome, run_cli, run_sort};
pub use config::{CompiledFilters, Config, ConfigError};
pub use file_category::{Category, CategoryRegistry};
pub use normalize::normalize;
pub use sorter::{CollisionPolicy, SortError, SortOptions, Sorter};
