//! Command-line run coordination for dirsort.
//!
//! This module handles everything around the sorter itself:
//! - Target validation
//! - Configuration loading
//! - Running the sorter with console reporting
//! - Renaming the sorted root
//! - Final summary and the optional JSON run report

use crate::classification::{
    Action, ClassificationResult, CollectingReporter, EntryFailure, LevelReport, SortReporter,
};
use crate::config::Config;
use crate::output::{ConsoleReporter, OutputFormatter};
use crate::sorter::{SortError, SortResult, Sorter};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for one CLI run.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    /// The directory to sort.
    pub target: PathBuf,
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// Report what would happen without changing anything.
    pub dry_run: bool,
    /// Leave the target directory under its current name.
    pub keep_root_name: bool,
    /// Write a JSON report of the run to this file.
    pub report: Option<PathBuf>,
    /// Print one line per filesystem change.
    pub verbose: bool,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The target as given, canonicalized.
    pub root: PathBuf,
    /// Where the sorted tree lives after the root rename.
    pub sorted_root: PathBuf,
    pub result: ClassificationResult,
}

/// Serialized form of a run, written with `--report`.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    timestamp: String,
    root: &'a Path,
    sorted_root: &'a Path,
    dry_run: bool,
    result: &'a ClassificationResult,
    levels: &'a [LevelReport],
    actions: &'a [Action],
    failures: &'a [EntryFailure],
}

/// Sorts `target` and then renames it to `root_name`, if given.
///
/// The target is validated before anything is changed. The root is only
/// renamed after the whole tree has been sorted.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::run_sort;
/// use dirsort::sorter::Sorter;
/// use std::path::Path;
///
/// let outcome = run_sort(Path::new("/home/user/Downloads"), &Sorter::default(), Some("SORTED"), &mut ())
///     .expect("Failed to sort");
/// println!("Sorted tree is at {}", outcome.sorted_root.display());
/// ```
pub fn run_sort(
    target: &Path,
    sorter: &Sorter,
    root_name: Option<&str>,
    reporter: &mut dyn SortReporter,
) -> SortResult<RunOutcome> {
    if !target.exists() {
        return Err(SortError::InvalidInput {
            path: target.to_path_buf(),
            reason: "path does not exist".to_string(),
        });
    }
    if !target.is_dir() {
        return Err(SortError::InvalidInput {
            path: target.to_path_buf(),
            reason: "path is not a directory".to_string(),
        });
    }
    let root = target
        .canonicalize()
        .map_err(|e| SortError::InvalidInput {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })?;

    let result = sorter.sort(&root, reporter)?;

    let sorted_root = match root_name {
        Some(name) => sorter.rename_dir(&root, name)?,
        None => root.clone(),
    };

    Ok(RunOutcome {
        root,
        sorted_root,
        result,
    })
}

/// Runs the CLI application with the given arguments.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::{run_cli, RunArgs};
///
/// let args = RunArgs {
///     target: "/home/user/Downloads".into(),
///     dry_run: true,
///     ..Default::default()
/// };
/// if let Err(e) = run_cli(&args) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(args: &RunArgs) -> Result<RunOutcome, String> {
    let config = Config::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let sorter = Sorter::new(config.sort.options(args.dry_run)).with_filters(filters);
    let root_name = if config.sort.rename_root && !args.keep_root_name {
        Some(config.sort.root_name.as_str())
    } else {
        None
    };

    if args.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing {} without changing anything",
            args.target.display()
        ));
    } else {
        OutputFormatter::info(&format!("Sorting contents of: {}", args.target.display()));
    }
    print_searched_extensions(&sorter);

    let mut reporter = RunReporter {
        console: ConsoleReporter::new(args.verbose || args.dry_run, args.dry_run),
        collected: CollectingReporter::default(),
    };
    let outcome = run_sort(&args.target, &sorter, root_name, &mut reporter);
    reporter.console.finish();
    let outcome = outcome.map_err(|e| e.to_string())?;

    OutputFormatter::category_report(&outcome.result);
    OutputFormatter::summary_table(&outcome.result);

    if let Some(report_path) = &args.report {
        write_report(report_path, &outcome, args.dry_run, &reporter.collected)?;
        OutputFormatter::info(&format!("Run report written to {}", report_path.display()));
    }

    let failures = reporter.console.failures();
    if failures > 0 {
        OutputFormatter::warning(&format!(
            "{} {} could not be sorted. Please review the warnings above.",
            failures,
            if failures == 1 { "entry" } else { "entries" }
        ));
    }

    if args.dry_run {
        OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    } else {
        OutputFormatter::success(&format!(
            "Sorting complete: {}",
            outcome.sorted_root.display()
        ));
    }

    Ok(outcome)
}

fn print_searched_extensions(sorter: &Sorter) {
    OutputFormatter::header("Looking for files with these extensions:");
    for rule in sorter.registry().rules() {
        println!("  {:<10} {}", rule.category.name(), rule.extensions.join(" "));
    }
}

fn write_report(
    path: &Path,
    outcome: &RunOutcome,
    dry_run: bool,
    collected: &CollectingReporter,
) -> Result<(), String> {
    let report = RunReport {
        timestamp: chrono::Utc::now().to_rfc3339(),
        root: &outcome.root,
        sorted_root: &outcome.sorted_root,
        dry_run,
        result: &outcome.result,
        levels: &collected.levels,
        actions: &collected.actions,
        failures: &collected.failures,
    };

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to serialize run report: {}", e))?;
    fs::write(path, json)
        .map_err(|e| format!("Failed to write run report {}: {}", path.display(), e))
}

/// Sends every event to the console and keeps a copy for the run report.
struct RunReporter {
    console: ConsoleReporter,
    collected: CollectingReporter,
}

impl SortReporter for RunReporter {
    fn action(&mut self, action: &Action) {
        self.console.action(action);
        self.collected.action(action);
    }

    fn failure(&mut self, failure: &EntryFailure) {
        self.console.failure(failure);
        self.collected.failure(failure);
    }

    fn level_finished(&mut self, level: &LevelReport) {
        self.console.level_finished(level);
        self.collected.level_finished(level);
    }
}
