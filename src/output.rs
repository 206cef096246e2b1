//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored messages, the
//! progress spinner shown while a tree is sorted, per-directory extension
//! tables and the final per-category summary.

use crate::classification::{Action, ClassificationResult, EntryFailure, LevelReport, SortReporter};
use crate::file_category::Category;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::error("Failed to sort directory");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner for a sort run of unknown length.
    pub fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {pos} entries {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Formats the extension table of one directory level.
    ///
    /// Returns an empty vector if nothing was found at that level.
    pub fn level_table(level: &LevelReport) -> Vec<String> {
        let mut lines = Vec::new();

        if !level.extensions.is_empty() {
            lines.push(format!(
                "Files found in {}:",
                level.directory.display().to_string().bold()
            ));
            lines.push(format!("{:^15}|{:>7}", "Extension", "Count"));
            for (extension, count) in level.extensions.iter() {
                lines.push(format!("{:^15}|{:>7}", extension, count));
            }
        }

        if level.unknown.count > 0 {
            let extensions: Vec<&str> = level
                .unknown
                .extensions
                .iter()
                .map(|ext| if ext.is_empty() { "(none)" } else { ext.as_str() })
                .collect();
            lines.push(format!(
                "{} {} with unknown extensions in {}: {}",
                level.unknown.count.to_string().yellow(),
                if level.unknown.count == 1 { "file" } else { "files" },
                level.directory.display(),
                extensions.join(", ")
            ));
        }

        lines
    }

    /// Prints the counts and original names per category after a run.
    pub fn category_report(result: &ClassificationResult) {
        Self::header("FILES BY CATEGORY");
        for category in Category::ALL {
            let names = result.names(category);
            let verb = match category {
                Category::Archives => "found and unpacked",
                _ => "found",
            };
            println!(
                "{} {} {}: {}",
                names.len().to_string().green(),
                category.name().bold(),
                verb,
                names.join(", ")
            );
        }
    }

    /// Prints a summary table with file counts by category.
    pub fn summary_table(result: &ClassificationResult) {
        Self::header("SUMMARY");

        let width = Category::ALL
            .iter()
            .map(|category| category.name().len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for category in Category::ALL {
            let count = result.count(category);
            if count == 0 {
                continue;
            }
            println!(
                "{:<width$} | {} {}",
                category.name(),
                count.to_string().green(),
                if count == 1 { "file" } else { "files" },
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        let total = result.total();
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "file" } else { "files" },
            width = width
        );
    }
}

/// Prints sort events to the terminal while a spinner runs.
pub struct ConsoleReporter {
    spinner: ProgressBar,
    verbose: bool,
    dry_run: bool,
    failures: usize,
}

impl ConsoleReporter {
    /// `verbose` prints one line per action; tables and failures are always shown.
    pub fn new(verbose: bool, dry_run: bool) -> Self {
        Self {
            spinner: OutputFormatter::create_spinner(),
            verbose,
            dry_run,
            failures: 0,
        }
    }

    /// Number of entry failures reported so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    fn describe(action: &Action) -> String {
        match action {
            Action::Moved { from, to, category } => format!(
                "{} → {} ({})",
                from.display(),
                to.display(),
                category
            ),
            Action::RenamedInPlace { from, to } | Action::RenamedDir { from, to } => {
                format!("{} → {}", from.display(), to.display())
            }
            Action::RemovedEmptyDir { path } => format!("removed empty {}", path.display()),
            Action::Extracted { archive, into } => {
                format!("unpacked {} into {}", archive.display(), into.display())
            }
        }
    }
}

impl SortReporter for ConsoleReporter {
    fn action(&mut self, action: &Action) {
        self.spinner.inc(1);
        if self.verbose {
            let line = Self::describe(action);
            let dry_run = self.dry_run;
            self.spinner.suspend(|| {
                if dry_run {
                    OutputFormatter::dry_run_notice(&line);
                } else {
                    println!("  {}", line);
                }
            });
        }
    }

    fn failure(&mut self, failure: &EntryFailure) {
        self.failures += 1;
        self.spinner
            .suspend(|| OutputFormatter::warning(&failure.reason));
    }

    fn level_finished(&mut self, level: &LevelReport) {
        let lines = OutputFormatter::level_table(level);
        if lines.is_empty() {
            return;
        }
        self.spinner.suspend(|| {
            println!();
            for line in &lines {
                println!("{}", line);
            }
        });
    }
}
