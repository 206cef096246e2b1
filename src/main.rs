use clap::Parser;
use dirsort::cli::{RunArgs, run_cli};
use dirsort::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Sort a directory tree into category folders, normalizing names and
/// unpacking archives.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
struct Args {
    /// Directory to sort
    path: PathBuf,

    /// Configuration file (defaults to .dirsortrc.toml or ~/.config/dirsort/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show what would happen without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Do not rename the directory once it is sorted
    #[arg(long)]
    keep_root_name: bool,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Print every rename, move and extraction
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let run_args = RunArgs {
        target: args.path,
        config: args.config,
        dry_run: args.dry_run,
        keep_root_name: args.keep_root_name,
        report: args.report,
        verbose: args.verbose,
    };

    match run_cli(&run_args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
