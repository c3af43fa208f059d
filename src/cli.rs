//! Command-line interface module for mediatidy.
//!
//! This module handles the outer shell around the pipeline:
//! - Argument parsing
//! - Validation of the source and target directories
//! - Loading configuration and filters
//! - Printing the run header and summary

use crate::config::OrganizerConfig;
use crate::output::OutputFormatter;
use crate::pipeline::{OrganizePipeline, RunOptions, RunReport};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Organize photos and videos into a deduplicated, date-structured archive.
#[derive(Debug, Clone, Parser)]
#[command(name = "mediatidy", version, about, long_about = None)]
pub struct Cli {
    /// Directory to organize
    pub source: PathBuf,

    /// Archive root; files land in <TARGET>/<images|videos>/<YYYY>/<MM>/
    pub target: PathBuf,

    /// Report what would happen without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file (defaults to .mediatidy.toml, then ~/.config/mediatidy/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report per-file failures and keep going instead of stopping the run
    #[arg(long)]
    pub isolate_failures: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Show diagnostic logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Builds arguments for a run without going through the command line.
    pub fn for_dirs(source: impl Into<PathBuf>, target: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            dry_run,
            config: None,
            isolate_failures: false,
            no_progress: true,
            verbose: false,
        }
    }
}

/// Runs one organize pass as described by `cli`.
///
/// # Examples
///
/// ```no_run
/// use mediatidy::cli::{Cli, run_cli};
///
/// let report = run_cli(&Cli::for_dirs("/media/card", "/archive", true));
/// match report {
///     Ok(report) => println!("{} file(s) would be moved", report.planned()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunReport, String> {
    ensure_directory(&cli.source, "Source")?;
    ensure_directory(&cli.target, "Target")?;

    let config = OrganizerConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = config
        .filters
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    OutputFormatter::info(&format!("Source Directory: {}", cli.source.display()));
    OutputFormatter::info(&format!("Target Directory: {}", cli.target.display()));
    OutputFormatter::info(&format!("Dry Run: {}", cli.dry_run));

    let options = RunOptions {
        source: cli.source.clone(),
        target: cli.target.clone(),
        dry_run: cli.dry_run,
        isolate_failures: cli.isolate_failures || config.run.isolate_failures,
    };

    let mut pipeline = OrganizePipeline::new(options);
    if !cli.no_progress {
        pipeline = pipeline.with_progress(OutputFormatter::create_progress_bar(0));
    }

    let report = pipeline
        .run(&filters)
        .map_err(|e| format!("Error processing files: {}", e))?;

    OutputFormatter::summary_table(&report.summary_rows());
    if report.hidden_media > 0 {
        OutputFormatter::warning(&format!(
            "{} hidden image or video file(s) were skipped; set enable_hidden_files = true under [filters] to organize them",
            report.hidden_media
        ));
    }
    if report.wall_clock_fallbacks > 0 {
        OutputFormatter::warning(&format!(
            "{} file(s) were dated with the current time",
            report.wall_clock_fallbacks
        ));
    }
    if cli.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else if report.failed() > 0 {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(report)
}

fn ensure_directory(path: &Path, label: &str) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("{} directory does not exist: {}", label, path.display()));
    }
    if !path.is_dir() {
        return Err(format!("{} is not a directory: {}", label, path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "mediatidy",
            "/in",
            "/out",
            "--dry-run",
            "--config",
            "custom.toml",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.source, PathBuf::from("/in"));
        assert_eq!(cli.target, PathBuf::from("/out"));
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert!(!cli.isolate_failures);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_target_is_required() {
        assert!(Cli::try_parse_from(["mediatidy", "/in"]).is_err());
    }

    #[test]
    fn test_missing_directories_are_rejected() {
        let err = run_cli(&Cli::for_dirs("/definitely/not/here", "/tmp", true)).unwrap_err();
        assert!(err.contains("Source directory does not exist"));
    }
}
