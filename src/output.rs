//! Output formatting and styling module.
//!
//! Every human-facing line of a run goes through [`OutputFormatter`]: one line
//! per duplicate, per move (real or planned) and per error. The lines are free
//! text meant for people, not for parsing.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Centralised, consistently styled console output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use mediatidy::output::OutputFormatter;
    /// OutputFormatter::success("Moved and renamed: a.jpg -> images/2023/05/01-05-2023-10-00-00.jpg");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
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

    /// Prints a dry-run notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar over `total` files.
    ///
    /// ```no_run
    /// use mediatidy::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a two-column summary of run counters, skipping zero rows.
    ///
    /// ```no_run
    /// use mediatidy::output::OutputFormatter;
    /// OutputFormatter::summary_table(&[("Moved", 12), ("Duplicates", 3), ("Errors", 0)]);
    /// ```
    pub fn summary_table(rows: &[(&str, usize)]) {
        Self::header("SUMMARY");

        let width = rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(7);

        println!("{:<width$} | {}", "Outcome".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));

        for (label, count) in rows.iter().filter(|(_, count)| *count > 0) {
            println!(
                "{:<width$} | {}",
                label,
                count.to_string().green(),
                width = width
            );
        }

        let total: usize = rows.iter().map(|(_, count)| count).sum();
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "file" } else { "files" },
            width = width
        );
    }
}
