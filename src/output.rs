//! Output formatting and styling module.
//!
//! All user-facing output goes through [`OutputFormatter`] so colors,
//! symbols and table layout stay consistent between the interactive shell
//! and the one-shot subcommands.

use crate::scanner::{ScanReport, display_label};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What the application does, shown by the `info` command.
pub const ABOUT_TEXT: &str = "This application crawls all subfolders in a given folder, \
identifies file types, and organizes selected files by type into categorized folders. \
If a conflict arises due to file names, the application renames the files to avoid \
overwriting. Empty folders are deleted after organizing.";

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use typecrawler::output::OutputFormatter;
    /// OutputFormatter::success("Files have been organized");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
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

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a bold section header preceded by a blank line.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for moving `total` files.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Renders the two-column file type table of a scan.
    ///
    /// Rows are sorted by extension key; the empty key shows as
    /// `[No Extension]`. The last row is the total.
    pub fn format_extension_table(scan: &ScanReport) -> Vec<String> {
        let rows: Vec<(&str, usize)> = scan
            .counts()
            .map(|(key, count)| (display_label(key), count))
            .collect();

        let width = rows
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0)
            .max("File Type".len());

        let mut lines = Vec::with_capacity(rows.len() + 4);
        lines.push(format!("{:<width$} | {}", "File Type", "Count"));
        lines.push("-".repeat(width + 10));
        for (label, count) in &rows {
            lines.push(format!("{:<width$} | {}", label, count));
        }
        lines.push("-".repeat(width + 10));
        lines.push(format!("{:<width$} | {}", "Total", scan.total_files()));
        lines
    }

    /// Prints the file type table of a scan.
    pub fn extension_table(scan: &ScanReport) {
        Self::header(&format!("File types in {}", scan.root().display()));
        if scan.is_empty() {
            Self::plain("No files found.");
            return;
        }

        let lines = Self::format_extension_table(scan);
        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            if i == 0 || i == last {
                println!("{}", line.bold());
            } else {
                println!("{}", line);
            }
        }

        if !scan.skipped().is_empty() {
            Self::warning(&format!(
                "{} entr{} could not be read and were skipped",
                scan.skipped().len(),
                if scan.skipped().len() == 1 { "y" } else { "ies" }
            ));
        }
    }

    /// Prints files per destination folder with a total row.
    pub fn summary_table(folder_counts: &BTreeMap<PathBuf, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_folder_len = folder_counts
            .keys()
            .map(|folder| folder.display().to_string().chars().count())
            .max()
            .unwrap_or(0)
            .max("Folder".len());

        println!(
            "{:<width$} | {}",
            "Folder".bold(),
            "Files".bold(),
            width = max_folder_len
        );
        println!("{}", "-".repeat(max_folder_len + 10));

        for (folder, count) in folder_counts {
            println!(
                "{:<width$} | {} {}",
                folder.display().to_string(),
                count.to_string().green(),
                plural_files(*count),
                width = max_folder_len
            );
        }

        println!("{}", "-".repeat(max_folder_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural_files(total_files),
            width = max_folder_len
        );
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
