//! Command-line interface module for typecrawler.
//!
//! This module handles:
//! - Argument parsing (`scan`, `organize`, `info` and the interactive `shell`)
//! - Loading scan filters
//! - Driving a [`Session`] and printing its results
//! - The menu-driven shell that mirrors the desktop workflow

use crate::config::{CompiledFilters, ConfigError, FilterConfig};
use crate::file_organizer::{MoveRecord, OrganizeReport, Progress, count_folders};
use crate::output::{ABOUT_TEXT, OutputFormatter};
use crate::scanner::display_label;
use crate::session::{Session, SessionError};
use clap::{ArgGroup, Parser, Subcommand};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect, Select};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Tally files by extension and organize selected types into category folders"
)]
pub struct Cli {
    /// Path to a TOML configuration file with scan filters
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<OrganizeCommand>,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum OrganizeCommand {
    /// Interactive menu: select folder, crawl, organize, clear, info
    Shell {
        /// Folder to start with
        #[arg(value_hint = clap::ValueHint::DirPath)]
        folder: Option<PathBuf>,
    },
    /// Count files by extension
    Scan {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        folder: PathBuf,
    },
    /// Move the selected file types into <FOLDER>/Organized
    #[command(group(ArgGroup::new("types").required(true).args(["extensions", "all"])))]
    Organize {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        folder: PathBuf,

        /// File type to organize, e.g. ".jpg", "pdf" or "[No Extension]"
        #[arg(short = 'e', long = "ext", num_args = 1, action = clap::ArgAction::Append)]
        extensions: Vec<String>,

        /// Organize every file type found
        #[arg(short, long)]
        all: bool,

        /// Only print where files would go
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Describe what this tool does
    Info,
}

impl Cli {
    /// The command to run; the interactive shell when none was given.
    pub fn command(&self) -> OrganizeCommand {
        self.command
            .clone()
            .unwrap_or(OrganizeCommand::Shell { folder: None })
    }
}

/// Runs a command with filters loaded from `config_path` (or the default
/// lookup when `None`).
///
/// ```no_run
/// use std::path::PathBuf;
/// use typecrawler::cli::{OrganizeCommand, run_cli};
///
/// let command = OrganizeCommand::Scan { folder: PathBuf::from("/path/to/folder") };
/// if let Err(e) = run_cli(command, None) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: OrganizeCommand, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        OrganizeCommand::Info => {
            show_info();
            Ok(())
        }
        OrganizeCommand::Scan { folder } => {
            let filters = load_filters(config_path)?;
            scan_folder(&folder, filters)
        }
        OrganizeCommand::Organize {
            folder,
            extensions,
            all,
            dry_run,
        } => {
            let filters = load_filters(config_path)?;
            let labels: Vec<&str> = extensions.iter().map(String::as_str).collect();
            if dry_run {
                organize_folder_dry_run(&folder, &labels, all, filters).map(|_| ())
            } else {
                organize_folder(&folder, &labels, all, filters).map(|_| ())
            }
        }
        OrganizeCommand::Shell { folder } => {
            let filters = load_filters(config_path)?;
            Shell::new(filters, folder).run()
        }
    }
}

/// Loads and compiles scan filters.
pub fn load_filters(config_path: Option<&Path>) -> Result<CompiledFilters, CliError> {
    let filters = FilterConfig::load(config_path)?.compile()?;
    if !filters.is_permissive() {
        log::info!("Scan filters are active; some files will not be counted");
    }
    Ok(filters)
}

/// Scans `folder` and prints the file type table.
pub fn scan_folder(folder: &Path, filters: CompiledFilters) -> Result<(), CliError> {
    let mut session = Session::new(filters);
    session.select_folder(folder)?;
    let scan = session.scan_folder()?;
    OutputFormatter::extension_table(scan);
    Ok(())
}

fn prepare_session(
    folder: &Path,
    labels: &[&str],
    all: bool,
    filters: CompiledFilters,
) -> Result<Session, CliError> {
    let mut session = Session::new(filters);
    session.select_folder(folder)?;
    session.scan_folder()?;
    if all {
        session.select_all()?;
    } else {
        session.select(labels.iter().copied())?;
    }
    Ok(session)
}

/// Scans `folder`, then moves the selected types into `folder/Organized`
/// on the worker thread while showing a progress bar.
pub fn organize_folder(
    folder: &Path,
    labels: &[&str],
    all: bool,
    filters: CompiledFilters,
) -> Result<OrganizeReport, CliError> {
    let mut session = prepare_session(folder, labels, all, filters)?;
    let report = run_organize(&mut session)?;
    print_organize_report(&report);
    Ok(report)
}

/// Scans `folder` and prints where the selected files would go.
pub fn organize_folder_dry_run(
    folder: &Path,
    labels: &[&str],
    all: bool,
    filters: CompiledFilters,
) -> Result<Vec<MoveRecord>, CliError> {
    let session = prepare_session(folder, labels, all, filters)?;
    let plan = session.plan()?;
    let records = plan.preview();

    OutputFormatter::dry_run_notice(&format!(
        "Analyzing {} file(s) in {}",
        plan.total_files(),
        plan.root().display()
    ));

    if records.is_empty() {
        OutputFormatter::plain("No files would be moved.");
        return Ok(records);
    }

    for record in &records {
        let shown_source = record
            .source
            .strip_prefix(plan.root())
            .unwrap_or(&record.source);
        let shown_destination = record
            .destination
            .strip_prefix(plan.root())
            .unwrap_or(&record.destination);
        OutputFormatter::plain(&format!(
            " - {} → {}",
            shown_source.display(),
            shown_destination.display()
        ));
    }

    OutputFormatter::summary_table(&count_folders(&records), records.len());
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(records)
}

fn run_organize(session: &mut Session) -> Result<OrganizeReport, CliError> {
    let total = session.plan()?.total_files();
    let pb = OutputFormatter::create_progress_bar(total as u64);
    let handle = session.start_organize()?;

    let result = handle.wait(|progress| update_progress(&pb, progress));
    pb.finish_and_clear();

    Ok(session.finish_organize(result)?)
}

fn update_progress(pb: &ProgressBar, progress: &Progress) {
    pb.set_position(progress.done as u64);
    if let Some(name) = progress.path.file_name() {
        pb.set_message(name.to_string_lossy().into_owned());
    }
}

/// The headline of a finished run. `None` when nothing moved, in which case
/// the destination may have been pruned as empty.
fn completion_message(report: &OrganizeReport) -> Option<String> {
    if report.moved.is_empty() {
        None
    } else {
        Some(format!(
            "Files have been organized into: {}",
            report.destination_root.display()
        ))
    }
}

fn print_organize_report(report: &OrganizeReport) {
    match completion_message(report) {
        Some(message) => {
            OutputFormatter::success(&message);
            OutputFormatter::summary_table(&report.counts_by_folder(), report.moved.len());
        }
        None => OutputFormatter::warning("No files were moved."),
    }
    if !report.in_place.is_empty() {
        OutputFormatter::info(&format!(
            "{} file(s) were already in place",
            report.in_place.len()
        ));
    }
    if !report.skipped.is_empty() {
        OutputFormatter::warning(&format!(
            "{} file(s) were skipped:",
            report.skipped.len()
        ));
        for (path, reason) in &report.skipped {
            OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
        }
    }
    if report.removed_dirs > 0 {
        OutputFormatter::info(&format!(
            "Removed {} empty folder(s)",
            report.removed_dirs
        ));
    }
}

fn show_info() {
    OutputFormatter::header("Info");
    OutputFormatter::plain(ABOUT_TEXT);
}

/// Entries of the interactive menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    SelectFolder,
    Crawl,
    Organize,
    Clear,
    Info,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 6] = [
        MenuAction::SelectFolder,
        MenuAction::Crawl,
        MenuAction::Organize,
        MenuAction::Clear,
        MenuAction::Info,
        MenuAction::Quit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MenuAction::SelectFolder => "Select Folder",
            MenuAction::Crawl => "Crawl Folder",
            MenuAction::Organize => "Organize Selected Files",
            MenuAction::Clear => "Clear Results",
            MenuAction::Info => "Info",
            MenuAction::Quit => "Quit",
        }
    }
}

/// Menu-driven front end over a [`Session`].
///
/// Each action runs to completion before the menu is shown again, so an
/// organize run on the worker cannot be triggered twice.
pub struct Shell {
    session: Session,
    theme: ColorfulTheme,
    initial_folder: Option<PathBuf>,
}

impl Shell {
    pub fn new(filters: CompiledFilters, initial_folder: Option<PathBuf>) -> Self {
        Self {
            session: Session::new(filters),
            theme: ColorfulTheme::default(),
            initial_folder,
        }
    }

    /// Runs the menu loop until the user quits.
    pub fn run(mut self) -> Result<(), CliError> {
        OutputFormatter::header("File Type Crawler");

        if let Some(folder) = self.initial_folder.take() {
            self.session.select_folder(folder)?;
        }

        loop {
            self.print_status();
            let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();
            let choice = Select::with_theme(&self.theme)
                .with_prompt("Choose an action")
                .items(&labels[..])
                .default(0)
                .interact_opt()?;

            let action = match choice {
                Some(index) => MenuAction::ALL[index],
                None => MenuAction::Quit,
            };
            if action == MenuAction::Quit {
                return Ok(());
            }

            if let Err(e) = self.dispatch(action) {
                if matches!(e, CliError::Prompt(_)) {
                    return Err(e);
                }
                OutputFormatter::error(&e.to_string());
            }
        }
    }

    fn print_status(&self) {
        let folder = self
            .session
            .folder()
            .map_or_else(|| "None".to_string(), |f| f.display().to_string());
        OutputFormatter::info(&format!("Selected Folder: {}", folder));
    }

    fn dispatch(&mut self, action: MenuAction) -> Result<(), CliError> {
        match action {
            MenuAction::SelectFolder => self.select_folder(),
            MenuAction::Crawl => self.crawl(),
            MenuAction::Organize => self.organize(),
            MenuAction::Clear => {
                self.session.clear()?;
                OutputFormatter::plain("Results cleared.");
                Ok(())
            }
            MenuAction::Info => {
                show_info();
                Ok(())
            }
            MenuAction::Quit => Ok(()),
        }
    }

    fn select_folder(&mut self) -> Result<(), CliError> {
        let mut prompt = Input::<String>::with_theme(&self.theme).with_prompt("Folder to crawl");
        if let Some(current) = self.session.folder() {
            prompt = prompt.with_initial_text(current.display().to_string());
        }
        let answer = prompt.allow_empty(true).interact_text()?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(());
        }
        self.session.select_folder(answer)?;
        Ok(())
    }

    fn crawl(&mut self) -> Result<(), CliError> {
        let scan = self.session.scan_folder()?;
        OutputFormatter::extension_table(scan);
        Ok(())
    }

    fn organize(&mut self) -> Result<(), CliError> {
        let scan = self.session.scan().ok_or(SessionError::NotScanned)?;
        if scan.is_empty() {
            return Err(SessionError::NoTypesSelected.into());
        }

        let keys: Vec<String> = scan.keys().map(str::to_string).collect();
        let items: Vec<String> = scan
            .counts()
            .map(|(key, count)| format!("{} ({})", display_label(key), count))
            .collect();
        let defaults: Vec<bool> = keys
            .iter()
            .map(|key| self.session.selection().contains(key))
            .collect();

        let picked = MultiSelect::with_theme(&self.theme)
            .with_prompt("Select file types to organize (space to toggle, enter to confirm)")
            .items(&items[..])
            .defaults(&defaults)
            .interact()?;

        let labels: Vec<&str> = picked.iter().map(|&i| display_label(&keys[i])).collect();
        self.session.select(labels)?;

        let report = run_organize(&mut self.session)?;
        print_organize_report(&report);
        Ok(())
    }
}
