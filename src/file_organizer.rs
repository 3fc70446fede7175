/// Moving scanned files into category folders.
///
/// This module holds the conflict-safe mover and the organize workflow that
/// drives it: every selected extension group is moved, flattened, into
/// `<root>/Organized/<category>` (or `Organized/Mix/<ext>`), then empty
/// directories left behind are pruned.
use crate::cleaner;
use crate::file_category::{Category, CategoryTable};
use crate::scanner::ScanReport;
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Folder created under the scanned root to receive organized files.
pub const ORGANIZED_DIR_NAME: &str = "Organized";

/// Errors that can occur during file organization.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Invalid base path {}: {source}", .path.display())]
    InvalidBasePath { path: PathBuf, source: io::Error },

    #[error("Failed to remove empty directories under {}: {source}", .path.display())]
    CleanupFailed { path: PathBuf, source: io::Error },

    #[error("Organize worker stopped without reporting a result")]
    WorkerDisconnected,
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// One file moved (or, for a dry run, planned to move).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
    /// Destination folder relative to `Organized/`, e.g. `images` or `Mix/zip`.
    pub folder: PathBuf,
}

/// What happened to a single file handed to [`FileOrganizer::relocate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The file now lives at this path.
    Moved(PathBuf),
    /// The file was already directly inside the target folder.
    AlreadyInPlace,
    /// The file disappeared after the scan.
    Vanished,
}

/// Progress of an organize run, reported once per file.
#[derive(Debug, Clone)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub path: PathBuf,
}

/// Summary of a finished organize run.
#[derive(Debug, Clone, Default)]
pub struct OrganizeReport {
    pub destination_root: PathBuf,
    pub moved: Vec<MoveRecord>,
    pub in_place: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub removed_dirs: usize,
}

impl OrganizeReport {
    /// Number of files moved into each destination folder.
    pub fn counts_by_folder(&self) -> BTreeMap<PathBuf, usize> {
        count_folders(&self.moved)
    }
}

/// Counts move records per destination folder, keyed by the folder path
/// relative to `Organized/`.
pub fn count_folders(records: &[MoveRecord]) -> BTreeMap<PathBuf, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.folder.clone()).or_insert(0) += 1;
    }
    counts
}

/// Conflict-safe file moves.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Returns `desired` if `is_taken` rejects it, otherwise the first of
    /// `name_1.ext`, `name_2.ext`, ... that is free.
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use typecrawler::file_organizer::FileOrganizer;
    ///
    /// let taken = [PathBuf::from("out/x.png"), PathBuf::from("out/x_1.png")];
    /// let chosen = FileOrganizer::unique_destination(Path::new("out/x.png"), |p| {
    ///     taken.iter().any(|t| t == p)
    /// });
    /// assert_eq!(chosen, PathBuf::from("out/x_2.png"));
    /// ```
    pub fn unique_destination(desired: &Path, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
        if !is_taken(desired) {
            return desired.to_path_buf();
        }

        let parent = desired.parent().unwrap_or_else(|| Path::new(""));
        let stem = desired.file_stem().unwrap_or_default();
        let extension = desired.extension();

        let mut counter: u64 = 1;
        loop {
            let mut name = OsString::from(stem);
            name.push(format!("_{counter}"));
            if let Some(ext) = extension {
                name.push(".");
                name.push(ext);
            }
            let candidate = parent.join(name);
            if !is_taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Moves `source` to `desired`, renaming with a numeric suffix when
    /// something already exists there. Returns the final path.
    ///
    /// An existing entry is never overwritten. The move is a rename when
    /// possible and a copy plus delete across filesystems.
    pub fn move_with_rename(source: &Path, desired: &Path) -> OrganizeResult<PathBuf> {
        let destination = Self::unique_destination(desired, entry_exists);
        if destination != desired {
            log::debug!(
                "{} is taken, using {}",
                desired.display(),
                destination.display()
            );
        }

        move_file(source, &destination).map_err(|e| OrganizeError::FileMoveFailure {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;

        Ok(destination)
    }

    /// Moves `file_path` into `target_dir`, keeping only its file name.
    ///
    /// The source is checked again first: a file that vanished since the
    /// scan yields [`MoveOutcome::Vanished`] instead of an error.
    pub fn relocate(file_path: &Path, target_dir: &Path) -> OrganizeResult<MoveOutcome> {
        match fs::symlink_metadata(file_path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("{} vanished before it could be moved", file_path.display());
                return Ok(MoveOutcome::Vanished);
            }
            Err(e) => {
                return Err(OrganizeError::FileMoveFailure {
                    from: file_path.to_path_buf(),
                    to: target_dir.to_path_buf(),
                    source: e,
                });
            }
        }

        if file_path.parent() == Some(target_dir) {
            return Ok(MoveOutcome::AlreadyInPlace);
        }

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                from: file_path.to_path_buf(),
                to: target_dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            })?;

        let destination = Self::move_with_rename(file_path, &target_dir.join(file_name))?;
        log::debug!("Moved {} -> {}", file_path.display(), destination.display());
        Ok(MoveOutcome::Moved(destination))
    }
}

fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "Rename across filesystems, copying {} instead",
                source.display()
            );
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}

fn create_dir(path: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Everything an organize run needs, detached from the session that built it.
#[derive(Debug, Clone)]
pub struct OrganizePlan {
    root: PathBuf,
    groups: Vec<(String, Vec<PathBuf>)>,
}

impl OrganizePlan {
    pub fn new(root: PathBuf, groups: Vec<(String, Vec<PathBuf>)>) -> Self {
        Self { root, groups }
    }

    /// Builds a plan for the given extension keys of a scan, in key order.
    /// Keys the scan does not contain contribute nothing.
    pub fn from_scan<'a>(scan: &ScanReport, keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut selected: Vec<&str> = keys.into_iter().collect();
        selected.sort_unstable();
        selected.dedup();

        let groups = selected
            .into_iter()
            .map(|key| (key.to_string(), scan.group(key).to_vec()))
            .collect();

        Self::new(scan.root().to_path_buf(), groups)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where organized files end up.
    pub fn destination_root(&self) -> PathBuf {
        self.root.join(ORGANIZED_DIR_NAME)
    }

    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|(_, paths)| paths.len()).sum()
    }

    /// Runs the plan: moves every file, then removes empty directories under
    /// the root. `on_progress` is called after each file.
    ///
    /// The first filesystem error stops the run; files moved before it stay
    /// where they were moved.
    pub fn execute(&self, mut on_progress: impl FnMut(&Progress)) -> OrganizeResult<OrganizeReport> {
        if !self.root.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: self.root.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "base path is not a directory"),
            });
        }

        let destination_root = self.destination_root();
        create_dir(&destination_root)?;

        let table = CategoryTable::standard();
        let total = self.total_files();
        let mut done = 0;
        let mut report = OrganizeReport {
            destination_root: destination_root.clone(),
            ..Default::default()
        };

        for (ext_key, paths) in &self.groups {
            let category = table.categorize(ext_key);

            for path in paths {
                let folder = table.destination_subdir(path);
                let target_dir = destination_root.join(&folder);
                create_dir(&target_dir)?;

                match FileOrganizer::relocate(path, &target_dir)? {
                    MoveOutcome::Moved(destination) => report.moved.push(MoveRecord {
                        source: path.clone(),
                        destination,
                        category,
                        folder,
                    }),
                    MoveOutcome::AlreadyInPlace => report.in_place.push(path.clone()),
                    MoveOutcome::Vanished => report
                        .skipped
                        .push((path.clone(), "file no longer exists".to_string())),
                }

                done += 1;
                on_progress(&Progress {
                    done,
                    total,
                    path: path.clone(),
                });
            }
        }

        report.removed_dirs = cleaner::remove_empty_dirs(&self.root)?;
        log::info!(
            "Organized {} file(s) into {}",
            report.moved.len(),
            destination_root.display()
        );

        Ok(report)
    }

    /// Computes the moves `execute` would make without touching the disk.
    ///
    /// Destination names account for files already on disk and for names
    /// claimed by earlier moves in the same plan.
    pub fn preview(&self) -> Vec<MoveRecord> {
        let table = CategoryTable::standard();
        let destination_root = self.destination_root();
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut records = Vec::new();

        for (ext_key, paths) in &self.groups {
            let category = table.categorize(ext_key);

            for path in paths {
                let folder = table.destination_subdir(path);
                let target_dir = destination_root.join(&folder);
                let Some(file_name) = path.file_name() else {
                    continue;
                };
                if path.parent() == Some(target_dir.as_path()) {
                    continue;
                }

                let destination = FileOrganizer::unique_destination(
                    &target_dir.join(file_name),
                    |candidate| claimed.contains(candidate) || entry_exists(candidate),
                );
                claimed.insert(destination.clone());
                records.push(MoveRecord {
                    source: path.clone(),
                    destination,
                    category,
                    folder,
                });
            }
        }

        records
    }
}
