//! Session state for one folder at a time.
//!
//! A [`Session`] replaces loose "selected folder" and "last scan" fields
//! with one object that walks the linear workflow
//! `Idle → Scanning → Scanned → Organizing → Done` and refuses triggers
//! that do not fit the current state.

use crate::config::CompiledFilters;
use crate::file_organizer::{OrganizeError, OrganizePlan, OrganizeReport};
use crate::scanner::{self, ScanError, ScanReport};
use crate::worker::{self, OrganizeHandle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Workflow state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    Scanned,
    Organizing,
    Done,
}

/// Errors raised by session operations.
///
/// User-input variants are returned before anything on disk changes.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please select a folder first.")]
    NoFolderSelected,

    #[error("Please crawl the folder before organizing.")]
    NotScanned,

    #[error("Please select at least one file type.")]
    NoTypesSelected,

    #[error("File type {0} was not found in the last crawl.")]
    UnknownExtension(String),

    #[error("An organize run is still in progress.")]
    Busy,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),
}

/// Folder selection, last scan and type selection for one user session.
#[derive(Debug)]
pub struct Session {
    filters: CompiledFilters,
    folder: Option<PathBuf>,
    scan: Option<ScanReport>,
    selection: BTreeSet<String>,
    state: SessionState,
}

impl Session {
    pub fn new(filters: CompiledFilters) -> Self {
        Self {
            filters,
            folder: None,
            scan: None,
            selection: BTreeSet::new(),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    /// The most recent scan, if it has not been consumed or cleared.
    pub fn scan(&self) -> Option<&ScanReport> {
        self.scan.as_ref()
    }

    /// Currently selected extension keys.
    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    fn ensure_idle_worker(&self) -> Result<(), SessionError> {
        if self.state == SessionState::Organizing {
            Err(SessionError::Busy)
        } else {
            Ok(())
        }
    }

    /// Chooses a new folder and discards any previous scan.
    pub fn select_folder(&mut self, folder: impl Into<PathBuf>) -> Result<(), SessionError> {
        self.ensure_idle_worker()?;
        self.reset();
        self.folder = Some(folder.into());
        Ok(())
    }

    /// Forgets the folder, scan and selection.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.ensure_idle_worker()?;
        self.reset();
        self.folder = None;
        Ok(())
    }

    fn reset(&mut self) {
        self.scan = None;
        self.selection.clear();
        self.state = SessionState::Idle;
    }

    /// Scans the selected folder, replacing any earlier scan.
    ///
    /// A failed scan leaves the session idle with the folder still selected.
    pub fn scan_folder(&mut self) -> Result<&ScanReport, SessionError> {
        self.ensure_idle_worker()?;
        let folder = self.folder.clone().ok_or(SessionError::NoFolderSelected)?;

        self.reset();
        self.state = SessionState::Scanning;
        match scanner::scan_directory(&folder, &self.filters) {
            Ok(report) => {
                self.state = SessionState::Scanned;
                Ok(self.scan.insert(report))
            }
            Err(e) => {
                self.state = SessionState::Idle;
                Err(e.into())
            }
        }
    }

    /// Replaces the selection with the given labels (`.jpg`, `jpg` or
    /// `[No Extension]`).
    ///
    /// A label that is itself a key of the scan is taken as is, so escaped
    /// non-UTF-8 keys can be selected. Every label must name an extension
    /// present in the current scan; otherwise nothing changes.
    pub fn select<'a>(
        &mut self,
        labels: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), SessionError> {
        self.ensure_idle_worker()?;
        let scan = self.scan.as_ref().ok_or(SessionError::NotScanned)?;

        let mut selection = BTreeSet::new();
        for label in labels {
            let key = if scan.contains(label) {
                label.to_string()
            } else {
                scanner::key_from_label(label)
            };
            if !scan.contains(&key) {
                return Err(SessionError::UnknownExtension(label.to_string()));
            }
            selection.insert(key);
        }

        self.selection = selection;
        Ok(())
    }

    /// Selects every extension of the current scan.
    pub fn select_all(&mut self) -> Result<(), SessionError> {
        self.ensure_idle_worker()?;
        let scan = self.scan.as_ref().ok_or(SessionError::NotScanned)?;
        self.selection = scan.keys().map(str::to_string).collect();
        Ok(())
    }

    /// Builds the organize plan for the current selection without changing
    /// state. Used for dry runs.
    pub fn plan(&self) -> Result<OrganizePlan, SessionError> {
        self.ensure_idle_worker()?;
        if self.folder.is_none() {
            return Err(SessionError::NoFolderSelected);
        }
        let scan = match (&self.scan, self.state) {
            (Some(scan), SessionState::Scanned) => scan,
            _ => return Err(SessionError::NotScanned),
        };
        if self.selection.is_empty() {
            return Err(SessionError::NoTypesSelected);
        }

        Ok(OrganizePlan::from_scan(
            scan,
            self.selection.iter().map(String::as_str),
        ))
    }

    /// Starts organizing on the worker thread and moves to `Organizing`.
    ///
    /// The scan is consumed. Call [`Session::finish_organize`] with the
    /// worker's result to leave the `Organizing` state.
    pub fn start_organize(&mut self) -> Result<OrganizeHandle, SessionError> {
        let plan = self.plan()?;
        self.scan = None;
        self.selection.clear();
        self.state = SessionState::Organizing;
        log::debug!(
            "Organizing {} file(s) under {}",
            plan.total_files(),
            plan.root().display()
        );
        Ok(worker::spawn_organize(plan))
    }

    /// Records the worker's result and moves to `Done`.
    pub fn finish_organize(
        &mut self,
        result: Result<OrganizeReport, OrganizeError>,
    ) -> Result<OrganizeReport, SessionError> {
        self.state = SessionState::Done;
        result.map_err(SessionError::from)
    }

    /// Runs a whole organize on the worker and waits for it.
    pub fn organize(
        &mut self,
        on_progress: impl FnMut(&crate::file_organizer::Progress),
    ) -> Result<OrganizeReport, SessionError> {
        let handle = self.start_organize()?;
        let result = handle.wait(on_progress);
        self.finish_organize(result)
    }
}
