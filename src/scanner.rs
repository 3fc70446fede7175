//! Recursive directory scanning grouped by extension.
//!
//! A scan walks every depth below the root and groups file paths by their
//! lowercased extension key. Files without an extension share the empty key,
//! shown to users as `[No Extension]`.

use crate::config::CompiledFilters;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Label shown in place of the empty extension key.
pub const NO_EXTENSION_LABEL: &str = "[No Extension]";

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Cannot read directory {}: {source}", .path.display())]
    UnreadableRoot { path: PathBuf, source: io::Error },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Returns the lowercased raw extension of a path, or `None` when the file
/// name has no dot after its first character.
///
/// Only the valid UTF-8 parts of a non-UTF-8 extension are lowercased; any
/// other bytes are kept as they are.
pub fn lowercase_extension(path: &Path) -> Option<OsString> {
    let ext = path.extension()?;
    if let Some(text) = ext.to_str() {
        return Some(OsString::from(text.to_lowercase()));
    }
    Some(lowercase_raw(ext))
}

#[cfg(unix)]
fn lowercase_raw(ext: &OsStr) -> OsString {
    use std::os::unix::ffi::OsStringExt;

    let mut bytes = Vec::with_capacity(ext.len());
    for chunk in ext.as_encoded_bytes().utf8_chunks() {
        bytes.extend_from_slice(chunk.valid().to_lowercase().as_bytes());
        bytes.extend_from_slice(chunk.invalid());
    }
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
fn lowercase_raw(ext: &OsStr) -> OsString {
    ext.to_ascii_lowercase()
}

/// Returns the extension key of a path: the lowercased extension with its
/// leading dot, or an empty string when the file name has none.
///
/// Bytes that are not valid UTF-8 are written as `\X` plus two uppercase
/// hex digits. A lowercased key never contains `X`, so distinct raw
/// extensions always get distinct keys.
///
/// ```
/// use std::path::Path;
/// use typecrawler::scanner::extension_key;
///
/// assert_eq!(extension_key(Path::new("a.JPG")), ".jpg");
/// assert_eq!(extension_key(Path::new("archive.tar.gz")), ".gz");
/// assert_eq!(extension_key(Path::new(".bashrc")), "");
/// assert_eq!(extension_key(Path::new("Makefile")), "");
/// ```
pub fn extension_key(path: &Path) -> String {
    let Some(ext) = lowercase_extension(path) else {
        return String::new();
    };
    if let Some(text) = ext.to_str() {
        return format!(".{text}");
    }

    let mut key = String::from(".");
    for chunk in ext.as_encoded_bytes().utf8_chunks() {
        key.push_str(chunk.valid());
        for byte in chunk.invalid() {
            key.push_str(&format!("\\X{byte:02X}"));
        }
    }
    key
}

/// Returns the display label of an extension key.
pub fn display_label(ext_key: &str) -> &str {
    if ext_key.is_empty() {
        NO_EXTENSION_LABEL
    } else {
        ext_key
    }
}

/// Parses a user-supplied label back into an extension key.
///
/// Accepts `[No Extension]`, `.jpg`, `jpg` and `JPG`.
pub fn key_from_label(label: &str) -> String {
    let label = label.trim();
    if label == NO_EXTENSION_LABEL || label.is_empty() {
        String::new()
    } else if label.starts_with('.') {
        label.to_lowercase()
    } else {
        format!(".{}", label.to_lowercase())
    }
}

/// Result of scanning one directory tree.
#[derive(Debug, Clone)]
pub struct ScanReport {
    root: PathBuf,
    groups: BTreeMap<String, Vec<PathBuf>>,
    skipped: Vec<(PathBuf, String)>,
}

impl ScanReport {
    /// The absolute root that was scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension keys with their file counts, sorted by key.
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.groups
            .iter()
            .map(|(key, paths)| (key.as_str(), paths.len()))
    }

    pub fn count(&self, ext_key: &str) -> usize {
        self.groups.get(ext_key).map_or(0, Vec::len)
    }

    /// Total number of files counted.
    pub fn total_files(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Paths for an extension key in traversal order.
    pub fn group(&self, ext_key: &str) -> &[PathBuf] {
        self.groups.get(ext_key).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, ext_key: &str) -> bool {
        self.groups.contains_key(ext_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Entries below the root that could not be read.
    pub fn skipped(&self) -> &[(PathBuf, String)] {
        &self.skipped
    }
}

/// Scans `root` recursively and groups files by extension key.
///
/// Directory symlinks are not followed. A symlink to anything other than a
/// directory counts as a file. Within each directory, files are visited in
/// name order before any subdirectory is entered.
///
/// # Errors
///
/// Fails when the root is missing, is not a directory or cannot be listed.
/// Unreadable entries deeper in the tree are logged and recorded in
/// [`ScanReport::skipped`] instead.
pub fn scan_directory(root: &Path, filters: &CompiledFilters) -> Result<ScanReport, ScanError> {
    let root = std::path::absolute(root).map_err(|e| ScanError::UnreadableRoot {
        path: root.to_path_buf(),
        source: e,
    })?;

    let metadata = fs::metadata(&root).map_err(|e| ScanError::UnreadableRoot {
        path: root.clone(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root));
    }
    fs::read_dir(&root).map_err(|e| ScanError::UnreadableRoot {
        path: root.clone(),
        source: e,
    })?;

    log::debug!("Scanning {}", root.display());

    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut skipped = Vec::new();

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .sort_by(files_first)
        .min_depth(1);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map_or_else(|| root.clone(), Path::to_path_buf);
                log::warn!("Skipping {}: {}", path.display(), err);
                skipped.push((path, err.to_string()));
                continue;
            }
        };

        if !is_countable(&entry) {
            continue;
        }

        let rel_path = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        if !filters.should_include(rel_path) {
            log::debug!("Filtered out {}", rel_path.display());
            continue;
        }

        groups
            .entry(extension_key(entry.path()))
            .or_default()
            .push(entry.into_path());
    }

    log::debug!(
        "Scan of {} found {} extension(s)",
        root.display(),
        groups.len()
    );

    Ok(ScanReport {
        root,
        groups,
        skipped,
    })
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn is_countable(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())
}
