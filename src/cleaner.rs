//! Empty directory pruning.

use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Removes every empty directory below `root`, repeating full bottom-up
/// passes until one removes nothing. Returns how many directories went.
///
/// The root itself is kept even when it ends up empty. Symlinks are never
/// followed or removed.
///
/// # Errors
///
/// Fails if the tree cannot be listed or an empty directory cannot be
/// removed. A directory that disappears mid-pass is not an error.
pub fn remove_empty_dirs(root: &Path) -> OrganizeResult<usize> {
    let mut removed = 0;
    let mut pass = 0;

    loop {
        pass += 1;
        let removed_this_pass = sweep(root)?;
        log::debug!(
            "Cleanup pass {} under {} removed {} director{}",
            pass,
            root.display(),
            removed_this_pass,
            if removed_this_pass == 1 { "y" } else { "ies" }
        );
        if removed_this_pass == 0 {
            break;
        }
        removed += removed_this_pass;
    }

    Ok(removed)
}

fn sweep(root: &Path) -> OrganizeResult<usize> {
    let cleanup_error = |source: io::Error| OrganizeError::CleanupFailed {
        path: root.to_path_buf(),
        source,
    };

    let mut removed = 0;
    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .contents_first(true);

    for entry in walker {
        let entry = entry.map_err(|e| cleanup_error(e.into()))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let is_empty = match fs::read_dir(path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(cleanup_error(e)),
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(path) {
            Ok(()) => {
                log::debug!("Removed empty directory {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(cleanup_error(e)),
        }
    }

    Ok(removed)
}
