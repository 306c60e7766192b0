//! Data file discovery.
//!
//! Walks a root directory recursively and collects the absolute paths of all
//! files with the configured extension, including symlinks to files. Hidden
//! files (leading `.`) are skipped.
//! The result is sorted and free of duplicates regardless of the order the
//! filesystem returns entries in.

use super::EtlError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, EtlError> {
    if !root.is_dir() {
        return Err(EtlError::DataDirNotFound {
            path: root.to_path_buf(),
        });
    }
    let root = root.canonicalize().map_err(|source| EtlError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = BTreeSet::new();
    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry?;
        // Symlinked files count, symlinked directories are not descended into
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let is_hidden = entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false);
        if is_hidden {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.insert(path.to_path_buf());
        }
    }

    Ok(files.into_iter().collect())
}
