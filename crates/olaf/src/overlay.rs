//! Additive tree merging: the only way snapshot content reaches an installation.

use std::{
    ops::AddAssign,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

use crate::fs::{FileSystem, FileSystemError, RemovalPolicy, remove_tree};

#[derive(Error, Debug, Clone)]
pub enum MergeError {
    #[error("Source tree '{}' does not exist", path.display())]
    MissingSourceTree { path: PathBuf },

    #[error(transparent)]
    FileSystem(#[from] FileSystemError),
}

/// Counts of what one merge wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub files_written: usize,
    pub directories_created: usize,
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.files_written += rhs.files_written;
        self.directories_created += rhs.directories_created;
    }
}

/// Merge every entry of `subtree` into `root`, skipping top-level names in `excluded`.
///
/// Directories are merged recursively and files overwrite files. Nothing that exists only in
/// `root` is removed. When a directory meets a file (or the reverse) the incoming entry
/// replaces the existing one.
///
/// # Errors
///
/// Returns [`MergeError::MissingSourceTree`] if `subtree` is not a directory, and
/// [`MergeError::FileSystem`] if any copy fails.
pub fn merge<F>(
    fs: &F,
    subtree: &Path,
    root: &Path,
    excluded: &[&str],
) -> Result<MergeStats, MergeError>
where
    F: FileSystem + ?Sized,
{
    if !fs.is_dir(subtree) {
        return Err(MergeError::MissingSourceTree {
            path: subtree.to_path_buf(),
        });
    }

    let mut stats = MergeStats::default();
    if !fs.is_dir(root) {
        fs.create_dir_all(root)?;
        stats.directories_created += 1;
    }

    for entry in fs.list_directory(subtree)? {
        let Some(name) = entry.file_name() else {
            continue;
        };
        if excluded.iter().any(|skip| name == *skip) {
            debug!(entry = %entry.display(), "excluded from merge");
            continue;
        }
        stats += copy_tree(fs, &entry, &root.join(name))?;
    }

    debug!(
        from = %subtree.display(),
        into = %root.display(),
        files = stats.files_written,
        "merged tree"
    );
    Ok(stats)
}

/// Copy `from` (file or directory) onto `to` with merge semantics.
///
/// # Errors
///
/// Returns [`FileSystemError`] if any entry cannot be read, removed or written.
pub fn copy_tree<F>(fs: &F, from: &Path, to: &Path) -> Result<MergeStats, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    let mut stats = MergeStats::default();

    if fs.is_dir(from) {
        if fs.path_exists(to) && !fs.is_dir(to) {
            remove_tree(fs, to, &RemovalPolicy::default())?;
        }
        if !fs.is_dir(to) {
            fs.create_dir_all(to)?;
            stats.directories_created += 1;
        }
        for child in fs.list_directory(from)? {
            if let Some(name) = child.file_name() {
                stats += copy_tree(fs, &child, &to.join(name))?;
            }
        }
    } else {
        if fs.is_dir(to) {
            remove_tree(fs, to, &RemovalPolicy::default())?;
        }
        fs.copy_file(from, to)?;
        stats.files_written += 1;
    }

    Ok(stats)
}
