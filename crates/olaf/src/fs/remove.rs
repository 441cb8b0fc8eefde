//! Tree removal that tolerates transient locks.
//!
//! Antivirus scanners and editors on exclusive-lock filesystems can hold a file open for a
//! moment; removal is retried with a backoff, then the path is renamed aside so the install can
//! continue, and only if that also fails is the path reported as locked.

use std::{
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use tracing::{debug, warn};

use super::{FileSystem, FileSystemError};

const DEFAULT_ATTEMPTS: u32 = 5;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(250);

/// How hard [`remove_tree`] tries before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalPolicy {
    attempts: u32,
    backoff: Duration,
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RemovalPolicy {
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

/// What [`remove_tree`] ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// Nothing was there
    Absent,
    /// The path is gone
    Removed,
    /// Deletion kept failing; the path now lives at the given sibling path
    MovedAside(PathBuf),
}

/// Remove a file or directory tree.
///
/// # Errors
///
/// Returns [`FileSystemError::LockedPath`] when every attempt failed and the rename-aside
/// fallback failed too.
pub fn remove_tree<F>(
    fs: &F,
    path: &Path,
    policy: &RemovalPolicy,
) -> Result<Removal, FileSystemError>
where
    F: FileSystem + ?Sized,
{
    if !fs.path_exists(path) {
        return Ok(Removal::Absent);
    }

    let mut last_error = None;

    for attempt in 1..=policy.attempts {
        let result = if fs.is_dir(path) {
            fs.remove_dir_all(path)
        } else {
            fs.remove_file(path)
        };

        match result {
            Ok(()) => {
                debug!(path = %path.display(), attempt, "removed");
                return Ok(Removal::Removed);
            }
            Err(e) if e.is_not_found() => return Ok(Removal::Removed),
            Err(e) => {
                debug!(path = %path.display(), attempt, error = %e, "removal failed");
                last_error = Some(e);
                if attempt < policy.attempts && !policy.backoff.is_zero() {
                    thread::sleep(policy.backoff);
                }
            }
        }
    }

    let aside = aside_path(fs, path);
    match fs.rename(path, &aside) {
        Ok(()) => {
            warn!(
                path = %path.display(),
                aside = %aside.display(),
                "could not remove path, moved it aside instead"
            );
            Ok(Removal::MovedAside(aside))
        }
        Err(rename_error) => Err(FileSystemError::LockedPath {
            path: path.to_path_buf(),
            attempts: policy.attempts,
            source: Box::new(last_error.unwrap_or(rename_error)),
        }),
    }
}

/// `<name>_old_<stamp>`, with a `_<n>` suffix when an earlier aside already holds that name
fn aside_path<F>(fs: &F, path: &Path) -> PathBuf
where
    F: FileSystem + ?Sized,
{
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = format!("{name}_old_{}", chrono::Utc::now().timestamp());

    let mut aside = path.with_file_name(&base);
    let mut counter = 1;
    while fs.path_exists(&aside) {
        aside = path.with_file_name(format!("{base}_{counter}"));
        counter += 1;
    }
    aside
}
