//! Remote fetcher port: turns a [`Source`] into a local [`Snapshot`].

pub mod git;

pub use self::git::GitFetcher;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    commands::CommandError,
    fs::FileSystemError,
    layout::PACKAGE_TREE_DIR,
    source::Source,
};

/// Port for retrieving source snapshots
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Check that the fetcher can run at all (e.g. the version-control client is installed)
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when no fetch could possibly succeed.
    async fn ensure_available(&self) -> Result<(), FetchError>;

    /// Retrieve `source` into `destination`, replacing whatever was there
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the remote or revision cannot be retrieved, or when the
    /// retrieved tree has no package folder.
    async fn fetch(&self, source: &Source, destination: &Path) -> Result<Snapshot, FetchError>;
}

/// A fetched, read-only copy of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    source: Source,
    root: PathBuf,
}

impl Snapshot {
    #[must_use]
    pub fn new(source: Source, root: impl Into<PathBuf>) -> Self {
        Self {
            source,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Repository root of the snapshot (registry and seed documents live here)
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The installable tree inside the snapshot
    #[must_use]
    pub fn package_tree(&self) -> PathBuf {
        self.root.join(PACKAGE_TREE_DIR)
    }
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("'{program}' is not available; it is required to fetch sources")]
    ToolUnavailable { program: String },

    #[error("Failed to fetch {remote}: {stderr}")]
    CloneFailed { remote: Source, stderr: String },

    #[error("{remote} has no '{PACKAGE_TREE_DIR}' folder at '{}'", path.display())]
    MissingPackageTree { remote: Source, path: PathBuf },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    FileSystem(#[from] FileSystemError),
}

impl FetchError {
    /// Whether the fetch itself worked but the snapshot is not a package source
    #[must_use]
    pub fn is_missing_package_tree(&self) -> bool {
        matches!(self, Self::MissingPackageTree { .. })
    }
}
