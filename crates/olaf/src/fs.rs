//! File system abstraction layer
//!
//! Every component of the installer touches the disk through the [`FileSystem`] port so the
//! pipeline can be exercised against temporary directories or mocks. The std-backed adapter
//! lives in [`real`]; the retrying removal helper used by every destructive step lives in
//! [`remove`].

pub mod real;
pub mod remove;

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use thiserror::Error;

pub use self::remove::{Removal, RemovalPolicy, remove_tree};

/// Port for file system operations (Hexagonal Architecture)
///
/// All file system interactions in the olaf library go through this abstraction. Paths are
/// always passed in explicitly; no implementation resolves the installation root on its own.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem: Send + Sync {
    /// Read a file and return its contents as a UTF-8 string
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the file cannot be read or is not valid UTF-8.
    fn read_file(&self, path: &Path) -> Result<String, FileSystemError>;

    /// Read a file as raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the file cannot be read.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FileSystemError>;

    /// Write data to a file, creating parent directories as needed and replacing any existing
    /// content.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the parent directory cannot be created or the write fails.
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), FileSystemError>;

    /// Check if a path exists (file, directory or anything else)
    fn path_exists(&self, path: &Path) -> bool;

    /// Check if a path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if a path exists and is a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Expand `~` and make the path absolute
    ///
    /// The path does not need to exist.
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the home directory or the current directory cannot be
    /// determined.
    fn expand_path(&self, path: &Path) -> Result<PathBuf, FileSystemError>;

    /// List the direct entries of a directory
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the directory cannot be read.
    fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError>;

    /// Create a directory and all of its missing parents
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if any component cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError>;

    /// Copy a single file byte-for-byte, overwriting the destination
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the source cannot be read or the destination written.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError>;

    /// Remove a directory and everything beneath it (single attempt)
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if anything under the directory cannot be removed.
    fn remove_dir_all(&self, path: &Path) -> Result<(), FileSystemError>;

    /// Remove a single file (single attempt)
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the file cannot be removed.
    fn remove_file(&self, path: &Path) -> Result<(), FileSystemError>;

    /// Rename a file or directory
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError`] if the rename is not possible.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FileSystemError>;

    /// Get the directory that holds the user's olaf configuration
    ///
    /// # Errors
    ///
    /// Returns [`FileSystemError::HomeDirNotFound`] if no home directory can be determined.
    fn config_dir(&self) -> Result<PathBuf, FileSystemError>;
}

/// Errors that can occur during file system operations
#[derive(Error, Debug, Clone)]
pub enum FileSystemError {
    /// An IO operation failed on a specific path
    #[error("Failed to {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// Deletion kept failing and moving the path aside failed as well
    #[error("'{}' is locked: removal failed after {attempts} attempt(s) and it could not be moved aside", path.display())]
    LockedPath {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: Box<FileSystemError>,
    },

    /// Home directory could not be determined (needed for path expansion)
    #[error("Home directory not found")]
    HomeDirNotFound,
}

impl FileSystemError {
    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source: Arc::new(source),
        }
    }

    /// Whether the underlying cause is a missing path
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
impl MockFileSystem {
    /// Make `path` read back as `content`
    pub(crate) fn mock_read_file<P, S>(&mut self, path: P, content: S)
    where
        PathBuf: From<P>,
        S: ToString,
    {
        let path_buf = PathBuf::from(path);
        let content_string = content.to_string();
        self.expect_read_file()
            .with(mockall::predicate::eq(path_buf))
            .returning(move |_| Ok(content_string.clone()));
    }

    /// Report a fixed existence result for `path`
    pub(crate) fn mock_path_exists<P>(&mut self, path: P, exists: bool)
    where
        PathBuf: From<P>,
    {
        self.expect_path_exists()
            .with(mockall::predicate::eq(PathBuf::from(path)))
            .returning(move |_| exists);
    }

    /// Report a fixed directory result for `path`
    pub(crate) fn mock_is_dir<P>(&mut self, path: P, is_dir: bool)
    where
        PathBuf: From<P>,
    {
        self.expect_is_dir()
            .with(mockall::predicate::eq(PathBuf::from(path)))
            .returning(move |_| is_dir);
    }

    pub(crate) fn mock_config_dir_ok<P>(&mut self, path: P)
    where
        PathBuf: From<P>,
    {
        let p = PathBuf::from(path);
        self.expect_config_dir().return_once(|| Ok(p));
    }

    /// Simulate a `config.yaml` (and no `config.yml`) in `config_dir`
    pub(crate) fn mock_config_file(&mut self, config_dir: &Path, config_yaml: &str) {
        let config_dir_owned = PathBuf::from(config_dir);
        let config_path = config_dir.join("config.yaml");

        self.expect_config_dir()
            .return_once(|| Ok(config_dir_owned));
        self.mock_path_exists(&config_path, true);
        self.mock_read_file(&config_path, config_yaml);

        self.mock_path_exists(config_dir.join("config.yml"), false);
    }

    pub(crate) fn mock_expand_path<P>(&mut self, input: P, output: P)
    where
        PathBuf: From<P>,
    {
        let input = PathBuf::from(input);
        let output = PathBuf::from(output);

        self.expect_expand_path()
            .with(mockall::predicate::eq(input))
            .return_once(|_| Ok(output));
    }
}
