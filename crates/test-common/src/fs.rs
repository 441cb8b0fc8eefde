//! A [`FileSystem`] that behaves like the real one except for copies of one file name.

use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use olaf::fs::{FileSystem, FileSystemError, real::RealFileSystem};

/// Delegates to [`RealFileSystem`] but fails every copy whose destination is named `name`
#[derive(Debug, Clone)]
pub struct FailingCopyFileSystem {
    name: OsString,
}

impl FailingCopyFileSystem {
    pub fn new(name: impl Into<OsString>) -> Self {
        Self { name: name.into() }
    }
}

impl FileSystem for FailingCopyFileSystem {
    fn read_file(&self, path: &Path) -> Result<String, FileSystemError> {
        RealFileSystem.read_file(path)
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        RealFileSystem.read_bytes(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<(), FileSystemError> {
        RealFileSystem.write_file(path, data)
    }

    fn path_exists(&self, path: &Path) -> bool {
        RealFileSystem.path_exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        RealFileSystem.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        RealFileSystem.is_file(path)
    }

    fn expand_path(&self, path: &Path) -> Result<PathBuf, FileSystemError> {
        RealFileSystem.expand_path(path)
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
        RealFileSystem.list_directory(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        RealFileSystem.create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        if to.file_name() == Some(self.name.as_os_str()) {
            return Err(FileSystemError::Io {
                action: "copy",
                path: from.to_path_buf(),
                source: Arc::new(io::Error::other("copy refused")),
            });
        }
        RealFileSystem.copy_file(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), FileSystemError> {
        RealFileSystem.remove_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> Result<(), FileSystemError> {
        RealFileSystem.remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FileSystemError> {
        RealFileSystem.rename(from, to)
    }

    fn config_dir(&self) -> Result<PathBuf, FileSystemError> {
        RealFileSystem.config_dir()
    }
}
