//! JSON document IO shared by registries, prune lists, manifests and collections.

use std::{path::Path, path::PathBuf, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::fs::{FileSystem, FileSystemError};

#[derive(Error, Debug, Clone)]
pub enum DocumentError {
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error("Malformed document '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: Arc<serde_json::Error>,
    },
}

/// Read and deserialize a JSON document.
///
/// NUL bytes are stripped and invalid UTF-8 is replaced before parsing; documents edited on
/// some platforms carry both.
///
/// # Errors
///
/// Returns [`DocumentError::FileSystem`] when the file cannot be read and
/// [`DocumentError::Malformed`] when it does not parse as `T`.
pub fn read_json<T, F>(fs: &F, path: &Path) -> Result<T, DocumentError>
where
    T: DeserializeOwned,
    F: FileSystem + ?Sized,
{
    let mut raw = fs.read_bytes(path)?;
    raw.retain(|b| *b != 0);
    let text = String::from_utf8_lossy(&raw);

    serde_json::from_str(&text).map_err(|e| DocumentError::Malformed {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })
}

/// Serialize `value` as pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`DocumentError`] when serialization or the write fails.
pub fn write_json<T, F>(fs: &F, path: &Path, value: &T) -> Result<(), DocumentError>
where
    T: Serialize,
    F: FileSystem + ?Sized,
{
    let mut text = serde_json::to_string_pretty(value).map_err(|e| DocumentError::Malformed {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })?;
    text.push('\n');

    fs.write_file(path, text.as_bytes())?;
    Ok(())
}
