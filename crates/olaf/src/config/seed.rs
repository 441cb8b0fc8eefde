//! Project-level source pinning (`_olaf-config.json` in the project root).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{document::read_json, fs::FileSystem};

/// Seed file names, in lookup order
pub const SEED_FILES: [&str; 2] = ["_olaf-config.json", "olaf-config.json"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SeedConfig {
    #[serde(rename = "registry-repo", default)]
    registry_repo: Option<String>,

    #[serde(default)]
    branch: Option<String>,
}

impl SeedConfig {
    #[must_use]
    pub fn registry_repo(&self) -> Option<&str> {
        self.registry_repo.as_deref()
    }

    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

/// Load the first seed file found in `project_root`.
///
/// A seed file that cannot be parsed is ignored with a warning, the same as a missing one.
pub fn load_seed<F>(fs: &F, project_root: &Path) -> Option<(PathBuf, SeedConfig)>
where
    F: FileSystem + ?Sized,
{
    let path = SEED_FILES
        .iter()
        .map(|name| project_root.join(name))
        .find(|path| fs.is_file(path))?;

    match read_json::<SeedConfig, _>(fs, &path) {
        Ok(seed) => {
            debug!(path = %path.display(), ?seed, "loaded project seed");
            Some((path, seed))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable project seed");
            None
        }
    }
}
