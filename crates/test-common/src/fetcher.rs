//! A [`SourceFetcher`] that serves fixture directories instead of cloning.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use olaf::{
    fetch::{FetchError, Snapshot, SourceFetcher},
    fs::{FileSystem, RemovalPolicy, real::RealFileSystem, remove_tree},
    layout::PACKAGE_TREE_DIR,
    overlay::copy_tree,
    source::Source,
};

/// Serves `<sources>/<owner>/<repo>/<revision>` and records every fetch in order
#[derive(Debug, Clone)]
pub struct FixtureFetcher {
    sources: PathBuf,
    fetched: Arc<Mutex<Vec<String>>>,
    available: bool,
}

impl FixtureFetcher {
    pub fn new(sources: impl Into<PathBuf>) -> Self {
        Self {
            sources: sources.into(),
            fetched: Arc::default(),
            available: true,
        }
    }

    /// A fetcher whose tool check fails, as if git were not installed
    pub fn unavailable(sources: impl Into<PathBuf>) -> Self {
        Self {
            available: false,
            ..Self::new(sources)
        }
    }

    /// Sources fetched so far, as `owner/repo@revision`
    #[must_use]
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn fixture_dir(&self, source: &Source) -> PathBuf {
        self.sources
            .join(source.repository())
            .join(source.revision())
    }
}

#[async_trait]
impl SourceFetcher for FixtureFetcher {
    async fn ensure_available(&self) -> Result<(), FetchError> {
        if self.available {
            Ok(())
        } else {
            Err(FetchError::ToolUnavailable {
                program: "git".to_string(),
            })
        }
    }

    async fn fetch(&self, source: &Source, destination: &Path) -> Result<Snapshot, FetchError> {
        self.fetched.lock().unwrap().push(source.to_string());

        let fs = RealFileSystem;
        remove_tree(&fs, destination, &RemovalPolicy::new(1, Duration::ZERO))?;

        let fixture = self.fixture_dir(source);
        if !fs.is_dir(&fixture) {
            return Err(FetchError::CloneFailed {
                remote: source.clone(),
                stderr: format!("fatal: repository '{}' not found", source.repository()),
            });
        }
        copy_tree(&fs, &fixture, destination)?;

        let snapshot = Snapshot::new(source.clone(), destination);
        if !fs.is_dir(&snapshot.package_tree()) {
            return Err(FetchError::MissingPackageTree {
                remote: source.clone(),
                path: destination.join(PACKAGE_TREE_DIR),
            });
        }
        Ok(snapshot)
    }
}
