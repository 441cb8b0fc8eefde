use std::{path::Path, time::Duration};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    commands::{CommandRunner, Invocation},
    config::AppConfig,
    fs::{FileSystem, RemovalPolicy, remove_tree},
    source::Source,
};

use super::{FetchError, Snapshot, SourceFetcher};

/// Fetches sources with a shallow, single-branch `git clone`
#[derive(Debug, Clone)]
pub struct GitFetcher<F, CR> {
    fs: F,
    runner: CR,
    base_url: String,
    git_program: String,
    timeout: Duration,
    removal: RemovalPolicy,
}

impl<F: FileSystem, CR: CommandRunner> GitFetcher<F, CR> {
    pub fn new(fs: F, runner: CR, config: &AppConfig) -> Self {
        Self {
            fs,
            runner,
            base_url: config.source_base_url().to_string(),
            git_program: config.git_program().to_string(),
            timeout: config.command_timeout(),
            removal: RemovalPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_removal_policy(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    fn clone_invocation(&self, source: &Source, destination: &Path) -> Invocation {
        Invocation::new(&self.git_program)
            .args(["clone", "--depth", "1", "--branch"])
            .arg(source.revision())
            .arg("--quiet")
            .arg("--")
            .arg(source.clone_url(&self.base_url))
            .arg(destination.display().to_string())
    }
}

#[async_trait]
impl<F: FileSystem, CR: CommandRunner> SourceFetcher for GitFetcher<F, CR> {
    async fn ensure_available(&self) -> Result<(), FetchError> {
        if self.runner.is_command_available(&self.git_program).await {
            Ok(())
        } else {
            Err(FetchError::ToolUnavailable {
                program: self.git_program.clone(),
            })
        }
    }

    async fn fetch(&self, source: &Source, destination: &Path) -> Result<Snapshot, FetchError> {
        // A failed earlier attempt may have left a partial clone behind.
        remove_tree(&self.fs, destination, &self.removal)?;
        if let Some(parent) = destination.parent() {
            self.fs.create_dir_all(parent)?;
        }

        let invocation = self.clone_invocation(source, destination);
        info!(%source, destination = %destination.display(), "fetching source");

        let output = self
            .runner
            .execute_with_timeout(&invocation, self.timeout)
            .await?;

        if !output.is_success() {
            return Err(FetchError::CloneFailed {
                remote: source.clone(),
                stderr: output.stderr_str().trim().to_string(),
            });
        }
        debug!(%source, duration = ?output.duration(), "fetch finished");

        let snapshot = Snapshot::new(source.clone(), destination);
        let package_tree = snapshot.package_tree();
        if !self.fs.is_dir(&package_tree) {
            return Err(FetchError::MissingPackageTree {
                remote: source.clone(),
                path: package_tree,
            });
        }

        Ok(snapshot)
    }
}
