//! The install operation: ports wired into one sequential pipeline that reports through an
//! event stream.

pub mod event;
mod pipeline;

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::instrument;

use self::event::{EventMetadata, EventSender, EventStream, InstallEvent, OperationResult};
use crate::{
    commands::{CommandError, CommandRunner},
    config::AppConfig,
    diagnostic::Diagnostic,
    document::DocumentError,
    fetch::{FetchError, SourceFetcher},
    fs::{FileSystem, FileSystemError, RemovalPolicy},
    local::{LocalError, LocalOutcome},
    overlay::MergeError,
    preserve::PreservedUnit,
    source::{Source, SourceOrigin, SourceParseError},
};

/// Number of progress steps one install reports
pub const INSTALL_STEPS: u32 = 13;

/// Helper for tracking progress through operation steps
#[derive(Debug, Clone)]
pub(crate) struct ProgressTracker {
    current_step: u32,
    total_steps: u32,
}

impl ProgressTracker {
    pub(crate) fn new(total_steps: u32) -> Self {
        Self {
            current_step: 0,
            total_steps,
        }
    }

    pub(crate) async fn next(&mut self, sender: &EventSender, message: impl std::fmt::Display) {
        self.current_step += 1;
        let enhanced_message = format!("{} ({}/{})", message, self.current_step, self.total_steps);
        sender
            .send_progress(self.current_step, self.total_steps, enhanced_message)
            .await;
    }
}

/// Per-run switches; everything not set here comes from [`AppConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    /// Primary repository override (`--repo`)
    pub repository: Option<String>,
    /// Primary revision override (`--branch`)
    pub branch: Option<String>,
    /// Installation root override (`--target`)
    pub target: Option<PathBuf>,
    /// Project root override (`--local`)
    pub local: Option<PathBuf>,
    pub clean_global: bool,
    pub clean_local: bool,
    /// Keep the kernel competency and its skills across the install
    pub preserve_kernel: bool,
    pub prune: bool,
    /// Extra prune list, relative paths resolve against the project root
    pub prune_file: Option<PathBuf>,
    /// Run `git init` in the project root when it is not a repository
    pub init_git: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            repository: None,
            branch: None,
            target: None,
            local: None,
            clean_global: false,
            clean_local: false,
            preserve_kernel: true,
            prune: true,
            prune_file: None,
            init_git: false,
        }
    }
}

/// What a successful install did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub primary: Source,
    pub origin: SourceOrigin,
    pub target: PathBuf,
    pub project: PathBuf,
    pub git_initialized: bool,
    /// Sources merged into the installation, in application order (primary last)
    pub applied: Vec<Source>,
    pub skipped_secondaries: Vec<Source>,
    pub preserved: Vec<PreservedUnit>,
    pub prune_sources: Vec<PathBuf>,
    pub pruned: Vec<String>,
    pub prune_skipped: Vec<String>,
    pub collections_changed: bool,
    pub active_collection_synced: bool,
    pub kernel_manifest_generated: bool,
    pub indexes: Vec<PathBuf>,
    pub local: LocalOutcome,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fatal install errors
#[derive(Error, Debug, Clone)]
pub enum InstallError {
    #[error("Invalid primary source: {0}")]
    Source(#[from] SourceParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Local(#[from] LocalError),

    #[error("Operation aborted by user")]
    Aborted,
}

/// Primary port for the install operation
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InstallService: Send + Sync {
    /// Run an install; the stream ends with exactly one [`InstallEvent::Completed`]
    async fn install(&self, options: InstallOptions) -> EventStream;
}

/// Implementation of the [`InstallService`]
#[derive(Debug)]
pub struct InstallServiceImpl<F, SF, CR> {
    fs: F,
    fetcher: SF,
    command_runner: CR,
    config: AppConfig,
    removal: RemovalPolicy,
}

impl<F, SF, CR> InstallServiceImpl<F, SF, CR>
where
    F: FileSystem + Clone + 'static,
    SF: SourceFetcher + Clone + 'static,
    CR: CommandRunner + Clone + 'static,
{
    pub fn new(fs: F, fetcher: SF, command_runner: CR, config: AppConfig) -> Self {
        Self {
            fs,
            fetcher,
            command_runner,
            config,
            removal: RemovalPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_removal_policy(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    // Helper to create an event stream
    fn create_event_stream<H, Fut>(f: H) -> EventStream
    where
        H: FnOnce(mpsc::Sender<InstallEvent>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            f(tx).await;
        });

        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        }))
    }
}

#[async_trait::async_trait]
impl<F, SF, CR> InstallService for InstallServiceImpl<F, SF, CR>
where
    F: FileSystem + Clone + std::fmt::Debug + 'static,
    SF: SourceFetcher + Clone + std::fmt::Debug + 'static,
    CR: CommandRunner + Clone + std::fmt::Debug + 'static,
{
    #[instrument(skip(self))]
    async fn install(&self, options: InstallOptions) -> EventStream {
        let fs = self.fs.clone();
        let fetcher = self.fetcher.clone();
        let command_runner = self.command_runner.clone();
        let config = self.config.clone();
        let removal = self.removal;
        let target = options
            .target
            .clone()
            .unwrap_or_else(|| config.target_directory().clone());

        Self::create_event_stream(move |tx| async move {
            let sender = EventSender::new(tx, EventMetadata::new(target));
            sender.send_started().await;

            let mut progress = ProgressTracker::new(INSTALL_STEPS);
            let deps = pipeline::Deps {
                fs: &fs,
                fetcher: &fetcher,
                runner: &command_runner,
                config: &config,
                removal: &removal,
            };
            let result = pipeline::run(deps, &options, &sender, &mut progress).await;

            if let Err(error) = &result {
                sender
                    .send_error(error.clone(), format!("Install failed: {error}"))
                    .await;
            }
            sender.send_completed(result.into()).await;
        })
    }
}
