use std::{fmt, path::PathBuf, pin::Pin};

use chrono::{DateTime, Utc};
use futures::Stream;
use tokio::sync::mpsc;

use crate::diagnostic::Diagnostic;

use super::{InstallError, InstallReport};

pub type EventStream = Pin<Box<dyn Stream<Item = InstallEvent> + Send>>;

/// Context attached to every event of one install run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    target_directory: PathBuf,
    started_at: DateTime<Utc>,
    timestamp: DateTime<Utc>,
}

impl EventMetadata {
    #[must_use]
    pub fn new(target_directory: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            target_directory,
            started_at: now,
            timestamp: now,
        }
    }

    fn touch_and_clone(&self) -> Self {
        Self {
            timestamp: Utc::now(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn target_directory(&self) -> &PathBuf {
        &self.target_directory
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Final outcome carried by [`InstallEvent::Completed`]
#[derive(Debug, Clone)]
pub enum OperationResult {
    Success(Box<InstallReport>),
    Failure(InstallError),
}

impl From<Result<InstallReport, InstallError>> for OperationResult {
    fn from(result: Result<InstallReport, InstallError>) -> Self {
        match result {
            Ok(report) => Self::Success(Box::new(report)),
            Err(error) => Self::Failure(error),
        }
    }
}

/// Events emitted while an install runs
#[derive(Debug, Clone)]
pub enum InstallEvent {
    /// Operation has started
    Started { metadata: EventMetadata },

    /// A pipeline step has started
    Progress {
        metadata: EventMetadata,
        step: u32,
        total_steps: u32,
        percent_complete: f32,
        message: String,
    },

    Trace {
        metadata: EventMetadata,
        message: String,
    },

    Debug {
        metadata: EventMetadata,
        message: String,
    },

    /// Informational message
    Info {
        metadata: EventMetadata,
        message: String,
    },

    /// Warning message
    Warning {
        metadata: EventMetadata,
        message: String,
    },

    /// A non-fatal degradation; the run continues
    Diagnostic {
        metadata: EventMetadata,
        diagnostic: Diagnostic,
    },

    /// The error that ends the run
    Error {
        metadata: EventMetadata,
        error: InstallError,
        message: String,
    },

    /// Operation finished, successfully or not
    Completed {
        metadata: EventMetadata,
        result: OperationResult,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    metadata: EventMetadata,
    tx: mpsc::Sender<InstallEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::Sender<InstallEvent>, metadata: EventMetadata) -> Self {
        Self { metadata, tx }
    }

    async fn send(&self, event: InstallEvent) {
        // The receiver may have been dropped; the run still finishes.
        let _ = self.tx.send(event).await;
    }

    pub(crate) async fn send_started(&self) {
        let metadata = self.metadata.touch_and_clone();

        tracing::trace!(
            target_directory = %metadata.target_directory().display(),
            "install started",
        );
        self.send(InstallEvent::Started { metadata }).await;
    }

    pub(crate) async fn send_progress(
        &self,
        step: u32,
        total_steps: u32,
        message: impl fmt::Display,
    ) {
        let metadata = self.metadata.touch_and_clone();
        let message = message.to_string();

        tracing::info!(step, total_steps, message = &message);
        self.send(InstallEvent::Progress {
            metadata,
            step,
            total_steps,
            percent_complete: step as f32 / total_steps.max(1) as f32,
            message,
        })
        .await;
    }

    pub(crate) async fn send_trace(&self, message: impl fmt::Display) {
        let metadata = self.metadata.touch_and_clone();
        let message = message.to_string();

        tracing::trace!(message = &message);
        self.send(InstallEvent::Trace { metadata, message }).await;
    }

    pub(crate) async fn send_debug(&self, message: impl fmt::Display) {
        let metadata = self.metadata.touch_and_clone();
        let message = message.to_string();

        tracing::debug!(message = &message);
        self.send(InstallEvent::Debug { metadata, message }).await;
    }

    pub(crate) async fn send_info(&self, message: impl fmt::Display) {
        let metadata = self.metadata.touch_and_clone();
        let message = message.to_string();

        tracing::info!(message = &message);
        self.send(InstallEvent::Info { metadata, message }).await;
    }

    pub(crate) async fn send_warning(&self, message: impl fmt::Display) {
        let metadata = self.metadata.touch_and_clone();
        let message = message.to_string();

        tracing::warn!(message = &message);
        self.send(InstallEvent::Warning { metadata, message }).await;
    }

    /// Forward diagnostics that were already logged when they were recorded
    pub(crate) async fn send_diagnostics(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            let metadata = self.metadata.touch_and_clone();
            self.send(InstallEvent::Diagnostic {
                metadata,
                diagnostic: diagnostic.clone(),
            })
            .await;
        }
    }

    pub(crate) async fn send_error(&self, error: InstallError, message: impl fmt::Display) {
        let metadata = self.metadata.touch_and_clone();
        let message = message.to_string();

        tracing::error!(error = %error, message = &message);
        self.send(InstallEvent::Error {
            metadata,
            error,
            message,
        })
        .await;
    }

    pub(crate) async fn send_completed(&self, result: OperationResult) {
        let metadata = self.metadata.touch_and_clone();

        tracing::info!(
            success = matches!(result, OperationResult::Success(_)),
            "install completed",
        );
        self.send(InstallEvent::Completed { metadata, result }).await;
    }
}
