//! Turns the install event stream into terminal output and an exit code
//!
//! Commands can intercept individual events with a custom handler:
//!
//! ```rust,ignore
//! processor.process_events_with_handler(stream, |event, reporter| match event {
//!     InstallEvent::Progress { percent_complete, message, .. } => {
//!         reporter.report_progress(format!("[{:.0}%] {message}", percent_complete * 100.0));
//!         Some(true)
//!     }
//!     _ => None,
//! })
//! ```
//!
//! The handler returns `Some(true)` to continue after handling the event, `Some(false)` to
//! stop, or `None` to fall back to the default handling.

use futures::StreamExt;
use olaf::install::{
    InstallReport,
    event::{EventStream, InstallEvent, OperationResult},
};

use crate::{
    formatters::{format_count, format_key, format_list},
    terminal_progress_reporter::TerminalProgressReporter,
};

#[derive(Debug)]
pub struct EventProcessor {
    reporter: TerminalProgressReporter,
    error_reported: bool,
}

impl EventProcessor {
    pub fn new(reporter: TerminalProgressReporter) -> Self {
        Self {
            reporter,
            error_reported: false,
        }
    }

    pub async fn process_events(self, stream: EventStream) -> i32 {
        self.process_events_with_handler(stream, |_, _| None).await
    }

    pub async fn process_events_with_handler<F>(
        mut self,
        mut stream: EventStream,
        mut custom_handler: F,
    ) -> i32
    where
        F: FnMut(&InstallEvent, &TerminalProgressReporter) -> Option<bool>,
    {
        let mut exit_code = 0;

        while let Some(event) = stream.next().await {
            if let Some(should_continue) = custom_handler(&event, &self.reporter) {
                if !should_continue {
                    break;
                }
                continue;
            }

            self.handle_event(event, &mut exit_code);
        }

        exit_code
    }

    fn handle_event(&mut self, event: InstallEvent, exit_code: &mut i32) {
        match event {
            InstallEvent::Started { metadata } => {
                self.reporter.report_info(format!(
                    "Installing into {}",
                    metadata.target_directory().display()
                ));
            }

            InstallEvent::Progress { message, .. } => {
                self.reporter.report_progress(message);
            }

            InstallEvent::Trace { message, .. } => {
                tracing::trace!("{}", message);
            }

            InstallEvent::Debug { message, .. } => {
                tracing::debug!("{}", message);
            }

            InstallEvent::Info { message, .. } => {
                self.reporter.report_info(message);
            }

            InstallEvent::Warning { message, .. } => {
                self.reporter.report_warning(message);
            }

            InstallEvent::Diagnostic { diagnostic, .. } => {
                self.reporter.report_diagnostic(&diagnostic);
            }

            InstallEvent::Error { message, .. } => {
                self.reporter.report_error(message);
                self.error_reported = true;
                *exit_code = 1;
            }

            InstallEvent::Completed { result, .. } => match result {
                OperationResult::Success(report) => {
                    self.report_summary(&report);
                }
                OperationResult::Failure(error) => {
                    if !self.error_reported {
                        self.reporter.report_error(error);
                    }
                    *exit_code = 1;
                }
            },
        }
    }

    fn report_summary(&self, report: &InstallReport) {
        let colors = self.reporter.use_colors();
        let line = |key: &str, value: String| {
            TerminalProgressReporter::report(2, format!("{}: {value}", format_key(key, colors)));
        };

        self.reporter.report_success(format!(
            "Installed {} into {}",
            report.primary,
            report.target.display()
        ));
        line("Applied", format_list(&report.applied));
        if !report.skipped_secondaries.is_empty() {
            line("Skipped", format_list(&report.skipped_secondaries));
        }
        if !report.preserved.is_empty() {
            line("Preserved", format_list(&report.preserved));
        }
        line(
            "Pruned",
            format!(
                "{} from {}",
                format_count(report.pruned.len(), "unit"),
                format_count(report.prune_sources.len(), "prune list")
            ),
        );
        if !report.prune_skipped.is_empty() {
            line("Not pruned", format_list(&report.prune_skipped));
        }
        if !report.local.local_competencies.is_empty() {
            line("Local", format_list(&report.local.local_competencies));
        }
        for index in &report.indexes {
            line("Index", index.display().to_string());
        }
        if !report.diagnostics.is_empty() {
            line(
                "Diagnostics",
                format_count(report.diagnostics.len(), "finding"),
            );
        }
    }
}
