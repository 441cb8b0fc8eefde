use olaf::config::AppConfig;
use tracing::info;

use crate::{tables::ValidationTableReporter, terminal_progress_reporter::TerminalProgressReporter};

/// Validate the configuration as loaded from file, before command line overrides
pub(crate) fn handle_validate(
    original_config: &AppConfig,
    reporter: TerminalProgressReporter,
) -> i32 {
    info!("Validating configuration");

    let result = original_config.validate();
    let issues = result.issues();

    if issues.has_errors() {
        reporter.report_error("Validation failed.");
        ValidationTableReporter::new()
            .add_errors(&issues.errors(), reporter)
            .add_warnings(&issues.warnings(), reporter)
            .print();
        1
    } else if issues.has_warnings() {
        ValidationTableReporter::new()
            .add_warnings(&issues.warnings(), reporter)
            .print();
        reporter.report_success("Configuration is valid, with warnings.");
        0
    } else {
        reporter.report_success("Configuration is valid.");
        0
    }
}
