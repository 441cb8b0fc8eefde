use comfy_table::{
    ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL_CONDENSED,
};
use olaf::validation::ValidationIssue;

use crate::terminal_progress_reporter::TerminalProgressReporter;

pub(crate) const VALIDATION_HEADER: [&str; 4] = ["Category", "Field", "Message", "Suggestion"];

/// Config validation findings, one row per issue
pub(crate) struct ValidationTableReporter {
    table: Table,
}

impl ValidationTableReporter {
    pub(crate) fn new() -> Self {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(VALIDATION_HEADER);

        Self { table }
    }

    pub(crate) fn add_errors(
        &mut self,
        issues: &[&ValidationIssue],
        reporter: TerminalProgressReporter,
    ) -> &mut Self {
        for issue in issues {
            self.add_issue(reporter.format_error(issue.category()), issue);
        }
        self
    }

    pub(crate) fn add_warnings(
        &mut self,
        issues: &[&ValidationIssue],
        reporter: TerminalProgressReporter,
    ) -> &mut Self {
        for issue in issues {
            self.add_issue(reporter.format_warning(issue.category()), issue);
        }
        self
    }

    fn add_issue(&mut self, category: String, issue: &ValidationIssue) {
        self.table.add_row(vec![
            category,
            issue.field().to_string(),
            issue.message().to_string(),
            issue
                .suggestion()
                .map(ToString::to_string)
                .unwrap_or_default(),
        ]);
    }

    #[cfg(test)]
    pub(crate) fn row_count(&self) -> usize {
        self.table.row_iter().count()
    }

    pub(crate) fn print(&self) {
        eprintln!("{}", &self.table);
    }
}
