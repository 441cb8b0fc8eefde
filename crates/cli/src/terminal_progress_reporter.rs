//! Terminal output for install runs and config commands
//!
//! Every line starts with an emoji (or a bracketed fallback when the terminal can't show
//! one). Colors are applied only when enabled. Errors and warnings go to stderr; everything
//! else goes to stdout.

use std::fmt::Display;

use console::{Emoji, style};
use olaf::diagnostic::Diagnostic;

static ERROR_EMOJI: Emoji<'_, '_> = Emoji("❌ ", "[E] ");
static INFO_EMOJI: Emoji<'_, '_> = Emoji("ℹ️ ", "[I] ");
static PROGRESS_EMOJI: Emoji<'_, '_> = Emoji("• ", " • ");
static SUCCESS_EMOJI: Emoji<'_, '_> = Emoji("✅ ", "OK ");
static WARN_EMOJI: Emoji<'_, '_> = Emoji("⚠️ ", "[W] ");

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MessageType {
    Error,
    Info,
    Progress,
    Success,
    Warning,
}

impl MessageType {
    fn prefix(self) -> Emoji<'static, 'static> {
        match self {
            Self::Error => ERROR_EMOJI,
            Self::Info => INFO_EMOJI,
            Self::Progress => PROGRESS_EMOJI,
            Self::Success => SUCCESS_EMOJI,
            Self::Warning => WARN_EMOJI,
        }
    }

    fn paint(self, message: impl Display) -> String {
        match self {
            Self::Error => style(message).for_stderr().red().bold().to_string(),
            Self::Info => style(message).blue().to_string(),
            Self::Progress => style(message).dim().to_string(),
            Self::Success => style(message).green().to_string(),
            Self::Warning => style(message).for_stderr().yellow().bold().to_string(),
        }
    }
}

/// Formats and prints user-facing status lines
#[derive(Debug, Clone, Copy)]
pub struct TerminalProgressReporter {
    use_colors: bool,
}

impl TerminalProgressReporter {
    #[must_use]
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub(crate) fn use_colors(self) -> bool {
        self.use_colors
    }

    pub(crate) fn status_line(self, message_type: MessageType, message: impl Display) -> String {
        let body = if self.use_colors {
            message_type.paint(message)
        } else {
            message.to_string()
        };

        format!("{}{body}", message_type.prefix())
    }

    /// Indent `message` by `indent` spaces
    pub(crate) fn format(indent: usize, message: impl Display) -> String {
        format!("{:indent$}{}", "", message, indent = indent)
    }

    pub(crate) fn format_error(self, message: impl Display) -> String {
        self.status_line(MessageType::Error, message)
    }

    pub(crate) fn format_warning(self, message: impl Display) -> String {
        self.status_line(MessageType::Warning, message)
    }

    /// A diagnostic as a warning line, with the kind in front and the path behind
    pub(crate) fn format_diagnostic(self, diagnostic: &Diagnostic) -> String {
        let kind = if self.use_colors {
            style(diagnostic.kind()).yellow().to_string()
        } else {
            diagnostic.kind().to_string()
        };

        let line = match diagnostic.path() {
            Some(path) => format!("[{kind}] {} ({})", diagnostic.message(), path.display()),
            None => format!("[{kind}] {}", diagnostic.message()),
        };

        format!("{}{line}", WARN_EMOJI)
    }

    pub(crate) fn report(indent: usize, message: impl Display) {
        println!("{}", Self::format(indent, message));
    }

    pub(crate) fn report_progress(self, message: impl Display) {
        println!("{}", self.status_line(MessageType::Progress, message));
    }

    pub(crate) fn report_info(self, message: impl Display) {
        println!("{}", self.status_line(MessageType::Info, message));
    }

    pub(crate) fn report_success(self, message: impl Display) {
        println!("{}", self.status_line(MessageType::Success, message));
    }

    pub(crate) fn report_warning(self, message: impl Display) {
        eprintln!("{}", self.format_warning(message));
    }

    pub(crate) fn report_diagnostic(self, diagnostic: &Diagnostic) {
        eprintln!("{}", self.format_diagnostic(diagnostic));
    }

    pub(crate) fn report_error(self, message: impl Display) {
        eprintln!("{}", self.format_error(message));
    }
}
