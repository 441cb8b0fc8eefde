//! Small text helpers shared by the command output

use console::style;
use std::fmt::Display;

/// Bold label, cyan when colors are enabled
pub(crate) fn format_key<T: Display>(text: T, use_colors: bool) -> String {
    let styled = style(text.to_string()).bold();

    if use_colors {
        styled.cyan().to_string()
    } else {
        styled.to_string()
    }
}

/// `1 skill`, `3 skills`
pub(crate) fn format_count(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Comma separated, or `none`
pub(crate) fn format_list<T: Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }

    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
