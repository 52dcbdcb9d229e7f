//! Terminal rendering helpers

use colored::Colorize;
use polyglot_core::TranslateResult;

/// Render one slot's final state
pub fn slot_block(title: &str, outcome: Option<&TranslateResult>) -> String {
    let body = match outcome {
        Some(TranslateResult::Failure(reason)) => format!("{} {}", "Error:".red().bold(), reason),
        Some(result) => result.to_plain_text(),
        None => "(no result)".dimmed().to_string(),
    };
    format!("{}\n{}\n", title.cyan().bold(), body)
}

pub fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}
