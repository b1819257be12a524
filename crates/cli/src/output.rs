//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output. Status lines go to
//! stderr so that stdout carries only rendered descriptors.

use owo_colors::OwoColorize;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        eprintln!("{} {}", "ℹ".blue(), message);
    }

    /// Print an indented detail line under the previous status message
    pub fn detail(message: &str) {
        eprintln!("  {}", message.dimmed());
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count_singular() {
        assert_eq!(format_count(1, "layer", "layers"), "1 layer");
    }

    #[test]
    fn test_format_count_plural() {
        assert_eq!(format_count(3, "warning", "warnings"), "3 warnings");
    }

    #[test]
    fn test_format_count_zero_is_plural() {
        assert_eq!(format_count(0, "warning", "warnings"), "0 warnings");
    }
}
