//! Centralized UI formatting and color utilities
//!
//! This module provides a unified interface for severity colors, icons, and
//! formatting patterns used throughout the stackcheck CLI.

use colored::{ColoredString, Colorize};

use crate::rules::Severity;

/// Check if quiet mode is enabled via environment variable or --quiet flag
pub fn is_quiet() -> bool {
    std::env::var("STACKCHECK_QUIET")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Returns a colored icon for the given finding severity.
///
/// Icons:
/// - Hard: ✗ (red)
/// - Soft: ⚠ (yellow)
pub fn severity_icon(severity: Severity) -> ColoredString {
    match severity {
        Severity::Hard => "✗".red(),
        Severity::Soft => "⚠".yellow(),
    }
}

/// Green check mark for findings-free sections and passing services.
pub fn ok_icon() -> ColoredString {
    "✓".green()
}

/// Color scheme for report text output
pub mod colors {
    use colored::{ColoredString, Colorize};

    /// Green for success/clean results
    pub fn success(text: &str) -> ColoredString {
        text.green()
    }

    /// Yellow for soft findings
    pub fn warning(text: &str) -> ColoredString {
        text.yellow()
    }

    /// Red for hard findings and fatal errors
    pub fn error(text: &str) -> ColoredString {
        text.red()
    }

    /// Cyan for identifiers (service names, variable names)
    pub fn identifier(text: &str) -> ColoredString {
        text.cyan()
    }

    /// Dimmed for secondary text (paths, raw lines)
    pub fn secondary(text: &str) -> ColoredString {
        text.dimmed()
    }

    /// Bold for section headings
    pub fn heading(text: &str) -> ColoredString {
        text.bold()
    }
}

/// Common text formatting patterns
pub mod format {
    /// Format a separator line for report sections
    pub fn separator(width: usize) -> String {
        "─".repeat(width)
    }

    /// Pluralize a count-qualified noun
    pub fn count(n: usize, singular: &str, plural: &str) -> String {
        if n == 1 {
            format!("{} {}", n, singular)
        } else {
            format!("{} {}", n, plural)
        }
    }
}
