//! Highlight directives for the editor integration.
//!
//! Each directive pairs a piece of rendered text with a named highlight
//! group. They are printed on stdout, never written into the result file.

use std::fmt;

/// Marker prefixed to batch report lines of failed statements.
pub const ERROR_MARKER: &str = "✘";

/// Highlight style linked to [`ERROR_MARKER`].
pub const ERROR_STYLE: &str = "ErrorMsg";

const ERROR_GROUP: &str = "tabulaStmtErr";

/// One `syn match` / `hi link` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    group: String,
    pattern: String,
    style: String,
    whole_word: bool,
}

impl Highlight {
    /// Highlights a column header (matched as a whole word).
    pub fn header(index: usize, text: &str, style: &str) -> Self {
        Self {
            group: format!("header{index}"),
            pattern: text.trim().to_string(),
            style: style.to_string(),
            whole_word: true,
        }
    }

    /// Highlights the failed-statement marker in batch reports.
    pub fn error_marker() -> Self {
        Self {
            group: ERROR_GROUP.to_string(),
            pattern: ERROR_MARKER.to_string(),
            style: ERROR_STYLE.to_string(),
            whole_word: false,
        }
    }

    /// The text this directive matches.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The highlight style the match is linked to.
    pub fn style(&self) -> &str {
        &self.style
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Single-quoted vim strings escape a quote by doubling it.
        let pattern = self.pattern.replace('\\', "\\\\").replace('\'', "''");
        if self.whole_word {
            write!(
                f,
                "syn match {group} '\\<{pattern}\\>' | hi link {group} {style} |",
                group = self.group,
                style = self.style
            )
        } else {
            write!(
                f,
                "syn match {group} '{pattern}' | hi link {group} {style} |",
                group = self.group,
                style = self.style
            )
        }
    }
}

/// Joins directives into the single line the editor expects.
pub fn directive_line(highlights: &[Highlight]) -> String {
    highlights
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
