//! Statement classification and batch splitting.
//!
//! Classification only looks at the first keyword of a statement: it decides
//! whether results are rendered as a table (read statements) and which
//! success message a write statement reports.

mod splitter;

pub use splitter::{contains_embedded_separator, split_batch, strip_comments, StatementSplitter};

use std::fmt;

/// Statement separator.
pub const SEPARATOR: char = ';';

/// Leading keywords of statements that return rows.
const READ_VERBS: &[&str] = &[
    "SELECT", "WITH", "SHOW", "EXPLAIN", "DESCRIBE", "DESC", "PRAGMA", "VALUES",
];

/// The kind of statement detected from its first keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Returns rows (SELECT and engine-specific read verbs).
    Read,
    Insert,
    Update,
    Delete,
    /// DDL and anything else that does not return rows.
    Other,
}

impl StatementKind {
    /// Classifies a statement by its first keyword.
    pub fn of(text: &str) -> Self {
        let Some(keyword) = first_keyword(text) else {
            return Self::Other;
        };

        match keyword.as_str() {
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            k if READ_VERBS.contains(&k) => Self::Read,
            _ => Self::Other,
        }
    }

    /// Returns true for INSERT, UPDATE and DELETE.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "READ"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// Returns the uppercased first keyword after leading whitespace.
pub fn first_keyword(text: &str) -> Option<String> {
    let keyword: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    (!keyword.is_empty()).then(|| keyword.to_ascii_uppercase())
}

/// True if the statement's first keyword is a read verb.
pub fn is_select_statement(text: &str) -> bool {
    StatementKind::of(text) == StatementKind::Read
}

/// True if the statement's first keyword is INSERT, UPDATE or DELETE.
pub fn is_mutating_statement(text: &str) -> bool {
    StatementKind::of(text).is_mutating()
}
