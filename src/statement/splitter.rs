//! Literal-aware batch splitting.
//!
//! The batch is tokenized with sqlparser under the engine's dialect so that a
//! `;` inside a quoted literal, a quoted identifier or a comment does not
//! split the statement. Statements are cut from the original text using
//! token locations, so their bytes are never re-rendered. Text the tokenizer
//! rejects (an unterminated quote, for example) falls back to a plain split
//! on every `;`.

use super::SEPARATOR;
use crate::db::Dialect;
use regex::Regex;
use sqlparser::dialect::{
    Dialect as SqlDialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::tokenizer::{Location, Token, Tokenizer, Whitespace};
use std::sync::LazyLock;
use tracing::debug;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment regex"));

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\n]*").expect("valid line comment regex"));

static HASH_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[^\n]*").expect("valid hash comment regex"));

/// Splits and inspects SQL batches for one dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementSplitter {
    dialect: Option<Dialect>,
}

impl StatementSplitter {
    /// Creates a splitter for an engine dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect: Some(dialect),
        }
    }

    /// Creates a splitter using sqlparser's generic dialect.
    pub fn generic() -> Self {
        Self::default()
    }

    /// Splits `text` into its statements, in order, without empty fragments.
    pub fn split(&self, text: &str) -> Vec<String> {
        let mut statements = Vec::new();
        let mut start = 0;

        for end in self
            .separator_offsets(text)
            .into_iter()
            .chain(std::iter::once(text.len()))
        {
            let fragment = text[start..end].trim();
            if !fragment.is_empty() {
                statements.push(fragment.to_string());
            }
            start = end + SEPARATOR.len_utf8();
        }

        statements
    }

    /// True if a separator appears before the last non-whitespace character,
    /// i.e. the text is a batch rather than one statement with a trailing `;`.
    pub fn contains_embedded_separator(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.separator_offsets(trimmed)
            .iter()
            .any(|offset| offset + SEPARATOR.len_utf8() < trimmed.len())
    }

    /// Removes `--` and `/* */` comments, plus `#` comments under MySQL,
    /// leaving literals untouched.
    pub fn strip_comments(&self, text: &str) -> String {
        self.strip_comments_tokenized(text).unwrap_or_else(|| {
            debug!("Tokenizer rejected input, stripping comments without literal awareness");
            let text = BLOCK_COMMENT.replace_all(text, " ");
            let text = LINE_COMMENT.replace_all(&text, "");
            if self.hash_comments() {
                HASH_COMMENT.replace_all(&text, "").into_owned()
            } else {
                text.into_owned()
            }
        })
    }

    fn strip_comments_tokenized(&self, text: &str) -> Option<String> {
        let tokens = self.tokens(text)?;
        let mut stripped = String::with_capacity(text.len());
        let mut in_hash_comment = false;

        for (i, (offset, token)) in tokens.iter().enumerate() {
            let end = tokens.get(i + 1).map_or(text.len(), |(next, _)| *next);
            let source = text.get(*offset..end)?;

            // sqlparser reads MySQL `#` as an operator, so the rest of the
            // line is dropped here.
            if in_hash_comment {
                match token {
                    Token::Whitespace(Whitespace::Newline)
                    | Token::Whitespace(Whitespace::SingleLineComment { .. }) => {
                        in_hash_comment = false;
                        stripped.push('\n');
                    }
                    _ => {}
                }
                continue;
            }

            match token {
                Token::Whitespace(Whitespace::SingleLineComment { .. }) => stripped.push('\n'),
                Token::Whitespace(Whitespace::MultiLineComment(_)) => stripped.push(' '),
                _ if self.hash_comments() && source.starts_with('#') => in_hash_comment = true,
                _ => stripped.push_str(source),
            }
        }

        Some(stripped)
    }

    fn hash_comments(&self) -> bool {
        self.dialect == Some(Dialect::MySql)
    }

    fn separator_offsets(&self, text: &str) -> Vec<usize> {
        let tokenized = self.tokens(text).and_then(|tokens| {
            let offsets: Vec<usize> = tokens
                .iter()
                .filter(|(_, token)| *token == Token::SemiColon)
                .map(|(offset, _)| *offset)
                .collect();

            offsets
                .iter()
                .all(|offset| text[*offset..].starts_with(SEPARATOR))
                .then_some(offsets)
        });

        tokenized.unwrap_or_else(|| {
            debug!("Tokenizer rejected input, splitting on every separator");
            text.match_indices(SEPARATOR).map(|(i, _)| i).collect()
        })
    }

    /// Tokens paired with their byte offset in `text`.
    fn tokens(&self, text: &str) -> Option<Vec<(usize, Token)>> {
        let dialect = self.sql_dialect();
        let tokens = Tokenizer::new(dialect.as_ref(), text)
            .tokenize_with_location()
            .ok()?;
        let line_starts = line_starts(text);

        tokens
            .into_iter()
            .map(|t| byte_offset(text, &line_starts, &t.location).map(|offset| (offset, t.token)))
            .collect()
    }

    fn sql_dialect(&self) -> Box<dyn SqlDialect> {
        match self.dialect {
            Some(Dialect::Postgres) => Box::new(PostgreSqlDialect {}),
            Some(Dialect::MySql) => Box::new(MySqlDialect {}),
            Some(Dialect::Sqlite) => Box::new(SQLiteDialect {}),
            None => Box::new(GenericDialect {}),
        }
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Converts a 1-based (line, column-in-chars) location to a byte offset.
fn byte_offset(text: &str, line_starts: &[usize], location: &Location) -> Option<usize> {
    let line = usize::try_from(location.line).ok()?.checked_sub(1)?;
    let column = usize::try_from(location.column).ok()?.checked_sub(1)?;
    let start = *line_starts.get(line)?;
    let rest = text.get(start..)?;

    Some(
        start
            + rest
                .char_indices()
                .nth(column)
                .map_or(rest.len(), |(i, _)| i),
    )
}

/// Splits with the generic dialect.
pub fn split_batch(text: &str) -> Vec<String> {
    StatementSplitter::generic().split(text)
}

/// Checks for an embedded separator with the generic dialect.
pub fn contains_embedded_separator(text: &str) -> bool {
    StatementSplitter::generic().contains_embedded_separator(text)
}

/// Strips comments with the generic dialect.
pub fn strip_comments(text: &str) -> String {
    StatementSplitter::generic().strip_comments(text)
}
