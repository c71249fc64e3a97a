//! Document engine command language.
//!
//! Commands look like `[db.]<collection>.<function>(<args>)[.<modifier>(<args>)]*`,
//! for example `db.users.find({ age: { $gt: 30 } }).sort({ name: 1 }).limit(5)`.
//! Arguments are kept as raw text; [`shell_to_json`] turns one into JSON.

use crate::error::{Result, TabulaError};
use regex::Regex;
use std::sync::LazyLock;

/// Matches an unquoted object key following `{` or `,`.
static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)(\s*):").expect("valid bare key regex")
});

/// A function or modifier call with its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub arguments: Vec<String>,
}

/// A parsed document command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub collection: String,
    pub function: String,
    pub arguments: Vec<String>,
    pub modifiers: Vec<Call>,
}

impl ParsedCommand {
    /// The argument at `index`, if present.
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }
}

/// Parses a command string.
pub fn parse_command(input: &str) -> Result<ParsedCommand> {
    let text = input.trim().trim_end_matches(';').trim();
    let segments = split_top_level(text, '.')?;

    let Some(first_call) = segments.iter().position(|s| s.contains('(')) else {
        return Err(TabulaError::query(format!("Bad command format: {text}")));
    };

    let path = &segments[..first_call];
    let collection = match path {
        [] => return Err(TabulaError::query(format!("Missing collection in: {text}"))),
        [db, rest @ ..] if *db == "db" && !rest.is_empty() => rest.join("."),
        _ => path.join("."),
    };
    if collection.is_empty() || collection == "db" {
        return Err(TabulaError::query(format!("Missing collection in: {text}")));
    }

    let function = parse_call(segments[first_call])?;
    let modifiers = segments[first_call + 1..]
        .iter()
        .map(|segment| parse_call(segment))
        .collect::<Result<Vec<_>>>()?;

    Ok(ParsedCommand {
        collection,
        function: function.name,
        arguments: function.arguments,
        modifiers,
    })
}

/// Converts a shell-style argument to JSON text.
///
/// Single-quoted strings become double-quoted and bare object keys are
/// quoted. Text inside string literals is never touched.
pub fn shell_to_json(argument: &str) -> String {
    let mut json = String::with_capacity(argument.len() + 8);
    let mut plain = String::new();
    let mut chars = argument.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                json.push_str(&BARE_KEY.replace_all(&plain, "$1\"$2\"$3:"));
                plain.clear();
                json.push('"');

                let mut escaped = false;
                for inner in chars.by_ref() {
                    if escaped {
                        // JSON has no \' escape.
                        if inner != '\'' {
                            json.push('\\');
                        }
                        json.push(inner);
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == c {
                        break;
                    } else if inner == '"' {
                        json.push_str("\\\"");
                    } else {
                        json.push(inner);
                    }
                }
                json.push('"');
            }
            _ => plain.push(c),
        }
    }

    json.push_str(&BARE_KEY.replace_all(&plain, "$1\"$2\"$3:"));
    json
}

fn parse_call(segment: &str) -> Result<Call> {
    let segment = segment.trim();
    let (name, rest) = segment
        .split_once('(')
        .ok_or_else(|| TabulaError::query(format!("Expected a call, found: {segment}")))?;
    let inner = rest
        .strip_suffix(')')
        .ok_or_else(|| TabulaError::query(format!("Unbalanced parentheses in: {segment}")))?;

    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TabulaError::query(format!("Invalid function name in: {segment}")));
    }

    let arguments = split_top_level(inner, ',')?
        .into_iter()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Call {
        name: name.to_string(),
        arguments,
    })
}

/// Splits on `separator` outside brackets and string literals.
fn split_top_level(text: &str, separator: char) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TabulaError::query(format!("Unbalanced brackets in: {text}")))?;
            }
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    if depth != 0 || quote.is_some() {
        return Err(TabulaError::query(format!("Unbalanced brackets or quotes in: {text}")));
    }

    parts.push(&text[start..]);
    Ok(parts)
}
