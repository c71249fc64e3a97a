//! Cell value normalization.
//!
//! Turns a driver-native [`Value`] into the padded display string stored in
//! a table row.

use crate::db::Value;

/// Zero-offset suffix some drivers print twice on timestamps.
const DUPLICATED_ZERO_OFFSET: &str = " +0000 +0000";

/// Literal shown for SQL NULL and missing document fields.
pub const NULL_DISPLAY: &str = "NULL";

/// Converts one cell value into its display string.
///
/// Byte buffers are decoded as (lossy) UTF-8, everything else uses its
/// textual representation. The duplicated zero-offset artifact is removed,
/// nulls become `NULL` and the result gets one leading space of padding.
pub fn normalize(value: &Value) -> String {
    let text = match value {
        Value::Null => return format!(" {NULL_DISPLAY}"),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        other => other.to_string(),
    };

    format!(" {}", text.replace(DUPLICATED_ZERO_OFFSET, ""))
}

/// Number of runes (not bytes) in `text`.
pub fn rune_len(text: &str) -> usize {
    text.chars().count()
}
