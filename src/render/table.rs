//! Bordered text table rendering.
//!
//! Column widths are rune counts: every header starts at the width of its
//! decorated name and grows to fit the widest cell pushed into it. Rows are
//! buffered until rendering because any row can widen a column.

use super::border::Glyphs;
use super::highlight::Highlight;
use super::normalize::{normalize, rune_len};
use crate::db::{QueryResult, Value};
use std::collections::BTreeMap;

/// Extra runes added to every measured header and cell.
pub const CELL_PADDING: usize = 1;

/// A column header and its running width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    width: usize,
}

impl Header {
    /// Creates a header from a raw column name, uppercased and decorated.
    pub fn new(name: &str) -> Self {
        let name = format!(" {}", name.to_uppercase());
        let width = rune_len(&name) + CELL_PADDING;
        Self { name, width }
    }

    /// The blank leading column that numbers the rows of a read.
    pub fn row_counter() -> Self {
        Self {
            name: "  ".to_string(),
            width: 4,
        }
    }

    /// Returns true for the row counter column, which has no name.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// The decorated display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current column width in runes.
    pub fn width(&self) -> usize {
        self.width
    }

    fn fit(&mut self, cell: &str) {
        self.width = self.width.max(rune_len(cell) + CELL_PADDING);
    }
}

/// Headers keyed by 1-based column index, plus the buffered rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: BTreeMap<usize, Header>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with one header per column name.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers = columns
            .into_iter()
            .enumerate()
            .map(|(i, name)| (i + 1, Header::new(name.as_ref())))
            .collect();

        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Builds a table from a relational result, normalizing every cell.
    pub fn from_result(result: &QueryResult) -> Self {
        let mut table = Self::new(result.columns.iter().map(|c| c.name.as_str()));
        for row in &result.rows {
            table.push_values(row);
        }
        table
    }

    /// Like [`Table::from_result`], with a leading ` #N` row counter column.
    pub fn numbered(result: &QueryResult) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(1, Header::row_counter());
        headers.extend(
            result
                .columns
                .iter()
                .enumerate()
                .map(|(i, column)| (i + 2, Header::new(&column.name))),
        );

        let mut table = Self {
            headers,
            rows: Vec::new(),
        };
        for (i, row) in result.rows.iter().enumerate() {
            let mut cells = Vec::with_capacity(row.len() + 1);
            cells.push(format!(" #{}", i + 1));
            cells.extend(row.iter().map(normalize));
            table.push_row(cells);
        }
        table
    }

    /// Appends a row of already-normalized cells.
    ///
    /// # Panics
    ///
    /// Panics if the row does not have exactly one cell per header.
    pub fn push_row(&mut self, row: Vec<String>) {
        assert_eq!(
            row.len(),
            self.headers.len(),
            "row has {} cells but the table has {} columns",
            row.len(),
            self.headers.len()
        );

        for (header, cell) in self.headers.values_mut().zip(&row) {
            header.fit(cell);
        }
        self.rows.push(row);
    }

    /// Normalizes and appends a row of driver values.
    pub fn push_values(&mut self, values: &[Value]) {
        self.push_row(values.iter().map(normalize).collect());
    }

    /// Headers in column order.
    pub fn headers(&self) -> impl Iterator<Item = &Header> {
        self.headers.values()
    }

    /// Buffered rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows have been pushed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table as `3 + 2 * row_count` lines.
    ///
    /// With no rows the third line closes the table instead of opening the
    /// body, so a header-only table is still well formed.
    pub fn render(&self, glyphs: &Glyphs) -> Vec<String> {
        let widths: Vec<usize> = self.headers.values().map(Header::width).collect();
        let mut lines = Vec::with_capacity(3 + 2 * self.rows.len());

        lines.push(band(
            &widths,
            glyphs.horizontal,
            glyphs.corner_top_left,
            glyphs.tee_top,
            glyphs.corner_top_right,
        ));
        lines.push(cells(
            self.headers.values().map(Header::name),
            &widths,
            glyphs.vertical,
        ));

        let bottom = band(
            &widths,
            glyphs.horizontal,
            glyphs.corner_bottom_left,
            glyphs.tee_bottom,
            glyphs.corner_bottom_right,
        );
        let divider = band(
            &widths,
            glyphs.horizontal,
            glyphs.tee_left,
            glyphs.cross,
            glyphs.tee_right,
        );

        if self.rows.is_empty() {
            lines.push(bottom);
            return lines;
        }

        lines.push(divider.clone());

        let last = self.rows.len() - 1;
        for (i, row) in self.rows.iter().enumerate() {
            lines.push(cells(row.iter().map(String::as_str), &widths, glyphs.vertical));
            lines.push(if i < last {
                divider.clone()
            } else {
                bottom.clone()
            });
        }

        lines
    }

    /// One header highlight per named column, linked to `style`.
    pub fn highlights(&self, style: &str) -> Vec<Highlight> {
        self.headers
            .iter()
            .filter(|(_, header)| !header.is_blank())
            .map(|(index, header)| Highlight::header(*index, header.name(), style))
            .collect()
    }
}

/// Right-pads `text` with spaces until it is `width` runes long. Never truncates.
pub fn pad(text: &str, width: usize) -> String {
    let len = rune_len(text);
    let mut padded = String::with_capacity(text.len() + width.saturating_sub(len));
    padded.push_str(text);
    padded.push_str(&" ".repeat(width.saturating_sub(len)));
    padded
}

fn band(widths: &[usize], horizontal: &str, left: &str, between: &str, right: &str) -> String {
    let segments: Vec<String> = widths.iter().map(|w| horizontal.repeat(*w)).collect();
    format!("{left}{}{right}", segments.join(between))
}

fn cells<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize], vertical: &str) -> String {
    let padded: Vec<String> = values.zip(widths).map(|(v, w)| pad(v, *w)).collect();
    format!("{vertical}{}{vertical}", padded.join(vertical))
}
