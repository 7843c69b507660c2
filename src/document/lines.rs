//! Row level edits of a table inside a document
//!
//! Every operation parses the document, edits the line list of one table
//! block and serializes the whole document again. A missing table or an
//! out-of-range row is not an error: writes return the document unchanged
//! and reads return `None`.

use itertools::Itertools;
use tracing::debug;

use super::{Document, split_cells};

/// Line addressed by a logical line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTarget {
    /// The header line (logical `-2`).
    Header,
    /// Logical row `r`, physical line `r + 2`.
    Row(usize),
    /// The last row (logical `-1`).
    Last,
}

impl LineTarget {
    pub fn from_logical(line: i64) -> Option<Self> {
        match line {
            -2 => Some(Self::Header),
            -1 => Some(Self::Last),
            n => usize::try_from(n).ok().map(Self::Row),
        }
    }

    /// Physical offset of an existing line in a block of `len` lines.
    fn existing(self, len: usize) -> Option<usize> {
        match self {
            Self::Header => (len > 0).then_some(0),
            Self::Row(row) => row.checked_add(2).filter(|offset| *offset < len),
            Self::Last => (len > 2).then(|| len - 1),
        }
    }

    /// Physical offset a new row is inserted at. Inserting at the header
    /// puts the row above it, at the top of the block.
    fn insertion(self, len: usize) -> Option<usize> {
        match self {
            Self::Header => Some(0),
            Self::Row(row) => Some(row.saturating_add(2).min(len)),
            Self::Last => Some(len),
        }
    }
}

/// Cell layout of serialized rows, taken from the table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowStyle {
    /// `|a|b|`
    Compact,
    /// `| a | b |`
    Padded,
}

impl RowStyle {
    fn detect(header: &str) -> Self {
        if header.starts_with("| ") {
            Self::Padded
        } else {
            Self::Compact
        }
    }
}

fn values_to_line<S: AsRef<str>>(values: &[S], style: RowStyle, crlf: bool) -> String {
    let cells = values.iter().map(|value| value.as_ref().trim());
    let mut line = match style {
        RowStyle::Compact => format!("|{}|", cells.format("|")),
        RowStyle::Padded => format!("| {} |", cells.format(" | ")),
    };
    if crlf {
        line.push('\r');
    }
    line
}

fn row_line_for<S: AsRef<str>>(lines: &[String], values: &[S]) -> String {
    let header = lines.first().map(String::as_str).unwrap_or_default();
    values_to_line(values, RowStyle::detect(header), header.ends_with('\r'))
}

impl Document {
    pub fn insert_line<S: AsRef<str>>(&mut self, table: usize, line: i64, values: &[S]) -> bool {
        let Some(lines) = self.table_lines_mut(table) else {
            return false;
        };
        let Some(offset) = LineTarget::from_logical(line).and_then(|t| t.insertion(lines.len()))
        else {
            return false;
        };
        let row = row_line_for(lines, values);
        lines.insert(offset, row);
        true
    }

    pub fn modify_line<S: AsRef<str>>(&mut self, table: usize, line: i64, values: &[S]) -> bool {
        let Some(lines) = self.table_lines_mut(table) else {
            return false;
        };
        let Some(offset) = LineTarget::from_logical(line).and_then(|t| t.existing(lines.len()))
        else {
            return false;
        };
        let row = row_line_for(lines, values);
        lines[offset] = row;
        true
    }

    pub fn remove_line(&mut self, table: usize, line: i64) -> bool {
        let Some(lines) = self.table_lines_mut(table) else {
            return false;
        };
        let target = LineTarget::from_logical(line).filter(|t| *t != LineTarget::Header);
        let Some(offset) = target.and_then(|t| t.existing(lines.len())) else {
            return false;
        };
        lines.remove(offset);
        true
    }

    pub fn read_line(&self, table: usize, line: i64) -> Option<Vec<String>> {
        let lines = self.table(table)?.lines();
        let offset = LineTarget::from_logical(line)?.existing(lines.len())?;
        Some(split_cells(&lines[offset]))
    }

    pub fn read_table_lines(&self, table: usize) -> Option<Vec<Vec<String>>> {
        let lines = self.table(table)?.lines();
        Some(lines.iter().map(|line| split_cells(line)).collect())
    }
}

fn edit(
    document: &str,
    op: &str,
    line: i64,
    table: usize,
    f: impl FnOnce(&mut Document) -> bool,
) -> String {
    let mut parsed = Document::parse(document);
    if f(&mut parsed) {
        parsed.to_string()
    } else {
        debug!(op, line, table, "table line not found, document left unchanged");
        document.to_owned()
    }
}

/// Insert a row before logical row `line` (`-1` appends, `-2` goes above
/// the header).
pub fn insert_line<S: AsRef<str>>(
    document: &str,
    line: i64,
    values: &[S],
    table: usize,
) -> String {
    edit(document, "insert", line, table, |doc| {
        doc.insert_line(table, line, values)
    })
}

/// Replace logical row `line` (`-1` is the last row, `-2` the header).
pub fn modify_line<S: AsRef<str>>(
    document: &str,
    line: i64,
    values: &[S],
    table: usize,
) -> String {
    edit(document, "modify", line, table, |doc| {
        doc.modify_line(table, line, values)
    })
}

pub fn modify_header<S: AsRef<str>>(document: &str, values: &[S], table: usize) -> String {
    modify_line(document, -2, values, table)
}

/// Remove logical row `line` (`-1` is the last row).
pub fn remove_line(document: &str, line: i64, table: usize) -> String {
    edit(document, "remove", line, table, |doc| doc.remove_line(table, line))
}

/// Cells of logical row `line`, untrimmed.
pub fn read_line(document: &str, line: i64, table: usize) -> Option<Vec<String>> {
    Document::parse(document).read_line(table, line)
}

/// Cells of every line of the table, header and separator included.
pub fn read_table_lines(document: &str, table: usize) -> Option<Vec<Vec<String>>> {
    Document::parse(document).read_table_lines(table)
}
