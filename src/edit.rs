//! Cell editing
//!
//! An edit goes from an [`EditInput`] produced by the column's editor, to
//! cell text in the column's storage format, to a rewritten table line.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::{
    document::lines::{modify_line, read_line},
    schema::{ColumnKind, ResolvedColumn},
    value::DatePattern,
};

/// Patterns of the text date pickers read and write.
const PICKER_DATE_FORMAT: &str = "YYYY-MM-DD";
const PICKER_DATETIME_FORMAT: &str = "YYYY-MM-DDTHH:mm";
const PICKER_TIME_FORMAT: &str = "HH:mm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EditorKind {
    Text,
    Number,
    Date,
    DateTime,
    Time,
    /// Choice among the keys of an enum map, shown with their labels.
    Select { options: IndexMap<String, String> },
    Checkbox,
}

impl ResolvedColumn {
    /// Unconfigured enums are edited as text.
    pub fn editor(&self) -> EditorKind {
        match &self.kind {
            ColumnKind::String => EditorKind::Text,
            ColumnKind::Number => EditorKind::Number,
            ColumnKind::Bool => EditorKind::Checkbox,
            ColumnKind::Date => EditorKind::Date,
            ColumnKind::DateTime => EditorKind::DateTime,
            ColumnKind::Time => EditorKind::Time,
            ColumnKind::Enum(options) => EditorKind::Select {
                options: options.clone(),
            },
        }
    }
}

/// A value as produced by an editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditInput {
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Checked(bool),
    Selected(String),
}

impl EditInput {
    /// Read text typed for an editor; date pickers use ISO-like text.
    pub fn from_text(editor: &EditorKind, text: &str) -> Option<Self> {
        let text = text.trim();
        match editor {
            EditorKind::Text | EditorKind::Number => Some(Self::Text(text.to_owned())),
            EditorKind::Date => DatePattern::new(PICKER_DATE_FORMAT)
                .parse_date(text)
                .map(Self::Date),
            EditorKind::DateTime => DatePattern::new(PICKER_DATETIME_FORMAT)
                .parse_datetime(text)
                .map(Self::DateTime),
            EditorKind::Time => DatePattern::new(PICKER_TIME_FORMAT)
                .parse_time(text)
                .map(Self::Time),
            EditorKind::Checkbox => match text.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(Self::Checked(true)),
                "false" | "no" | "off" | "0" => Some(Self::Checked(false)),
                _ => None,
            },
            EditorKind::Select { .. } => Some(Self::Selected(text.to_owned())),
        }
    }
}

/// Keep the digits, the first decimal point and a leading minus sign.
fn sanitize_number(text: &str) -> String {
    let text = text.trim();
    let mut out = String::with_capacity(text.len());
    if text.starts_with('-') {
        out.push('-');
    }
    let mut seen_point = false;
    for c in text.chars() {
        match c {
            '0'..='9' => out.push(c),
            '.' if !seen_point => {
                seen_point = true;
                out.push(c);
            }
            _ => {}
        }
    }
    out
}

/// Cell text for an edited value, or `None` when the column does not
/// accept it.
pub fn encode_edit(column: &ResolvedColumn, input: &EditInput) -> Option<String> {
    if !column.editable {
        debug!(column = %column.name, "column is not editable");
        return None;
    }
    let encoded = match (column.editor(), input) {
        (EditorKind::Number, EditInput::Text(text)) => Some(sanitize_number(text)),
        (EditorKind::Text, EditInput::Text(text)) => {
            let text = text.trim().replace(['\r', '\n'], " ");
            (!text.contains('|')).then_some(text)
        }
        (EditorKind::Date, EditInput::Date(date)) => column.storage_format.format_date(date),
        (EditorKind::DateTime, EditInput::DateTime(datetime)) => {
            column.storage_format.format_datetime(datetime)
        }
        (EditorKind::Time, EditInput::Time(time)) => column.storage_format.format_time(time),
        (EditorKind::Checkbox, EditInput::Checked(checked)) => Some(if *checked {
            column.yes_input.clone()
        } else {
            column.no_input.clone()
        }),
        (EditorKind::Select { options }, EditInput::Selected(key)) => {
            options.contains_key(key).then(|| key.clone())
        }
        _ => None,
    };
    if encoded.is_none() {
        debug!(column = %column.name, ?input, "edit rejected");
    }
    encoded
}

/// Replace one cell of logical row `row` and write the row back.
///
/// Short rows are padded up to `column`. A missing table or row leaves the
/// document unchanged.
pub fn set_cell(document: &str, table: usize, row: usize, column: usize, raw: &str) -> String {
    let Ok(line) = i64::try_from(row) else {
        return document.to_owned();
    };
    let Some(mut cells) = read_line(document, line, table) else {
        debug!(table, row, "row not found, document left unchanged");
        return document.to_owned();
    };
    if cells.len() <= column {
        cells.resize(column + 1, String::new());
    }
    cells[column] = raw.to_owned();
    modify_line(document, line, &cells, table)
}

/// Encode an edit and apply it; `None` when the edit is rejected.
pub fn edit_cell(
    document: &str,
    table: usize,
    row: usize,
    column: &ResolvedColumn,
    input: &EditInput,
) -> Option<String> {
    let raw = encode_edit(column, input)?;
    Some(set_cell(document, table, row, column.index, &raw))
}
