use std::{cmp::Ordering, fmt, str::FromStr};

use tracing::debug;

use crate::{
    schema::{ColumnKind, ResolvedColumn, find_column},
    value::CellValue,
};

use super::DataRow;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("sort field is empty")]
pub struct EmptySortField;

/// A column alias, descending when written with a leading `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub alias: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn ascending(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            descending: false,
        }
    }

    pub fn descending(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            descending: true,
        }
    }

    /// The same column in the other direction.
    pub fn reversed(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            descending: !self.descending,
        }
    }
}

impl FromStr for SortSpec {
    type Err = EmptySortField;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (alias, descending) = match s.strip_prefix('-') {
            Some(alias) => (alias, true),
            None => (s, false),
        };
        if alias.is_empty() {
            return Err(EmptySortField);
        }
        Ok(Self {
            alias: alias.to_owned(),
            descending,
        })
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            f.write_str("-")?;
        }
        f.write_str(&self.alias)
    }
}

fn numeric_key(value: &CellValue) -> f64 {
    value.as_number().unwrap_or(0.0)
}

/// Base letter of an accented lowercase Latin letter.
///
/// Covers Latin-1 and the common Latin Extended-A letters; anything else,
/// ligatures included, is kept as is and orders by code point.
fn base_letter(c: char) -> char {
    match c {
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò'..='ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// Case and accent insensitive order. Ties fall back to the accented
/// spelling after the plain one, then lowercase before uppercase.
fn text_cmp(a: &str, b: &str) -> Ordering {
    let (lower_a, lower_b) = (a.to_lowercase(), b.to_lowercase());
    lower_a
        .chars()
        .map(base_letter)
        .cmp(lower_b.chars().map(base_letter))
        .then_with(|| lower_a.cmp(&lower_b))
        .then_with(|| b.cmp(a))
}

fn compare(kind: &ColumnKind, a: &CellValue, b: &CellValue, descending: bool) -> Ordering {
    let directed = |ordering: Ordering| {
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    };
    match kind {
        ColumnKind::Number | ColumnKind::Bool => directed(
            numeric_key(a)
                .partial_cmp(&numeric_key(b))
                .unwrap_or(Ordering::Equal),
        ),
        // missing dates go last in both directions
        ColumnKind::Date | ColumnKind::DateTime | ColumnKind::Time => {
            match (a.is_null(), b.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => directed(a.chrono_cmp(b).unwrap_or(Ordering::Equal)),
            }
        }
        ColumnKind::String | ColumnKind::Enum(_) => {
            directed(text_cmp(&a.to_string(), &b.to_string()))
        }
    }
}

/// Stable sort of `rows` by the column named in `spec`.
///
/// Returns `false`, leaving the rows untouched, when no column has the alias.
pub(crate) fn sort_rows(rows: &mut [DataRow], columns: &[ResolvedColumn], spec: &SortSpec) -> bool {
    let Some(column) = find_column(columns, &spec.alias) else {
        debug!(sort = %spec, "no column with this alias, rows left unsorted");
        return false;
    };
    rows.sort_by(|a, b| {
        let a = &a.cells[column.index].value;
        let b = &b.cells[column.index].value;
        compare(&column.kind, a, b, spec.descending)
    });
    true
}
