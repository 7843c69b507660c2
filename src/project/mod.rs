//! Row projection
//!
//! Turns the raw cells of a table into typed and formatted rows, then
//! filters, sorts and paginates them. Nothing is cached: every call runs
//! the whole pipeline over its inputs.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::{
    config::Configuration,
    document::RawTableData,
    expr::{self, Scope},
    format::FormatContext,
    schema::ResolvedColumn,
    value::{CellValue, RowValues},
};

mod pagination;
mod sort;

pub use pagination::Pagination;
pub use sort::{EmptySortField, SortSpec};

/// One row and column intersection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataCell {
    /// Cell text as found in the document.
    pub raw_value: String,
    pub value: CellValue,
    pub formatted_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRow {
    /// Logical row index in the table; stays the same through sorting.
    pub index: usize,
    /// Cells in column order.
    pub cells: Vec<DataCell>,
    /// Values keyed by column alias.
    #[serde(skip)]
    pub values: RowValues,
}

impl DataRow {
    pub fn get(&self, alias: &str) -> Option<&CellValue> {
        self.values.get(alias)
    }
}

/// Sort, filter and page selection applied to the rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    pub sort: Option<SortSpec>,
    pub filter: Option<String>,
    pub pagination: Option<Pagination>,
}

impl RowQuery {
    /// The initial query of a table: its configured sort, default filter and
    /// first page.
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            sort: configuration
                .sort
                .as_deref()
                .and_then(|sort| sort.parse().ok()),
            filter: configuration.filter.clone(),
            pagination: Pagination::from_config(configuration.pagination.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub rows: Vec<DataRow>,
    /// Rows left after filtering, before pagination.
    pub total_unpaginated: usize,
}

fn materialize(data: &RawTableData, columns: &[ResolvedColumn]) -> Vec<DataRow> {
    data.rows
        .iter()
        .enumerate()
        .map(|(index, cells)| {
            let source = data.source_rows.get(index);
            let raw = columns
                .iter()
                .map(|column| {
                    source
                        .and_then(|source| source.get(column.index))
                        .or_else(|| cells.get(column.index))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>();
            let decoded = columns
                .iter()
                .map(|column| {
                    column.decode(cells.get(column.index).map_or("", String::as_str))
                })
                .collect::<Vec<_>>();
            let values = columns
                .iter()
                .zip(&decoded)
                .map(|(column, value)| (column.alias.clone(), value.clone()))
                .collect::<RowValues>();
            let cells = columns
                .iter()
                .zip(raw)
                .zip(decoded)
                .map(|((column, raw_value), value)| {
                    let context = FormatContext {
                        column,
                        row_index: index,
                        row: &values,
                        data,
                    };
                    DataCell {
                        formatted_value: column.format(&value, &context),
                        raw_value,
                        value,
                    }
                })
                .collect();
            DataRow {
                index,
                cells,
                values,
            }
        })
        .collect()
}

fn filter_rows(rows: &mut Vec<DataRow>, data: &RawTableData, filter: &str) {
    if filter.trim().is_empty() {
        return;
    }
    let expr = match expr::parse(filter) {
        Ok(expr) => expr,
        Err(e) => {
            warn!(%e, filter, "filter does not parse, no row matches");
            rows.clear();
            return;
        }
    };
    rows.retain(|row| match expr.test(&Scope::new(&row.values, data)) {
        Ok(keep) => keep,
        Err(e) => {
            trace!(%e, row = row.index, "filter failed on row");
            false
        }
    });
}

/// Decode, format, filter, sort and paginate the rows of a table.
///
/// An unknown sort alias leaves the order untouched. A filter that fails
/// on a row excludes that row.
pub fn project_rows(
    data: &RawTableData,
    columns: &[ResolvedColumn],
    query: &RowQuery,
) -> Projection {
    let mut rows = materialize(data, columns);

    if let Some(filter) = query.filter.as_deref() {
        filter_rows(&mut rows, data, filter);
    }
    if let Some(spec) = &query.sort {
        sort::sort_rows(&mut rows, columns, spec);
    }

    let total_unpaginated = rows.len();
    if let Some(pagination) = &query.pagination {
        let range = pagination.range(total_unpaginated);
        debug!(?range, total_unpaginated, "paginating rows");
        rows.truncate(range.end);
        rows.drain(..range.start);
    }

    Projection {
        rows,
        total_unpaginated,
    }
}
