//! The read path of one table, from document to displayable rows.

use serde::Serialize;
use tracing::debug;

use crate::{
    config::Configuration,
    document::{Document, RawTableData},
    format::FormatterRegistry,
    project::{Pagination, Projection, RowQuery, project_rows},
    schema::{self, ResolvedColumn},
};

#[derive(Debug, Clone)]
pub struct TableView {
    pub table_index: usize,
    pub data: RawTableData,
    pub columns: Vec<ResolvedColumn>,
    pub query: RowQuery,
    pub projection: Projection,
    filters: Vec<(String, String)>,
}

/// Serializable page of a view.
#[derive(Debug, Serialize)]
pub struct ViewPage<'a> {
    pub columns: Vec<&'a str>,
    pub rows: Vec<Vec<&'a str>>,
    pub total: usize,
    pub page: Option<&'a Pagination>,
    pub page_count: usize,
}

impl TableView {
    /// `None` when the document has no `table_index`-th table.
    pub fn build(
        document: &Document,
        table_index: usize,
        configuration: &Configuration,
        query: RowQuery,
        registry: &FormatterRegistry,
    ) -> Option<Self> {
        let Some(table) = document.table(table_index) else {
            debug!(table_index, "no such table");
            return None;
        };
        let data = table.raw_data();
        let columns = schema::resolve_columns(&data.columns, configuration, registry);
        let projection = project_rows(&data, &columns, &query);
        let filters = configuration
            .filter_options()
            .into_iter()
            .map(|(label, filter)| (label.to_owned(), filter.to_owned()))
            .collect();
        Some(Self {
            table_index,
            data,
            columns,
            query,
            projection,
            filters,
        })
    }

    /// Same as [`TableView::build`], starting from the configuration's
    /// initial query.
    pub fn build_default(
        document: &Document,
        table_index: usize,
        configuration: &Configuration,
        registry: &FormatterRegistry,
    ) -> Option<Self> {
        let query = RowQuery::from_configuration(configuration);
        Self::build(document, table_index, configuration, query, registry)
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &ResolvedColumn> {
        schema::visible_columns(&self.columns)
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.query.pagination.as_ref()
    }

    /// One page when the table is not paginated.
    pub fn page_count(&self) -> usize {
        self.pagination()
            .map_or(1, |p| p.page_count(self.projection.total_unpaginated))
    }

    pub fn page_sizes(&self) -> &[usize] {
        match self.pagination() {
            Some(pagination) => &pagination.page_sizes,
            None => &[],
        }
    }

    /// Selectable filters as `(label, expression)` pairs.
    pub fn filter_options(&self) -> &[(String, String)] {
        &self.filters
    }

    /// Formatted cells of the visible columns, row by row.
    pub fn page(&self) -> ViewPage<'_> {
        let visible = self.visible_columns().collect::<Vec<_>>();
        ViewPage {
            columns: visible.iter().map(|column| column.name.as_str()).collect(),
            rows: self
                .projection
                .rows
                .iter()
                .map(|row| {
                    visible
                        .iter()
                        .map(|column| row.cells[column.index].formatted_value.as_str())
                        .collect()
                })
                .collect(),
            total: self.projection.total_unpaginated,
            page: self.pagination(),
            page_count: self.page_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::SortSpec;

    const DOC: &str = "\
Intro

| Name | Secret | Qty |
| ---- | ------ | --- |
| b | x | 2 |
| a | y |
| c | z | 3 | extra |
";

    fn configuration() -> Configuration {
        Configuration::from_yaml(
            "columns:\n  Secret:\n    hidden: true\n  Qty:\n    alias: qty\n    type: number\nfilter: $row.qty > 0\nfilters:\n  Everything: 'true'\npagination:\n  page-size: 1\n",
        )
        .unwrap()
    }

    #[test]
    fn test_build_default() {
        let document = Document::parse(DOC);
        let view =
            TableView::build_default(&document, 0, &configuration(), &FormatterRegistry::new())
                .unwrap();
        assert_eq!(view.data.rows[1], vec!["a", "y", ""]);
        assert_eq!(view.data.rows[2], vec!["c", "z", "3"]);
        assert_eq!(
            view.visible_columns().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Name", "Qty"]
        );
        assert_eq!(view.projection.total_unpaginated, 2);
        assert_eq!(view.page_count(), 2);
        assert_eq!(view.page_sizes(), &[1, 25, 50, 100]);
        assert_eq!(view.filter_options()[0].0, "DEFAULT");
        assert_eq!(view.filter_options()[1].1, "true");
        let page = view.page();
        assert_eq!(page.columns, vec!["Name", "Qty"]);
        assert_eq!(page.rows, vec![vec!["b", "2"]]);
    }

    #[test]
    fn test_build_with_query() {
        let document = Document::parse(DOC);
        let query = RowQuery {
            sort: Some(SortSpec::descending("qty")),
            ..Default::default()
        };
        let view = TableView::build(
            &document,
            0,
            &configuration(),
            query,
            &FormatterRegistry::new(),
        )
        .unwrap();
        assert_eq!(view.page_count(), 1);
        assert!(view.page_sizes().is_empty());
        let names = view.projection.rows.iter().map(|row| row.index).collect::<Vec<_>>();
        assert_eq!(names, vec![2, 0, 1]);
    }

    #[test]
    fn test_missing_table() {
        let document = Document::parse("no tables here");
        let configuration = Configuration::default();
        let view = TableView::build_default(&document, 0, &configuration, &FormatterRegistry::new());
        assert!(view.is_none());
    }
}
