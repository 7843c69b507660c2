use crate::{
    format::FormatterRegistry,
    project::{RowQuery, SortSpec},
    value::CellValue,
    view::TableView,
};

fn load_view(query: impl FnOnce(RowQuery) -> RowQuery) -> TableView {
    let document = super::load_document("src/tests/inventory/document.md");
    let configuration = super::load_configuration("src/tests/inventory/config.yaml");
    let query = query(RowQuery::from_configuration(&configuration));
    TableView::build(&document, 0, &configuration, query, &FormatterRegistry::new()).unwrap()
}

fn items(view: &TableView) -> Vec<String> {
    view.projection
        .rows
        .iter()
        .map(|row| row.cells[0].formatted_value.clone())
        .collect()
}

#[test]
fn configured_first_page() {
    let view = load_view(|query| query);
    assert_eq!(view.projection.total_unpaginated, 5);
    assert_eq!(view.page_count(), 3);
    assert_eq!(view.page_sizes(), &[2, 5]);
    assert_eq!(items(&view), vec!["apples", "beans"]);

    let page = view.page();
    assert_eq!(
        page.columns,
        vec!["Item", "Kind", "Qty", "Price", "Best before", "Opened"]
    );
    assert_eq!(
        page.rows[0],
        vec!["apples", "Fresh", "8", "0,40\u{a0}€", "2025/11/02", "sealed"]
    );
    assert_eq!(
        page.rows[1],
        vec!["beans", "Dry goods", "6", "0,89\u{a0}€", "", "sealed"]
    );
}

#[test]
fn last_page_and_page_size() {
    let view = load_view(|query| RowQuery {
        pagination: query.pagination.map(|p| p.with_page(3)),
        ..query
    });
    assert_eq!(items(&view), vec!["Olive oil"]);

    let view = load_view(|query| RowQuery {
        pagination: query.pagination.map(|p| p.with_page_size(5)),
        ..query
    });
    assert_eq!(view.page_count(), 1);
    assert_eq!(items(&view).len(), 5);
}

#[test]
fn filter_presets() {
    let presets = load_view(|query| query).filter_options().to_vec();
    let labels = presets.iter().map(|(label, _)| label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["DEFAULT", "Dry goods", "Opened"]);

    let (_, dry) = &presets[1];
    let view = load_view(|query| RowQuery {
        filter: Some(dry.clone()),
        pagination: None,
        ..query
    });
    assert_eq!(items(&view), vec!["beans", "Rice", "Flour"]);

    let (_, opened) = &presets[2];
    let view = load_view(|query| RowQuery {
        filter: Some(opened.clone()),
        sort: None,
        ..query
    });
    assert_eq!(items(&view), vec!["Olive oil", "Flour"]);
    assert_eq!(view.projection.rows[0].cells[5].value, CellValue::Bool(true));
}

#[test]
fn sort_by_text_and_date() {
    let view = load_view(|_| RowQuery {
        sort: Some(SortSpec::ascending("item")),
        filter: None,
        pagination: None,
    });
    assert_eq!(
        items(&view),
        vec!["apples", "beans", "Flour", "Olive oil", "Rice", "Vinegar"]
    );

    for spec in ["best", "-best"] {
        let view = load_view(|_| RowQuery {
            sort: spec.parse().ok(),
            filter: None,
            pagination: None,
        });
        let items = items(&view);
        assert_eq!(items.last().map(String::as_str), Some("beans"), "{spec}");
        if spec == "best" {
            assert_eq!(items[0], "apples");
        } else {
            assert_eq!(items[0], "Vinegar");
        }
    }
}

#[test]
fn hidden_column_is_still_projected() {
    let view = load_view(|_| RowQuery {
        filter: Some("$row.Notes != ''".to_owned()),
        sort: None,
        pagination: None,
    });
    assert_eq!(items(&view), vec!["Rice", "beans", "apples"]);
    assert_eq!(view.projection.rows[2].cells[6].raw_value, " crate on the balcony ");
}

#[test]
fn unconfigured_table() {
    let document = super::load_document("src/tests/inventory/document.md");
    let view = TableView::build_default(
        &document,
        1,
        &crate::config::Configuration::default(),
        &FormatterRegistry::new(),
    )
    .unwrap();
    assert_eq!(view.page_count(), 1);
    assert_eq!(view.page().rows, vec![vec!["milk", "2"]]);
    assert_eq!(
        view.projection.rows[0].cells[1].value,
        CellValue::String("2".to_owned())
    );
}
