use chrono::{NaiveDate, NaiveTime};

use crate::{
    Error,
    document::{Document, load_configuration},
    edit::{self, EditInput, EditorKind},
    format::FormatterRegistry,
    schema::lookup_column,
    value::CellValue,
    view::TableView,
};

const PATH: &str = "src/tests/journal/document.md";

fn journal() -> (String, TableView) {
    let src = std::fs::read_to_string(PATH).unwrap();
    let document = Document::parse(&src);
    let configuration = load_configuration(&document, 0).unwrap().unwrap();
    let view =
        TableView::build_default(&document, 0, &configuration, &FormatterRegistry::new()).unwrap();
    (src, view)
}

#[test]
fn embedded_configuration() {
    let (_, view) = journal();
    let page = view.page();
    assert_eq!(page.columns, vec!["Day", "Start", "Distance", "Effort", "Pace"]);
    assert_eq!(
        page.rows,
        vec![
            vec!["2 Mar 2025", "07:15", "10.0", "easy", "5:40 min/km"],
            vec!["4 Mar 2025", "18:30", "6.4", "hard", "4:50 min/km"],
            vec!["5 Mar 2025", "06:05", "0.0", "rest", "-"],
        ]
    );
    let first = &view.projection.rows[0];
    assert_eq!(
        first.get("day"),
        Some(&CellValue::Date(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()))
    );
    assert_eq!(
        first.get("start"),
        Some(&CellValue::Time(NaiveTime::from_hms_opt(7, 15, 0).unwrap()))
    );
    assert_eq!(first.get("effort"), Some(&CellValue::String("easy".to_owned())));
}

#[test]
fn invalid_configuration_block() {
    let document = super::load_document(PATH);
    assert_eq!(document.table_count(), 2);
    let error = load_configuration(&document, 1).unwrap().unwrap_err();
    assert!(matches!(error, Error::Validation(_)));
    assert_eq!(error.to_string(), "/columns must be object");
}

#[test]
fn editors() {
    let (_, view) = journal();
    let kinds = view.columns.iter().map(|c| c.editor()).collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            EditorKind::Date,
            EditorKind::Time,
            EditorKind::Number,
            EditorKind::Text,
            EditorKind::Text,
        ]
    );
}

#[test]
fn edit_cells_in_storage_format() {
    let (src, view) = journal();
    let day = lookup_column(&view.columns, "day").unwrap();
    let input = EditInput::from_text(&day.editor(), "2025-03-03").unwrap();
    let edited = edit::edit_cell(&src, 0, 0, day, &input).unwrap();
    assert!(edited.contains("\n|2025-03-03|07:15|10|easy|5:40|\n"));
    assert_eq!(edited.len(), src.len());

    let distance = lookup_column(&view.columns, "Distance").unwrap();
    let input = EditInput::Text("12,5 km".to_owned());
    let edited = edit::edit_cell(&edited, 0, 2, distance, &input).unwrap();
    assert!(edited.contains("\n|2025-03-05|06:05|125|rest||\n"));

    let reparsed = Document::parse(&edited);
    let configuration = load_configuration(&reparsed, 0).unwrap().unwrap();
    let view =
        TableView::build_default(&reparsed, 0, &configuration, &FormatterRegistry::new()).unwrap();
    assert_eq!(view.page().rows[0][0], "3 Mar 2025");
    assert_eq!(view.page().rows[2][2], "125.0");
}

#[test]
fn rejected_edit_leaves_document() {
    let (src, view) = journal();
    let pace = lookup_column(&view.columns, "pace").unwrap();
    assert_eq!(
        edit::edit_cell(&src, 0, 1, pace, &EditInput::Text("a | b".to_owned())),
        None
    );
    assert_eq!(edit::set_cell(&src, 0, 9, 0, "x"), src);
}
