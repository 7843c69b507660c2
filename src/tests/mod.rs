use crate::{
    config::Configuration,
    document::{self, Document, lines},
    format::FormatterRegistry,
    project::{Pagination, RowQuery, SortSpec, project_rows},
    schema::resolve_columns,
    value::CellValue,
};

mod inventory;
mod journal;

fn load_document(path: &str) -> Document {
    let src = std::fs::read_to_string(path).unwrap();
    Document::parse(&src)
}

fn load_configuration(path: &str) -> Configuration {
    let src = std::fs::read_to_string(path).unwrap();
    Configuration::from_yaml(&src).unwrap()
}

const SCENARIO: &str = "| a | b |\n| - | - |\n| 1 | x |\n| 2 | y |";

#[test]
fn decode_and_sort_numbers() {
    let document = Document::parse(SCENARIO);
    let data = document.table(0).unwrap().raw_data();
    let configuration = Configuration::from_yaml("columns:\n  a:\n    type: number\n").unwrap();
    let columns = resolve_columns(&data.columns, &configuration, &FormatterRegistry::new());
    assert_eq!(columns[0].decode("1"), CellValue::Number(1.0));
    assert_eq!(columns[0].decode("2"), CellValue::Number(2.0));
    let query = RowQuery {
        sort: Some("-a".parse::<SortSpec>().unwrap()),
        ..Default::default()
    };
    let projection = project_rows(&data, &columns, &query);
    let order = projection
        .rows
        .iter()
        .map(|row| row.get("a").cloned())
        .collect::<Vec<_>>();
    assert_eq!(
        order,
        vec![Some(CellValue::Number(2.0)), Some(CellValue::Number(1.0))]
    );
}

#[test]
fn modify_first_row() {
    assert_eq!(
        lines::modify_line(SCENARIO, 0, &["3", "z"], 0),
        "| a | b |\n| - | - |\n| 3 | z |\n| 2 | y |"
    );
}

#[test]
fn document_without_tables() {
    let src = "# Notes\n\n| not | a table |\nbecause no separator follows\n";
    assert_eq!(lines::read_table_lines(src, 0), None);
    assert_eq!(lines::read_line(src, 0, 0), None);
    assert!(!document::has_tables(src));
    assert_eq!(lines::remove_line(src, -1, 0), src);
}

#[test]
fn empty_enum_is_string() {
    let registry = FormatterRegistry::new();
    let as_enum = Configuration::from_yaml("columns:\n  b:\n    type: enum\n    enum: {}\n").unwrap();
    let as_string = Configuration::from_yaml("columns:\n  b:\n    type: string\n").unwrap();
    let document = Document::parse(SCENARIO);
    let data = document.table(0).unwrap().raw_data();
    let enum_rows = project_rows(
        &data,
        &resolve_columns(&data.columns, &as_enum, &registry),
        &RowQuery::default(),
    );
    let string_rows = project_rows(
        &data,
        &resolve_columns(&data.columns, &as_string, &registry),
        &RowQuery::default(),
    );
    assert_eq!(enum_rows, string_rows);
    assert_eq!(
        enum_rows.rows[0].cells[1].value,
        CellValue::String("x".to_owned())
    );
}

#[test]
fn second_page_of_thirty() {
    let mut src = String::from("| n |\n| -- |\n");
    for n in 0..30 {
        src.push_str(&format!("| {n} |\n"));
    }
    let document = Document::parse(&src);
    let data = document.table(0).unwrap().raw_data();
    let configuration = Configuration::default();
    let columns = resolve_columns(&data.columns, &configuration, &FormatterRegistry::new());
    let query = RowQuery {
        pagination: Some(Pagination::new(25, vec![]).with_page(2)),
        ..Default::default()
    };
    let projection = project_rows(&data, &columns, &query);
    assert_eq!(projection.total_unpaginated, 30);
    assert_eq!(
        projection.rows.iter().map(|row| row.index).collect::<Vec<_>>(),
        (25..30).collect::<Vec<_>>()
    );
}

#[test]
fn fixtures_round_trip() {
    for path in [
        "src/tests/inventory/document.md",
        "src/tests/journal/document.md",
    ] {
        let src = std::fs::read_to_string(path).unwrap();
        assert_eq!(Document::parse(&src).to_string(), src, "{path}");
    }
}

#[test]
fn mutations_touch_one_table() {
    let src = std::fs::read_to_string("src/tests/inventory/document.md").unwrap();
    let edited = lines::modify_line(&src, 0, &["oat milk", "2"], 1);
    let before = src.lines().collect::<Vec<_>>();
    let after = edited.lines().collect::<Vec<_>>();
    assert_eq!(before.len(), after.len());
    let changed = before
        .iter()
        .zip(&after)
        .filter(|(before, after)| before != after)
        .collect::<Vec<_>>();
    assert_eq!(changed, vec![(&"| milk | 2 |", &"| oat milk | 2 |")]);
    assert_eq!(lines::modify_line(&edited, 0, &["oat milk", "2"], 1), edited);

    let inserted = lines::insert_line(&src, 2, &["Salt", "dry", "1", "0.5", "", "0", ""], 0);
    assert_eq!(lines::remove_line(&inserted, 2, 0), src);
    let appended = lines::insert_line(&src, -1, &["eggs", "12"], 1);
    assert_eq!(
        lines::read_line(&appended, -1, 1),
        Some(vec![" eggs ".to_owned(), " 12 ".to_owned()])
    );
}
