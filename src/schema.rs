use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    config::{
        ColumnConfig, ColumnType, Configuration, DEFAULT_BOOL_NO_FORMAT, DEFAULT_BOOL_YES_FORMAT,
    },
    format::{FormatContext, Formatter, FormatterRegistry},
    value::{self, CellValue, DatePattern, NumberFormat},
};

/// Column type with everything decoding and formatting dispatch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    String,
    Number,
    Bool,
    Date,
    DateTime,
    Time,
    /// Enum with a non-empty value to label map.
    Enum(IndexMap<String, String>),
}

impl ColumnKind {
    /// An `enum` without labels behaves as a `string`.
    fn resolve(column_type: ColumnType, enum_values: Option<&IndexMap<String, String>>) -> Self {
        match column_type {
            ColumnType::String => Self::String,
            ColumnType::Number => Self::Number,
            ColumnType::Bool => Self::Bool,
            ColumnType::Date => Self::Date,
            ColumnType::Datetime => Self::DateTime,
            ColumnType::Time => Self::Time,
            ColumnType::Enum => match enum_values {
                Some(values) if !values.is_empty() => Self::Enum(values.clone()),
                _ => Self::String,
            },
        }
    }

    pub fn is_date_family(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Time)
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::String => ColumnType::String,
            Self::Number => ColumnType::Number,
            Self::Bool => ColumnType::Bool,
            Self::Date => ColumnType::Date,
            Self::DateTime => ColumnType::Datetime,
            Self::Time => ColumnType::Time,
            Self::Enum(_) => ColumnType::Enum,
        }
    }
}

/// A header cell merged with its configuration.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    /// Header text.
    pub name: String,
    /// Position in the header.
    pub index: usize,
    pub alias: String,
    /// Type as written in the configuration.
    pub declared_type: ColumnType,
    /// Effective type.
    pub kind: ColumnKind,
    /// Pattern date-family cells are written with.
    pub storage_format: DatePattern,
    /// Pattern date-family values are displayed with.
    pub date_format: DatePattern,
    pub number_format: NumberFormat,
    /// Text of a true `bool` cell.
    pub yes_input: String,
    /// Text of a false `bool` cell.
    pub no_input: String,
    /// Display text of a true `bool` value.
    pub yes_format: String,
    /// Display text of a false `bool` value.
    pub no_format: String,
    pub editable: bool,
    pub hidden: bool,
    pub nowrap: bool,
    pub formatter: Formatter,
}

impl ResolvedColumn {
    fn resolve(
        index: usize,
        name: &str,
        column: &ColumnConfig,
        configuration: &Configuration,
        registry: &FormatterRegistry,
    ) -> Self {
        let declared_type = column.column_type.unwrap_or_default();
        let kind = ColumnKind::resolve(declared_type, column.enum_values.as_ref());
        let storage = configuration.storage_date_format(kind.column_type());
        let number_format = match column.number_format.as_deref() {
            None => NumberFormat::default(),
            Some(spec) => NumberFormat::parse(spec).unwrap_or_else(|| {
                warn!(column = name, spec, "malformed number format, using defaults");
                NumberFormat::default()
            }),
        };
        let alias = match column.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias.to_owned(),
            _ => name.to_owned(),
        };
        Self {
            name: name.to_owned(),
            index,
            alias,
            declared_type,
            kind,
            storage_format: DatePattern::new(storage),
            date_format: DatePattern::new(column.date_format.as_deref().unwrap_or(storage)),
            number_format,
            yes_input: configuration.yes_input().to_owned(),
            no_input: configuration.no_input().to_owned(),
            yes_format: column
                .yes_format
                .clone()
                .unwrap_or_else(|| DEFAULT_BOOL_YES_FORMAT.to_owned()),
            no_format: column
                .no_format
                .clone()
                .unwrap_or_else(|| DEFAULT_BOOL_NO_FORMAT.to_owned()),
            editable: column
                .editable
                .or(configuration.editable)
                .unwrap_or_default(),
            hidden: column.hidden,
            nowrap: column.nowrap,
            formatter: Formatter::resolve(column.formatter.as_deref(), registry),
        }
    }

    pub fn decode(&self, raw: &str) -> CellValue {
        value::decode(raw, &self.kind, &self.storage_format, &self.yes_input)
    }

    /// Cell text of a value, written the way [`Self::decode`] reads it.
    pub fn encode(&self, value: &CellValue) -> Option<String> {
        value::encode(value, &self.storage_format, &self.yes_input, &self.no_input)
    }

    pub fn format(&self, value: &CellValue, context: &FormatContext<'_>) -> String {
        self.formatter.format(value, context)
    }

    pub fn enum_label<'a>(&'a self, key: &'a str) -> &'a str {
        match &self.kind {
            ColumnKind::Enum(values) => values.get(key).map(String::as_str).unwrap_or(key),
            _ => key,
        }
    }
}

/// Resolve every header cell against the configuration.
///
/// The result is index-aligned with `headers`. A header without a
/// configuration entry gets all defaults.
pub fn resolve_columns<S: AsRef<str>>(
    headers: &[S],
    configuration: &Configuration,
    registry: &FormatterRegistry,
) -> Vec<ResolvedColumn> {
    let empty = ColumnConfig::default();
    for name in configuration.columns.keys() {
        if !headers.iter().any(|header| header.as_ref() == name) {
            debug!(column = %name, "configured column not found in table header");
        }
    }
    headers
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = name.as_ref();
            let column = configuration.column(name).unwrap_or(&empty);
            ResolvedColumn::resolve(index, name, column, configuration, registry)
        })
        .collect()
}

/// Columns that are not hidden.
pub fn visible_columns(columns: &[ResolvedColumn]) -> impl Iterator<Item = &ResolvedColumn> {
    columns.iter().filter(|column| !column.hidden)
}

pub fn find_column<'a>(columns: &'a [ResolvedColumn], alias: &str) -> Option<&'a ResolvedColumn> {
    columns.iter().find(|column| column.alias == alias)
}

/// Look a column up by alias, falling back to the header text.
pub fn lookup_column<'a>(
    columns: &'a [ResolvedColumn],
    key: &str,
) -> Option<&'a ResolvedColumn> {
    find_column(columns, key).or_else(|| columns.iter().find(|column| column.name == key))
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;

    use super::*;

    fn resolve(yaml: &str, headers: &[&str]) -> Vec<ResolvedColumn> {
        let configuration = Configuration::from_yaml(yaml).unwrap();
        resolve_columns(headers, &configuration, &FormatterRegistry::default())
    }

    #[test]
    fn test_defaults() {
        let columns = resolve("", &["a", "b"]);
        assert_eq!(columns.len(), 2);
        let b = &columns[1];
        assert_eq!(b.name, "b");
        assert_eq!(b.index, 1);
        assert_eq!(b.alias, "b");
        assert_eq!(b.kind, ColumnKind::String);
        assert_eq!(b.date_format.source(), "DD-MM-YYYY");
        assert_eq!(b.yes_input, "1");
        assert_eq!(b.yes_format, "✔️");
        assert!(!b.editable);
        assert!(!b.hidden);
    }

    #[test]
    fn test_configured_column() {
        let columns = resolve(
            r#"
editable: true
date-format: YYYY-MM-DD
yes-format: "yes"
columns:
  When:
    alias: when
    type: date
    date-format: D MMM YYYY
    editable: false
  Done:
    type: bool
    yes-format: "Y"
    hidden: true
  Price:
    number-format: "style: 'percent'"
    nowrap: true
"#,
            &["When", "Done", "Price"],
        );
        let when = &columns[0];
        assert_eq!(when.alias, "when");
        assert_eq!(when.kind, ColumnKind::Date);
        assert_eq!(when.storage_format.source(), "YYYY-MM-DD");
        assert_eq!(when.date_format.source(), "D MMM YYYY");
        assert!(!when.editable);

        let done = &columns[1];
        assert_eq!(done.yes_input, "yes");
        assert_eq!(done.yes_format, "Y");
        assert!(done.editable);
        assert!(done.hidden);
        assert_eq!(done.decode("yes"), CellValue::Bool(true));

        let price = &columns[2];
        assert_eq!(price.number_format.format(0.5), "50%");
        assert!(price.nowrap);
        assert_eq!(visible_columns(&columns).count(), 2);
    }

    #[test]
    fn test_datetime_and_time_storage() {
        let columns = resolve(
            "datetime-format: YYYY-MM-DD HH:mm\ncolumns:\n  At:\n    type: datetime\n  T:\n    type: time\n",
            &["At", "T"],
        );
        assert_eq!(columns[0].storage_format.source(), "YYYY-MM-DD HH:mm");
        assert_eq!(columns[0].date_format.source(), "YYYY-MM-DD HH:mm");
        assert_eq!(columns[1].storage_format.source(), "HH:mm");
        assert!(columns[1].kind.is_date_family());
    }

    #[test]
    fn test_enum_without_labels_is_string() {
        for yaml in [
            "columns:\n  S:\n    type: enum\n",
            "columns:\n  S:\n    type: enum\n    enum: {}\n",
        ] {
            let columns = resolve(yaml, &["S"]);
            assert_eq!(columns[0].declared_type, ColumnType::Enum);
            assert_eq!(columns[0].kind, ColumnKind::String);
            assert_eq!(columns[0].decode("x"), CellValue::String("x".into()));
        }
    }

    #[test]
    fn test_enum_labels() {
        let columns = resolve(
            "columns:\n  S:\n    type: enum\n    enum:\n      o: Open\n      c: Closed\n",
            &["S"],
        );
        let expected = hashmap! { "o" => "Open", "c" => "Closed", "x" => "x" };
        for (key, label) in expected {
            assert_eq!(columns[0].enum_label(key), label);
        }
    }

    #[test]
    fn test_malformed_number_format_falls_back() {
        let columns = resolve("columns:\n  N:\n    number-format: \"style: \"\n", &["N"]);
        assert_eq!(columns[0].number_format, NumberFormat::default());
    }

    #[test]
    fn test_lookup() {
        let columns = resolve("columns:\n  Name:\n    alias: n\n", &["Name", "Qty"]);
        assert_eq!(find_column(&columns, "n").map(|c| c.index), Some(0));
        assert!(find_column(&columns, "Name").is_none());
        assert_eq!(lookup_column(&columns, "Name").map(|c| c.index), Some(0));
        assert_eq!(lookup_column(&columns, "Qty").map(|c| c.index), Some(1));
    }
}
