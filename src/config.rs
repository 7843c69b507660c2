//! Table configuration
//!
//! The configuration is written by users as YAML next to a table. It is
//! validated against a closed schema (see [`crate::validate`]) before being
//! decoded into the types below, so unknown keys never reach the engine.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{Error, validate};

pub const DEFAULT_DATE_FORMAT: &str = "DD-MM-YYYY";
pub const DEFAULT_DATETIME_FORMAT: &str = "DD-MM-YYYY HH:mm";
pub const DEFAULT_TIME_FORMAT: &str = "HH:mm";
pub const DEFAULT_BOOL_YES_INPUT: &str = "1";
pub const DEFAULT_BOOL_NO_INPUT: &str = "0";
pub const DEFAULT_BOOL_YES_FORMAT: &str = "✔️";
pub const DEFAULT_BOOL_NO_FORMAT: &str = "✖️";
pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const DEFAULT_PAGE_SIZES: [usize; 3] = [25, 50, 100];

/// Label of the table-level `filter` among the selectable filters.
pub const DEFAULT_FILTER_LABEL: &str = "DEFAULT";

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Bool,
    Date,
    Datetime,
    Time,
    Enum,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Time => "time",
            Self::Enum => "enum",
        }
    }

    pub const ALL: [ColumnType; 7] = [
        Self::String,
        Self::Number,
        Self::Bool,
        Self::Date,
        Self::Datetime,
        Self::Time,
        Self::Enum,
    ];
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ColumnConfig {
    pub alias: Option<String>,
    #[serde(rename = "type")]
    pub column_type: Option<ColumnType>,
    pub editable: Option<bool>,
    pub date_format: Option<String>,
    pub number_format: Option<String>,
    pub formatter: Option<String>,
    #[serde(rename = "enum")]
    pub enum_values: Option<IndexMap<String, String>>,
    pub yes_format: Option<String>,
    pub no_format: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub nowrap: bool,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PaginationConfig {
    pub page_size: Option<usize>,
    pub page_sizes: Option<Vec<usize>>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    #[serde(default)]
    pub columns: IndexMap<String, ColumnConfig>,
    pub editable: Option<bool>,
    /// Pattern dates are stored with in the document.
    pub date_format: Option<String>,
    /// Pattern datetimes are stored with in the document.
    pub datetime_format: Option<String>,
    /// Token a `bool` cell holds when true.
    pub yes_format: Option<String>,
    /// Token a `bool` cell holds when false.
    pub no_format: Option<String>,
    pub filter: Option<String>,
    #[serde(default)]
    pub filters: IndexMap<String, String>,
    pub sort: Option<String>,
    pub pagination: Option<PaginationConfig>,
    #[serde(default)]
    pub hide_controls: bool,
    #[serde(default)]
    pub hide_configuration: bool,
    pub style: Option<String>,
    #[serde(default)]
    pub fix_header: bool,
}

impl Configuration {
    /// Parse, validate and decode a YAML configuration.
    ///
    /// An empty document is an empty configuration.
    pub fn from_yaml(src: &str) -> Result<Self, Error> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(src).map_err(Error::ParseYaml)?;
        Self::from_value(yaml_to_json(yaml))
    }

    /// Validate and decode an already parsed configuration.
    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        validate::validate(&value).map_err(Error::Validation)?;
        serde_json::from_value(value).map_err(Error::Decode)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.get(name)
    }

    /// Filters a user can pick from: the table-level `filter` first, then
    /// the named presets in declaration order.
    pub fn filter_options(&self) -> Vec<(&str, &str)> {
        self.filter
            .as_deref()
            .map(|filter| (DEFAULT_FILTER_LABEL, filter))
            .into_iter()
            .chain(
                self.filters
                    .iter()
                    .map(|(label, filter)| (label.as_str(), filter.as_str())),
            )
            .collect()
    }

    /// Storage pattern for a date-family column type.
    pub fn storage_date_format(&self, column_type: ColumnType) -> &str {
        match column_type {
            ColumnType::Time => DEFAULT_TIME_FORMAT,
            ColumnType::Datetime => self
                .datetime_format
                .as_deref()
                .unwrap_or(DEFAULT_DATETIME_FORMAT),
            _ => self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT),
        }
    }

    pub fn yes_input(&self) -> &str {
        self.yes_format.as_deref().unwrap_or(DEFAULT_BOOL_YES_INPUT)
    }

    pub fn no_input(&self) -> &str {
        self.no_format.as_deref().unwrap_or(DEFAULT_BOOL_NO_INPUT)
    }
}

/// Convert YAML into JSON, stringifying scalar mapping keys.
///
/// YAML allows `1: Low` in an enum map; JSON objects only have string keys.
pub fn yaml_to_json(value: serde_yaml::Value) -> serde_json::Value {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Null => serde_json::Value::Null,
        Yaml::Bool(b) => serde_json::Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Yaml::String(s) => serde_json::Value::String(s),
        Yaml::Sequence(items) => items.into_iter().map(yaml_to_json).collect(),
        Yaml::Mapping(mapping) => mapping
            .into_iter()
            .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;
    match key {
        Yaml::String(s) => s,
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Null => "null".to_owned(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}
