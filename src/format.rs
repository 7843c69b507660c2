//! Display formatting of cell values
//!
//! Each column carries a [`Formatter`] chosen once at column resolution:
//! the type driven default, a `formatter` expression from the
//! configuration, or a function registered by the embedding application.
//! None of them can fail; a broken formatter shows the value as is.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    document::RawTableData,
    expr::{self, EvalContext, Expr, Scope},
    schema::{ColumnKind, ResolvedColumn},
    value::{CellValue, RowValues},
};

/// Everything a formatter may look at besides the value itself.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub column: &'a ResolvedColumn,
    /// Logical index of the row in the table.
    pub row_index: usize,
    pub row: &'a RowValues,
    pub data: &'a RawTableData,
}

/// A formatter supplied by the embedding application.
///
/// Returning `None` falls back to the plain value.
pub type FormatterFn =
    Arc<dyn Fn(&CellValue, &FormatContext<'_>) -> Option<String> + Send + Sync>;

/// Named formatter functions a column can refer to by name.
#[derive(Clone, Default)]
pub struct FormatterRegistry {
    formatters: IndexMap<String, FormatterFn>,
}

impl fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.formatters.keys()).finish()
    }
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, formatter: F) -> &mut Self
    where
        F: Fn(&CellValue, &FormatContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.formatters.insert(name.into(), Arc::new(formatter));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FormatterFn> {
        self.formatters.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formatters.keys().map(String::as_str)
    }
}

#[derive(Clone, Default)]
pub enum Formatter {
    /// Formatting driven by the column type.
    #[default]
    Default,
    /// A `formatter` expression from the configuration.
    Expression { source: String, expr: Arc<Expr> },
    Registered { name: String, function: FormatterFn },
    /// A formatter that could not be parsed; values are shown unformatted.
    Identity,
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Expression { source, .. } => {
                f.debug_tuple("Expression").field(source).finish()
            }
            Self::Registered { name, .. } => f.debug_tuple("Registered").field(name).finish(),
            Self::Identity => f.write_str("Identity"),
        }
    }
}

impl Formatter {
    /// A registered name wins over an expression of the same text.
    pub fn resolve(source: Option<&str>, registry: &FormatterRegistry) -> Self {
        let Some(source) = source.map(str::trim).filter(|source| !source.is_empty()) else {
            return Self::Default;
        };
        if let Some(function) = registry.get(source) {
            return Self::Registered {
                name: source.to_owned(),
                function: function.clone(),
            };
        }
        match expr::parse(source) {
            Ok(expr) => Self::Expression {
                source: source.to_owned(),
                expr: Arc::new(expr),
            },
            Err(e) => {
                warn!(%e, source, "broken formatter expression, values are shown unformatted");
                Self::Identity
            }
        }
    }

    pub fn format(&self, value: &CellValue, context: &FormatContext<'_>) -> String {
        match self {
            Self::Default => default_format(context.column, value),
            Self::Identity => value.to_string(),
            Self::Registered { function, .. } => {
                function(value, context).unwrap_or_else(|| value.to_string())
            }
            Self::Expression { expr, .. } => {
                let eval_context = EvalContext {
                    row: context.row_index,
                    column: context.column.name.clone(),
                    alias: context.column.alias.clone(),
                };
                let scope = Scope::new(context.row, context.data).with_cell(value, &eval_context);
                match expr.evaluate(&scope) {
                    Ok(formatted) => formatted.to_string(),
                    Err(e) => {
                        debug!(
                            %e,
                            column = %context.column.name,
                            row = context.row_index,
                            "formatter failed"
                        );
                        value.to_string()
                    }
                }
            }
        }
    }
}

/// Type driven display of a value.
pub fn default_format(column: &ResolvedColumn, value: &CellValue) -> String {
    let formatted = match (&column.kind, value) {
        (_, CellValue::Null) => Some(String::new()),
        (ColumnKind::Number, CellValue::Number(n)) => Some(column.number_format.format(*n)),
        (ColumnKind::Bool, CellValue::Bool(true)) => Some(column.yes_format.clone()),
        (ColumnKind::Bool, CellValue::Bool(false)) => Some(column.no_format.clone()),
        (_, CellValue::Date(date)) => column.date_format.format_date(date),
        (_, CellValue::DateTime(datetime)) => column.date_format.format_datetime(datetime),
        (_, CellValue::Time(time)) => column.date_format.format_time(time),
        (ColumnKind::Enum(_), CellValue::Enum(key)) => Some(column.enum_label(key).to_owned()),
        _ => None,
    };
    formatted.unwrap_or_else(|| value.to_string())
}
