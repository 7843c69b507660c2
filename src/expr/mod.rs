//! Filter and formatter expressions
//!
//! Expressions are a small, side-effect free subset of JavaScript
//! expression syntax evaluated against fixed bindings:
//!
//! - `$row`: alias to value map of the current row
//! - `$cell`: value of the cell being formatted
//! - `$data`: the raw table (`$data.columns`, `$data.rows`)
//! - `$ctx`: formatting context (`$ctx.row`, `$ctx.column`, `$ctx.alias`)
//!
//! ```text
//! $row.price > 10 && $row.name.toLowerCase().includes('bolt')
//! $cell === null ? '-' : $cell.toFixed(2) + ' kg'
//! ```

use std::{cmp::Ordering, fmt, str::FromStr};

use crate::{
    document::RawTableData,
    value::{CellValue, DatePattern, RowValues, parse_number},
};

mod parser;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("invalid expression at offset {offset}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("${0} is not available here")]
    Unbound(&'static str),
    #[error("cannot read property '{0}'")]
    UnknownField(String),
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
    #[error("invalid operand for {0}")]
    Type(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Row,
    Cell,
    Data,
    Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(CellValue),
    Binding(Binding),
    List(Vec<Expr>),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

pub fn parse(src: &str) -> Result<Expr, ParseError> {
    parser::parse(src)
}

impl FromStr for Expr {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Where a formatter is being applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    pub row: usize,
    pub column: String,
    pub alias: String,
}

/// Values the bindings of an expression refer to.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'s> {
    pub row: &'s RowValues,
    pub data: &'s RawTableData,
    pub cell: Option<&'s CellValue>,
    pub context: Option<&'s EvalContext>,
}

impl<'s> Scope<'s> {
    pub fn new(row: &'s RowValues, data: &'s RawTableData) -> Self {
        Self {
            row,
            data,
            cell: None,
            context: None,
        }
    }

    pub fn with_cell(self, cell: &'s CellValue, context: &'s EvalContext) -> Self {
        Self {
            cell: Some(cell),
            context: Some(context),
            ..self
        }
    }

    fn lookup(&self, binding: Binding) -> Result<Evaluated<'s>, EvalError> {
        match binding {
            Binding::Row => Ok(Evaluated::Row(self.row)),
            Binding::Data => Ok(Evaluated::Data(self.data)),
            Binding::Cell => self
                .cell
                .map(|cell| Evaluated::Value(cell.clone()))
                .ok_or(EvalError::Unbound("cell")),
            Binding::Context => self
                .context
                .map(Evaluated::Context)
                .ok_or(EvalError::Unbound("ctx")),
        }
    }
}

/// Result of evaluating an expression.
///
/// Objects reachable from the bindings are borrowed, scalars are owned.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated<'s> {
    Value(CellValue),
    List(Vec<Evaluated<'s>>),
    Row(&'s RowValues),
    Data(&'s RawTableData),
    Context(&'s EvalContext),
    Strings(&'s [String]),
    Rows(&'s [Vec<String>]),
}

fn is_textual(value: &CellValue) -> bool {
    matches!(value, CellValue::String(_) | CellValue::Enum(_))
}

/// `Number(value)` in JavaScript terms.
fn numeric(value: &CellValue) -> f64 {
    match value {
        CellValue::Null => 0.0,
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::String(s) | CellValue::Enum(s) if s.trim().is_empty() => 0.0,
        CellValue::String(s) | CellValue::Enum(s) => parse_number(s).unwrap_or(f64::NAN),
        CellValue::Date(d) => {
            d.and_time(chrono::NaiveTime::MIN)
                .and_utc()
                .timestamp_millis() as f64
        }
        CellValue::DateTime(dt) => dt.and_utc().timestamp_millis() as f64,
        CellValue::Time(t) => {
            let since_midnight = *t - chrono::NaiveTime::MIN;
            since_midnight.num_milliseconds() as f64
        }
    }
}

fn position(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

#[derive(PartialEq, Eq)]
enum Kind {
    Null,
    Text,
    Number,
    Bool,
    Date,
    Object,
}

impl Evaluated<'_> {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Value(value) => value.is_truthy(),
            _ => true,
        }
    }

    /// Owned cell value; objects are reduced to their text.
    pub fn into_value(self) -> CellValue {
        match self {
            Self::Value(value) => value,
            other => CellValue::String(other.to_string()),
        }
    }

    fn numeric(&self) -> f64 {
        match self {
            Self::Value(value) => numeric(value),
            _ => f64::NAN,
        }
    }

    fn kind(&self) -> Kind {
        match self {
            Self::Value(CellValue::Null) => Kind::Null,
            Self::Value(CellValue::String(_) | CellValue::Enum(_)) => Kind::Text,
            Self::Value(CellValue::Number(_)) => Kind::Number,
            Self::Value(CellValue::Bool(_)) => Kind::Bool,
            Self::Value(_) => Kind::Date,
            _ => Kind::Object,
        }
    }
}

impl<'s> Evaluated<'s> {
    fn member(self, name: &str) -> Result<Self, EvalError> {
        let found = match (self, name) {
            (Self::Row(row), name) => {
                Self::Value(row.get(name).cloned().unwrap_or(CellValue::Null))
            }
            (Self::Data(data), "columns") => Self::Strings(&data.columns),
            (Self::Data(data), "rows") => Self::Rows(&data.rows),
            (Self::Context(context), "row") => {
                Self::Value(CellValue::Number(context.row as f64))
            }
            (Self::Context(context), "column") => {
                Self::Value(CellValue::String(context.column.clone()))
            }
            (Self::Context(context), "alias") => {
                Self::Value(CellValue::String(context.alias.clone()))
            }
            (Self::List(items), "length") => Self::Value(CellValue::Number(items.len() as f64)),
            (Self::Strings(items), "length") => {
                Self::Value(CellValue::Number(items.len() as f64))
            }
            (Self::Rows(rows), "length") => Self::Value(CellValue::Number(rows.len() as f64)),
            (Self::Value(CellValue::String(s) | CellValue::Enum(s)), "length") => {
                Self::Value(CellValue::Number(s.chars().count() as f64))
            }
            (_, name) => return Err(EvalError::UnknownField(name.to_owned())),
        };
        Ok(found)
    }

    fn index(self, index: &Evaluated<'s>) -> Result<Self, EvalError> {
        let Self::Value(key) = index else {
            return Err(EvalError::Type("index"));
        };
        let at = match key {
            CellValue::Number(n) => position(*n),
            _ => None,
        };
        let found = match (self, at) {
            (Self::List(items), Some(i)) => items.into_iter().nth(i),
            (Self::Strings(items), Some(i)) => items
                .get(i)
                .map(|item| Self::Value(CellValue::String(item.clone()))),
            (Self::Rows(rows), Some(i)) => rows.get(i).map(|row| Self::Strings(row)),
            (Self::Value(CellValue::String(s)), Some(i)) => s
                .chars()
                .nth(i)
                .map(|c| Self::Value(CellValue::String(c.to_string()))),
            (target, _) => return target.member(&key.to_string()),
        };
        Ok(found.unwrap_or(Self::Value(CellValue::Null)))
    }

    fn call(self, method: &str, args: &[Evaluated<'s>]) -> Result<Self, EvalError> {
        let text_arg = |i: usize| args.get(i).map(ToString::to_string).unwrap_or_default();
        let value = match (&self, method) {
            (Self::Value(CellValue::String(s) | CellValue::Enum(s)), _) => match method {
                "includes" => CellValue::Bool(s.contains(&text_arg(0))),
                "startsWith" => CellValue::Bool(s.starts_with(&text_arg(0))),
                "endsWith" => CellValue::Bool(s.ends_with(&text_arg(0))),
                "toLowerCase" => CellValue::String(s.to_lowercase()),
                "toUpperCase" => CellValue::String(s.to_uppercase()),
                "trim" => CellValue::String(s.trim().to_owned()),
                "toString" => CellValue::String(s.clone()),
                _ => return Err(EvalError::UnknownMethod(method.to_owned())),
            },
            (Self::Value(CellValue::Number(n)), "toFixed") => {
                let digits = args.first().map(Evaluated::numeric).unwrap_or(0.0);
                let digits = position(digits.trunc()).unwrap_or(0).min(100);
                CellValue::String(format!("{n:.digits$}"))
            }
            (
                Self::Value(
                    value @ (CellValue::Date(_) | CellValue::DateTime(_) | CellValue::Time(_)),
                ),
                "format",
            ) => {
                let pattern = DatePattern::new(&text_arg(0));
                let formatted = match value {
                    CellValue::Date(d) => pattern.format_date(d),
                    CellValue::DateTime(dt) => pattern.format_datetime(dt),
                    CellValue::Time(t) => pattern.format_time(t),
                    _ => None,
                };
                CellValue::String(formatted.ok_or(EvalError::Type("format"))?)
            }
            (Self::Value(value), "toString") => CellValue::String(value.to_string()),
            (Self::List(items), "includes") => {
                let needle = args.first().cloned().unwrap_or(Self::Value(CellValue::Null));
                CellValue::Bool(items.iter().any(|item| strict_eq(item, &needle)))
            }
            (Self::Strings(items), "includes") => {
                let needle = args.first();
                CellValue::Bool(items.iter().any(|item| {
                    needle.is_some_and(|needle| {
                        strict_eq(&Self::Value(CellValue::String(item.clone())), needle)
                    })
                }))
            }
            _ => return Err(EvalError::UnknownMethod(method.to_owned())),
        };
        Ok(Self::Value(value))
    }
}

impl fmt::Display for Evaluated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::List(items) => {
                let parts = items.iter().map(ToString::to_string).collect::<Vec<_>>();
                f.write_str(&parts.join(","))
            }
            Self::Strings(items) => f.write_str(&items.join(",")),
            Self::Rows(rows) => {
                let rows = rows.iter().map(|row| row.join(",")).collect::<Vec<_>>();
                f.write_str(&rows.join(","))
            }
            Self::Row(_) | Self::Data(_) | Self::Context(_) => f.write_str("[object Object]"),
        }
    }
}

fn compare(lhs: &Evaluated<'_>, rhs: &Evaluated<'_>) -> Option<Ordering> {
    let (Evaluated::Value(a), Evaluated::Value(b)) = (lhs, rhs) else {
        return None;
    };
    if let Some(ordering) = a.chrono_cmp(b) {
        return Some(ordering);
    }
    match (a, b) {
        (CellValue::String(a) | CellValue::Enum(a), CellValue::String(b) | CellValue::Enum(b)) => {
            Some(a.cmp(b))
        }
        _ => numeric(a).partial_cmp(&numeric(b)),
    }
}

fn loose_eq(lhs: &Evaluated<'_>, rhs: &Evaluated<'_>) -> bool {
    match (lhs, rhs) {
        (Evaluated::Value(CellValue::Null), Evaluated::Value(CellValue::Null)) => true,
        (Evaluated::Value(CellValue::Null), _) | (_, Evaluated::Value(CellValue::Null)) => false,
        (Evaluated::Value(a), Evaluated::Value(b)) if is_textual(a) && is_textual(b) => {
            a.as_str() == b.as_str()
        }
        (Evaluated::Value(a), Evaluated::Value(b)) => match a.chrono_cmp(b) {
            Some(ordering) => ordering == Ordering::Equal,
            None => numeric(a) == numeric(b),
        },
        (a, b) => a == b,
    }
}

fn strict_eq(lhs: &Evaluated<'_>, rhs: &Evaluated<'_>) -> bool {
    lhs.kind() == rhs.kind() && loose_eq(lhs, rhs)
}

fn binary<'s>(op: BinaryOp, lhs: Evaluated<'s>, rhs: Evaluated<'s>) -> Evaluated<'s> {
    let compared = |accept: fn(Ordering) -> bool| {
        CellValue::Bool(compare(&lhs, &rhs).is_some_and(accept))
    };
    let value = match op {
        BinaryOp::And => return if lhs.is_truthy() { rhs } else { lhs },
        BinaryOp::Or => return if lhs.is_truthy() { lhs } else { rhs },
        BinaryOp::Add => match (&lhs, &rhs) {
            (Evaluated::Value(a), Evaluated::Value(b)) if !is_textual(a) && !is_textual(b) => {
                CellValue::Number(numeric(a) + numeric(b))
            }
            _ => CellValue::String(format!("{lhs}{rhs}")),
        },
        BinaryOp::Sub => CellValue::Number(lhs.numeric() - rhs.numeric()),
        BinaryOp::Mul => CellValue::Number(lhs.numeric() * rhs.numeric()),
        BinaryOp::Div => CellValue::Number(lhs.numeric() / rhs.numeric()),
        BinaryOp::Rem => CellValue::Number(lhs.numeric() % rhs.numeric()),
        BinaryOp::Lt => compared(Ordering::is_lt),
        BinaryOp::Le => compared(Ordering::is_le),
        BinaryOp::Gt => compared(Ordering::is_gt),
        BinaryOp::Ge => compared(Ordering::is_ge),
        BinaryOp::Eq => CellValue::Bool(loose_eq(&lhs, &rhs)),
        BinaryOp::Ne => CellValue::Bool(!loose_eq(&lhs, &rhs)),
        BinaryOp::StrictEq => CellValue::Bool(strict_eq(&lhs, &rhs)),
        BinaryOp::StrictNe => CellValue::Bool(!strict_eq(&lhs, &rhs)),
    };
    Evaluated::Value(value)
}

impl Expr {
    pub fn evaluate<'s>(&self, scope: &Scope<'s>) -> Result<Evaluated<'s>, EvalError> {
        match self {
            Self::Literal(value) => Ok(Evaluated::Value(value.clone())),
            Self::Binding(binding) => scope.lookup(*binding),
            Self::List(items) => items
                .iter()
                .map(|item| item.evaluate(scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Evaluated::List),
            Self::Member(target, name) => target.evaluate(scope)?.member(name),
            Self::Index(target, index) => {
                let target = target.evaluate(scope)?;
                target.index(&index.evaluate(scope)?)
            }
            Self::Call {
                target,
                method,
                args,
            } => {
                let target = target.evaluate(scope)?;
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(scope))
                    .collect::<Result<Vec<_>, _>>()?;
                target.call(method, &args)
            }
            Self::Unary(UnaryOp::Not, operand) => Ok(Evaluated::Value(CellValue::Bool(
                !operand.evaluate(scope)?.is_truthy(),
            ))),
            Self::Unary(UnaryOp::Neg, operand) => Ok(Evaluated::Value(CellValue::Number(
                -operand.evaluate(scope)?.numeric(),
            ))),
            Self::Binary(BinaryOp::And, lhs, rhs) => {
                let lhs = lhs.evaluate(scope)?;
                if lhs.is_truthy() {
                    rhs.evaluate(scope)
                } else {
                    Ok(lhs)
                }
            }
            Self::Binary(BinaryOp::Or, lhs, rhs) => {
                let lhs = lhs.evaluate(scope)?;
                if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    rhs.evaluate(scope)
                }
            }
            Self::Binary(op, lhs, rhs) => {
                Ok(binary(*op, lhs.evaluate(scope)?, rhs.evaluate(scope)?))
            }
            Self::Conditional(test, then, otherwise) => {
                if test.evaluate(scope)?.is_truthy() {
                    then.evaluate(scope)
                } else {
                    otherwise.evaluate(scope)
                }
            }
        }
    }

    /// Evaluate as a filter predicate.
    pub fn test(&self, scope: &Scope<'_>) -> Result<bool, EvalError> {
        Ok(self.evaluate(scope)?.is_truthy())
    }
}
