//! Typed cell values and the cell text codec

use std::{cmp::Ordering, fmt};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::ColumnKind;

mod number;
mod pattern;

pub use number::{Locale, NumberFormat, NumberStyle};
pub use pattern::DatePattern;

/// Values of one row keyed by column alias.
pub type RowValues = IndexMap<String, CellValue>;

/// A decoded cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    String(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Key of a configured enum map; the label is looked up when formatting.
    Enum(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading used by numeric comparisons. `null` and `false` are 0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Null => Some(0.0),
            Self::String(s) | Self::Enum(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::String(s) | Self::Enum(s) => !s.is_empty(),
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Bool(b) => *b,
            Self::Date(_) | Self::DateTime(_) | Self::Time(_) => true,
        }
    }

    /// Chronological order of two values of the same date family.
    pub fn chrono_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::DateTime(b)) => a.and_time(NaiveTime::MIN).partial_cmp(b),
            (Self::DateTime(a), Self::Date(b)) => a.partial_cmp(&b.and_time(NaiveTime::MIN)),
            _ => None,
        }
    }
}

/// Number text the way JavaScript prints it.
pub fn display_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n == f64::INFINITY {
        "Infinity".to_owned()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_owned()
    } else if n == 0.0 {
        "0".to_owned()
    } else {
        n.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::String(s) | Self::Enum(s) => f.write_str(s),
            Self::Number(n) => f.write_str(&display_number(*n)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::String(s) | Self::Enum(s) => serializer.serialize_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Date(_) | Self::DateTime(_) | Self::Time(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

/// Parse number cell text.
///
/// Surrounding whitespace is ignored and `0x` prefixed hexadecimal is
/// accepted. Empty text and non-finite numbers are not numbers.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    // `f64::from_str` also reads "inf" and "NaN"
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
    {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Decode the text of a cell into a typed value.
///
/// Never fails: text that does not match the column type decodes to
/// [`CellValue::Null`]. `pattern` is the storage pattern of date-family
/// columns and `true_token` the text of a true `bool` cell.
pub fn decode(raw: &str, kind: &ColumnKind, pattern: &DatePattern, true_token: &str) -> CellValue {
    let decoded = match kind {
        ColumnKind::String => Some(CellValue::String(raw.to_owned())),
        ColumnKind::Enum(_) => Some(CellValue::Enum(raw.to_owned())),
        ColumnKind::Number => parse_number(raw).map(CellValue::Number),
        ColumnKind::Bool => Some(CellValue::Bool(raw == true_token)),
        ColumnKind::Date => pattern.parse_date(raw).map(CellValue::Date),
        ColumnKind::DateTime => pattern.parse_datetime(raw).map(CellValue::DateTime),
        ColumnKind::Time => pattern.parse_time(raw).map(CellValue::Time),
    };
    decoded.unwrap_or(CellValue::Null)
}

/// Cell text of a typed value.
///
/// `None` when the value cannot be written with the storage pattern.
pub fn encode(
    value: &CellValue,
    pattern: &DatePattern,
    yes_token: &str,
    no_token: &str,
) -> Option<String> {
    match value {
        CellValue::Null => Some(String::new()),
        CellValue::Bool(true) => Some(yes_token.to_owned()),
        CellValue::Bool(false) => Some(no_token.to_owned()),
        CellValue::Date(date) => pattern.format_date(date),
        CellValue::DateTime(datetime) => pattern.format_datetime(datetime),
        CellValue::Time(time) => pattern.format_time(time),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_pattern() -> DatePattern {
        DatePattern::new("DD-MM-YYYY")
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1"), Some(1.0));
        assert_eq!(parse_number(" -2.5 "), Some(-2.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("0x1F"), Some(31.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("12 apples"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1,5"), None);
    }

    #[test]
    fn test_decode_by_kind() {
        let pattern = date_pattern();
        assert_eq!(
            decode("1", &ColumnKind::Number, &pattern, "1"),
            CellValue::Number(1.0)
        );
        assert_eq!(
            decode("one", &ColumnKind::Number, &pattern, "1"),
            CellValue::Null
        );
        assert_eq!(
            decode("yes", &ColumnKind::Bool, &pattern, "yes"),
            CellValue::Bool(true)
        );
        assert_eq!(
            decode("no", &ColumnKind::Bool, &pattern, "yes"),
            CellValue::Bool(false)
        );
        assert_eq!(
            decode("whatever", &ColumnKind::Bool, &pattern, "yes"),
            CellValue::Bool(false)
        );
        assert_eq!(
            decode("05-01-2024", &ColumnKind::Date, &pattern, "1"),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
        );
        assert_eq!(
            decode("2024-01-05", &ColumnKind::Date, &pattern, "1"),
            CellValue::Null
        );
        assert_eq!(
            decode(" x ", &ColumnKind::String, &pattern, "1"),
            CellValue::String(" x ".into())
        );
        let map = IndexMap::from([("a".to_owned(), "Alpha".to_owned())]);
        assert_eq!(
            decode("a", &ColumnKind::Enum(map), &pattern, "1"),
            CellValue::Enum("a".into())
        );
    }

    #[test]
    fn test_decode_is_total() {
        let pattern = DatePattern::new("HH:mm");
        let kinds = [
            ColumnKind::String,
            ColumnKind::Number,
            ColumnKind::Bool,
            ColumnKind::Date,
            ColumnKind::DateTime,
            ColumnKind::Time,
            ColumnKind::Enum(IndexMap::new()),
        ];
        for raw in ["", "|", "🎉", "99:99", "-", "1e400", "\u{0}"] {
            for kind in &kinds {
                let _ = decode(raw, kind, &pattern, "1");
            }
        }
        assert_eq!(
            decode("1e400", &ColumnKind::Number, &pattern, "1"),
            CellValue::Null
        );
    }

    #[test]
    fn test_display_and_json() {
        assert_eq!(CellValue::Number(2.0).to_string(), "2");
        assert_eq!(CellValue::Number(0.5).to_string(), "0.5");
        assert_eq!(CellValue::Null.to_string(), "");
        let date = CellValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(date.to_string(), "2024-02-29");
        assert_eq!(
            serde_json::to_value([CellValue::Number(3.0), CellValue::Number(1.5), date]).unwrap(),
            serde_json::json!([3, 1.5, "2024-02-29"])
        );
        assert_eq!(
            serde_json::to_value(CellValue::Null).unwrap(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!CellValue::Null.is_truthy());
        assert!(!CellValue::String(String::new()).is_truthy());
        assert!(CellValue::String("0".into()).is_truthy());
        assert!(!CellValue::Number(0.0).is_truthy());
        assert!(!CellValue::Number(f64::NAN).is_truthy());
        assert!(CellValue::Bool(true).is_truthy());
    }

    #[test]
    fn test_encode() {
        let pattern = date_pattern();
        let date = CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(encode(&date, &pattern, "1", "0").as_deref(), Some("05-01-2024"));
        assert_eq!(
            encode(&CellValue::Bool(false), &pattern, "y", "n").as_deref(),
            Some("n")
        );
        assert_eq!(
            encode(&CellValue::Number(12.5), &pattern, "1", "0").as_deref(),
            Some("12.5")
        );
        let time = CellValue::Time(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(encode(&time, &pattern, "1", "0"), None);
    }
}
