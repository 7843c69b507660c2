//! Number display options
//!
//! A column's `number-format` is an option list in the shape of a JS object
//! literal body (`style: 'currency', currency: 'EUR'`). The recognized
//! options mirror `Intl.NumberFormat`.

use tracing::trace;
use winnow::{
    Parser as _,
    ascii::{digit0, digit1, multispace0},
    combinator::{alt, opt},
    token::{one_of, take_while},
};

type ParseResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumberStyle {
    #[default]
    Decimal,
    Percent,
    Currency,
}

/// Separators and symbol placement of a locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub tag: String,
    pub group: char,
    pub decimal: char,
    pub currency_after: bool,
    pub percent_space: bool,
}

impl Default for Locale {
    fn default() -> Self {
        Self::from_tag("en-US")
    }
}

impl Locale {
    /// Unknown languages fall back to English separators.
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.replace('_', "-").to_ascii_lowercase();
        let mut parts = normalized.split('-');
        let language = parts.next().unwrap_or_default();
        let region = parts.next().unwrap_or_default();
        let (group, decimal, currency_after, percent_space) = match (language, region) {
            (_, "ch") | ("ch", _) => ('\u{2019}', '.', false, false),
            ("de" | "es" | "it" | "pt", _) => ('.', ',', true, true),
            ("nl", _) => ('.', ',', false, false),
            ("fr", _) => ('\u{202f}', ',', true, true),
            _ => (',', '.', false, false),
        };
        Self {
            tag: tag.to_owned(),
            group,
            decimal,
            currency_after,
            percent_space,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    pub style: NumberStyle,
    pub currency: Option<String>,
    pub minimum_fraction_digits: Option<usize>,
    pub maximum_fraction_digits: Option<usize>,
    pub minimum_integer_digits: usize,
    pub use_grouping: bool,
    pub locale: Locale,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            style: NumberStyle::Decimal,
            currency: None,
            minimum_fraction_digits: None,
            maximum_fraction_digits: None,
            minimum_integer_digits: 1,
            use_grouping: true,
            locale: Locale::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum OptionValue {
    Str(String),
    Number(f64),
    Bool(bool),
}

fn identifier<'a>(input: &mut &'a str) -> ParseResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '$').parse_next(input)
}

fn quoted(input: &mut &str) -> ParseResult<String> {
    let mut quote = one_of(['"', '\'']).parse_next(input)?;
    let body = take_while(0.., |c: char| c != quote).parse_next(input)?;
    quote.parse_next(input)?;
    Ok(body.to_owned())
}

fn number(input: &mut &str) -> ParseResult<f64> {
    (opt('-'), digit1, opt(('.', digit0)))
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn option_value(input: &mut &str) -> ParseResult<OptionValue> {
    alt((
        quoted.map(OptionValue::Str),
        number.map(OptionValue::Number),
        "true".value(OptionValue::Bool(true)),
        "false".value(OptionValue::Bool(false)),
    ))
    .parse_next(input)
}

fn option_pair(input: &mut &str) -> ParseResult<(String, OptionValue)> {
    let key = alt((quoted, identifier.map(str::to_owned))).parse_next(input)?;
    multispace0.parse_next(input)?;
    ':'.parse_next(input)?;
    multispace0.parse_next(input)?;
    let value = option_value.parse_next(input)?;
    Ok((key, value))
}

fn option_list(input: &mut &str) -> ParseResult<Vec<(String, OptionValue)>> {
    multispace0.parse_next(input)?;
    let braced = opt('{').parse_next(input)?.is_some();
    multispace0.parse_next(input)?;

    let mut pairs = Vec::new();
    while !input.is_empty() && !input.starts_with('}') {
        pairs.push(option_pair.parse_next(input)?);
        multispace0.parse_next(input)?;
        if opt(',').parse_next(input)?.is_none() {
            break;
        }
        multispace0.parse_next(input)?;
    }

    if braced {
        '}'.parse_next(input)?;
    }
    multispace0.parse_next(input)?;
    Ok(pairs)
}

impl NumberFormat {
    /// Parse an option list; `None` when it is malformed.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut input = spec;
        let pairs = option_list(&mut input).ok()?;
        if !input.is_empty() {
            return None;
        }
        let mut format = Self::default();
        for (key, value) in pairs {
            match (key.as_str(), value) {
                ("style", OptionValue::Str(style)) => {
                    format.style = match style.as_str() {
                        "percent" => NumberStyle::Percent,
                        "currency" => NumberStyle::Currency,
                        _ => NumberStyle::Decimal,
                    }
                }
                ("currency", OptionValue::Str(currency)) => {
                    format.currency = Some(currency.to_ascii_uppercase())
                }
                ("minimumFractionDigits", OptionValue::Number(n)) => {
                    format.minimum_fraction_digits = Some(digits(n))
                }
                ("maximumFractionDigits", OptionValue::Number(n)) => {
                    format.maximum_fraction_digits = Some(digits(n))
                }
                ("minimumIntegerDigits", OptionValue::Number(n)) => {
                    format.minimum_integer_digits = digits(n).max(1)
                }
                ("useGrouping", OptionValue::Bool(grouping)) => format.use_grouping = grouping,
                ("locale", OptionValue::Str(tag)) => format.locale = Locale::from_tag(&tag),
                (key, value) => trace!(key, ?value, "ignored number format option"),
            }
        }
        Some(format)
    }

    fn fraction_digits(&self) -> (usize, usize) {
        let (default_min, default_max) = match self.style {
            NumberStyle::Decimal => (0, 3),
            NumberStyle::Percent => (0, 0),
            NumberStyle::Currency if self.currency.as_deref() == Some("JPY") => (0, 0),
            NumberStyle::Currency => (2, 2),
        };
        match (self.minimum_fraction_digits, self.maximum_fraction_digits) {
            (Some(min), Some(max)) => (min, max.max(min)),
            (Some(min), None) => (min, default_max.max(min)),
            (None, Some(max)) => (default_min.min(max), max),
            (None, None) => (default_min, default_max),
        }
    }

    fn currency_symbol(&self) -> String {
        match self.currency.as_deref() {
            Some("USD") => "$".to_owned(),
            Some("EUR") => "€".to_owned(),
            Some("GBP") => "£".to_owned(),
            Some("JPY") => "¥".to_owned(),
            Some("INR") => "₹".to_owned(),
            Some(code) => code.to_owned(),
            None => "¤".to_owned(),
        }
    }

    pub fn format(&self, n: f64) -> String {
        if n.is_nan() {
            return "NaN".to_owned();
        }
        let value = match self.style {
            NumberStyle::Percent => n * 100.0,
            _ => n,
        };
        let sign = if value.is_sign_negative() { "-" } else { "" };
        if value.is_infinite() {
            return format!("{sign}∞");
        }

        let (min_fraction, max_fraction) = self.fraction_digits();
        let rounded = format!("{:.*}", max_fraction, value.abs());
        let (integer, fraction) = rounded.split_once('.').unwrap_or((&rounded, ""));
        let mut fraction = fraction.to_owned();
        while fraction.len() > min_fraction && fraction.ends_with('0') {
            fraction.pop();
        }
        let is_zero = integer.bytes().all(|b| b == b'0') && fraction.bytes().all(|b| b == b'0');
        let sign = if is_zero { "" } else { sign };

        let mut digits = integer.to_owned();
        while digits.len() < self.minimum_integer_digits {
            digits.insert(0, '0');
        }
        let mut number = if self.use_grouping {
            group(&digits, self.locale.group)
        } else {
            digits
        };
        if !fraction.is_empty() {
            number.push(self.locale.decimal);
            number.push_str(&fraction);
        }

        match self.style {
            NumberStyle::Decimal => format!("{sign}{number}"),
            NumberStyle::Percent if self.locale.percent_space => format!("{sign}{number}\u{a0}%"),
            NumberStyle::Percent => format!("{sign}{number}%"),
            NumberStyle::Currency => {
                let symbol = self.currency_symbol();
                if self.locale.currency_after {
                    format!("{sign}{number}\u{a0}{symbol}")
                } else if symbol.chars().all(char::is_alphabetic) {
                    format!("{sign}{symbol}\u{a0}{number}")
                } else {
                    format!("{sign}{symbol}{number}")
                }
            }
        }
    }
}

fn digits(n: f64) -> usize {
    n.clamp(0.0, 20.0) as usize
}

fn group(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let format = NumberFormat::parse(
            "style: 'currency', currency: \"eur\", minimumFractionDigits: 1, useGrouping: false,",
        )
        .unwrap();
        assert_eq!(format.style, NumberStyle::Currency);
        assert_eq!(format.currency.as_deref(), Some("EUR"));
        assert_eq!(format.minimum_fraction_digits, Some(1));
        assert!(!format.use_grouping);
    }

    #[test]
    fn test_parse_braced_and_empty() {
        assert_eq!(NumberFormat::parse(""), Some(NumberFormat::default()));
        assert_eq!(NumberFormat::parse("{ }"), Some(NumberFormat::default()));
        let format = NumberFormat::parse("{ maximumFractionDigits: 0 }").unwrap();
        assert_eq!(format.maximum_fraction_digits, Some(0));
    }

    #[test]
    fn test_malformed_options() {
        assert_eq!(NumberFormat::parse("style: "), None);
        assert_eq!(NumberFormat::parse("style 'percent'"), None);
        assert_eq!(NumberFormat::parse("{ style: 'percent'"), None);
    }

    #[test]
    fn test_unknown_options_are_ignored() {
        let format = NumberFormat::parse("notation: 'compact', style: 'percent'").unwrap();
        assert_eq!(format.style, NumberStyle::Percent);
    }

    #[test]
    fn test_format_decimal() {
        let format = NumberFormat::default();
        assert_eq!(format.format(1234567.891), "1,234,567.891");
        assert_eq!(format.format(0.12345), "0.123");
        assert_eq!(format.format(-42.0), "-42");
        assert_eq!(format.format(-0.0001), "0");
        assert_eq!(format.format(f64::NAN), "NaN");
    }

    #[test]
    fn test_format_fraction_digits() {
        let format = NumberFormat::parse("minimumFractionDigits: 2").unwrap();
        assert_eq!(format.format(3.0), "3.00");
        assert_eq!(format.format(3.14159), "3.142");
        let format = NumberFormat::parse("minimumIntegerDigits: 3, useGrouping: false").unwrap();
        assert_eq!(format.format(7.5), "007.5");
    }

    #[test]
    fn test_format_percent_and_currency() {
        let percent = NumberFormat::parse("style: 'percent'").unwrap();
        assert_eq!(percent.format(0.256), "26%");
        let dollars = NumberFormat::parse("style: 'currency', currency: 'USD'").unwrap();
        assert_eq!(dollars.format(1234.5), "$1,234.50");
        let euros =
            NumberFormat::parse("style: 'currency', currency: 'EUR', locale: 'de-DE'").unwrap();
        assert_eq!(euros.format(1234.5), "1.234,50\u{a0}€");
        let francs =
            NumberFormat::parse("style: 'currency', currency: 'CHF', locale: 'de-CH'").unwrap();
        assert_eq!(francs.format(1234.5), "CHF\u{a0}1\u{2019}234.50");
    }
}
