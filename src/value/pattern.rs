//! Date patterns
//!
//! Patterns are written with moment-style tokens (`DD-MM-YYYY HH:mm`) and
//! translated once into `chrono` format items, which are then used both to
//! parse cells and to display values.

use std::fmt::{self, Write as _};

use chrono::{
    NaiveDate, NaiveDateTime, NaiveTime,
    format::{Fixed, Item, Numeric, Pad, Parsed, StrftimeItems},
};

/// Recognized tokens, longest first so that `YYYY` wins over `YY`.
const TOKENS: [&str; 21] = [
    "YYYY", "YY", "MMMM", "MMM", "MM", "M", "dddd", "ddd", "DD", "D", "HH", "H", "hh", "h", "mm",
    "m", "SSS", "ss", "s", "A", "a",
];

fn token_item(token: &str) -> Item<'static> {
    match token {
        "YYYY" => Item::Numeric(Numeric::Year, Pad::Zero),
        "YY" => Item::Numeric(Numeric::YearMod100, Pad::Zero),
        "MMMM" => Item::Fixed(Fixed::LongMonthName),
        "MMM" => Item::Fixed(Fixed::ShortMonthName),
        "MM" => Item::Numeric(Numeric::Month, Pad::Zero),
        "M" => Item::Numeric(Numeric::Month, Pad::None),
        "dddd" => Item::Fixed(Fixed::LongWeekdayName),
        "ddd" => Item::Fixed(Fixed::ShortWeekdayName),
        "DD" => Item::Numeric(Numeric::Day, Pad::Zero),
        "D" => Item::Numeric(Numeric::Day, Pad::None),
        "HH" => Item::Numeric(Numeric::Hour, Pad::Zero),
        "H" => Item::Numeric(Numeric::Hour, Pad::None),
        "hh" => Item::Numeric(Numeric::Hour12, Pad::Zero),
        "h" => Item::Numeric(Numeric::Hour12, Pad::None),
        "mm" => Item::Numeric(Numeric::Minute, Pad::Zero),
        "m" => Item::Numeric(Numeric::Minute, Pad::None),
        // three fractional digits without the leading dot
        "SSS" => StrftimeItems::new("%3f").next().unwrap_or(Item::Error),
        "ss" => Item::Numeric(Numeric::Second, Pad::Zero),
        "s" => Item::Numeric(Numeric::Second, Pad::None),
        "A" => Item::Fixed(Fixed::UpperAmPm),
        _ => Item::Fixed(Fixed::LowerAmPm),
    }
}

fn flush_literal(items: &mut Vec<Item<'static>>, literal: &mut String) {
    if literal.is_empty() {
        return;
    }
    let text = std::mem::take(literal).into_boxed_str();
    if text.chars().all(char::is_whitespace) {
        items.push(Item::OwnedSpace(text));
    } else {
        items.push(Item::OwnedLiteral(text));
    }
}

fn translate(source: &str) -> Vec<Item<'static>> {
    let mut items = Vec::new();
    let mut literal = String::new();
    let mut rest = source;
    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                literal.push_str(&rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }
        if let Some(token) = TOKENS.iter().find(|token| rest.starts_with(**token)) {
            flush_literal(&mut items, &mut literal);
            items.push(token_item(token));
            rest = &rest[token.len()..];
            continue;
        }
        literal.push(c);
        rest = &rest[c.len_utf8()..];
    }
    flush_literal(&mut items, &mut literal);
    items
}

/// A date, datetime or time pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct DatePattern {
    source: String,
    items: Vec<Item<'static>>,
}

impl DatePattern {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_owned(),
            items: translate(source),
        }
    }

    /// The pattern as written in the configuration.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn parsed(&self, text: &str) -> Option<Parsed> {
        let mut parsed = Parsed::new();
        chrono::format::parse(&mut parsed, text.trim(), self.items.iter()).ok()?;
        Some(parsed)
    }

    pub fn parse_date(&self, text: &str) -> Option<NaiveDate> {
        self.parsed(text)?.to_naive_date().ok()
    }

    pub fn parse_datetime(&self, text: &str) -> Option<NaiveDateTime> {
        self.parsed(text)?.to_naive_datetime_with_offset(0).ok()
    }

    pub fn parse_time(&self, text: &str) -> Option<NaiveTime> {
        self.parsed(text)?.to_naive_time().ok()
    }

    pub fn format_date(&self, date: &NaiveDate) -> Option<String> {
        render(date.format_with_items(self.items.iter()))
    }

    pub fn format_datetime(&self, datetime: &NaiveDateTime) -> Option<String> {
        render(datetime.format_with_items(self.items.iter()))
    }

    pub fn format_time(&self, time: &NaiveTime) -> Option<String> {
        render(time.format_with_items(self.items.iter()))
    }
}

/// `None` when the pattern asks for a field the value does not have, e.g.
/// hours of a plain date.
fn render(formatted: impl fmt::Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{formatted}").ok()?;
    Some(out)
}
