//! Tolerant field readers for raw records.
//!
//! Every reader returns a default or `None` instead of failing: a missing
//! or malformed field is never an error.

use crate::models::{RawRecord, SalaryRange, NOT_SPECIFIED};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

/// Walk a dotted path (`employer.name`) through nested objects.
pub fn lookup<'a>(record: &'a RawRecord, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;

    for part in parts {
        current = current.as_object()?.get(part)?;
    }

    match current {
        Value::Null => None,
        other => Some(other),
    }
}

/// Trimmed, non-empty string at `path`. Numbers are rendered as text.
pub fn text(record: &RawRecord, path: &str) -> Option<String> {
    let value = match lookup(record, path)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Categorical field with the sentinel applied.
pub fn category(record: &RawRecord, path: &str) -> String {
    text(record, path).unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

/// Optional number; accepts JSON numbers and plain numeric strings.
pub fn number(record: &RawRecord, path: &str) -> Option<f64> {
    match lookup(record, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Paired range read from `<path>.from` and `<path>.to`.
///
/// Returns `None` when neither bound is present so the record drops out of
/// the denominator of any salary average.
pub fn range(record: &RawRecord, path: &str) -> Option<SalaryRange> {
    let range = SalaryRange {
        from: number(record, &format!("{}.from", path)),
        to: number(record, &format!("{}.to", path)),
    };

    if range.from.is_none() && range.to.is_none() {
        None
    } else {
        Some(range)
    }
}

/// Scalar count at `path`, compact notation allowed, 0 when missing.
pub fn count(record: &RawRecord, path: &str) -> i64 {
    match lookup(record, path) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_compact_number(s),
        _ => 0,
    }
}

/// Parse counts such as `"12K"`, `"3.4M"`, `"1,234"`, `"1,5K"` or `"-3"`.
///
/// Anything that does not parse yields 0.
pub fn parse_compact_number(raw: &str) -> i64 {
    let compact: Vec<char> = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();

    // A comma followed by exactly three digits groups thousands; any other
    // comma is the decimal separator.
    let mut cleaned = String::with_capacity(compact.len());
    for (i, &c) in compact.iter().enumerate() {
        if c != ',' {
            cleaned.push(c);
            continue;
        }
        let group = compact[i + 1..].iter().take_while(|d| d.is_ascii_digit()).count();
        if group != 3 {
            cleaned.push('.');
        }
    }

    if cleaned.is_empty() {
        return 0;
    }

    let (digits, multiplier) = match cleaned.chars().last() {
        Some('K') | Some('k') => (&cleaned[..cleaned.len() - 1], 1_000.0),
        Some('M') | Some('m') => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    let digits = digits.strip_prefix('+').unwrap_or(digits);

    match digits.parse::<f64>() {
        Ok(value) if value.is_finite() => (value * multiplier).round() as i64,
        _ => 0,
    }
}

/// Date at `path`; accepts RFC 3339, `+0300`-style offsets, or a bare date.
pub fn date(record: &RawRecord, path: &str) -> Option<NaiveDate> {
    let raw = text(record, path)?;
    parse_date(&raw)
}

/// Parse the date formats the sources publish.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.date_naive());
    }

    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}
