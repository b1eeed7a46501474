use std::fmt;

use serde::Serialize;

/// A single cell. Spreadsheet exports hand us strings, numbers, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw text cell, keeping it as text. Empty cells become `Missing`.
    pub fn from_cell(raw: &str) -> Self {
        if raw.is_empty() {
            Value::Missing
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell. Non-numeric content is `None`, never an error.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if f.is_finite() => Some(*f),
            Value::Float(_) => None,
            Value::Text(s) => parse_number(s),
            Value::Missing => None,
        }
    }

    /// Whole-number view: numeric cells with no fractional part.
    pub fn as_whole(&self) -> Option<i64> {
        let n = self.as_number()?;
        if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Some(n as i64)
        } else {
            None
        }
    }

    /// Borrow the text of a `Text` cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Stringified form. `Missing` is the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// Parse a decimal number as typed into a spreadsheet.
///
/// Accepts a trailing `%`, `,` thousands separators, and a lone decimal comma
/// (`85,5`). Returns `None` for anything else, including NaN and infinities.
pub fn parse_number(raw: &str) -> Option<f64> {
    let t = raw.trim();
    let t = t.strip_suffix('%').map(str::trim_end).unwrap_or(t);
    if t.is_empty() {
        return None;
    }

    let parsed = if !t.contains(',') {
        t.parse::<f64>().ok()
    } else if is_decimal_comma(t) {
        t.replace(',', ".").parse::<f64>().ok()
    } else {
        t.replace(',', "").parse::<f64>().ok()
    };

    parsed.filter(|n| n.is_finite())
}

/// One comma, no dot, and one or two digits after it: `85,5` or `12,75`.
fn is_decimal_comma(t: &str) -> bool {
    if t.contains('.') || t.matches(',').count() != 1 {
        return false;
    }
    match t.split_once(',') {
        Some((_, frac)) => (1..=2).contains(&frac.len()) && frac.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
