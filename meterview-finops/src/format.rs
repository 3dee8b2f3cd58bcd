use meterview_common::format_year_month;
use num_format::{Locale, ToFormattedString};
use serde_json::Value;

/// Placeholder for empty cells.
pub const EMPTY_CELL: &str = "-";

/// Fraction digits shown on metric cards.
pub const METRIC_DECIMALS: usize = 2;

/// `GlobalAccountName` -> `Global Account Name`, `spaceName` -> `space Name`.
pub fn header_label(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        if c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out.trim().to_string()
}

/// Thousands-grouped with exactly `decimals` fraction digits.
pub fn format_fixed(n: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let mut out = String::new();
    if n.is_sign_negative() && raw.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    match int_part.parse::<u128>() {
        Ok(int) => out.push_str(&int.to_formatted_string(&Locale::en)),
        Err(_) => out.push_str(int_part),
    }
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    out
}

/// Thousands-grouped with at most `max_decimals` fraction digits, trailing
/// zeros dropped.
pub fn format_up_to(n: f64, max_decimals: usize) -> String {
    let fixed = format_fixed(n, max_decimals);
    match fixed.split_once('.') {
        Some((int_part, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                int_part.to_string()
            } else {
                format!("{}.{}", int_part, frac)
            }
        }
        None => fixed,
    }
}

/// Table cells: up to three decimals.
pub fn format_number(n: f64) -> String {
    format_up_to(n, 3)
}

/// How a table column renders its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// `YYYYMM` shown as `YYYY-MM`.
    Month,
    /// Two fixed decimals.
    Amount,
    /// Up to three decimals.
    Plain,
}

pub fn format_cell(value: Option<&Value>, style: CellStyle) -> String {
    let value = match value {
        None | Some(Value::Null) => return EMPTY_CELL.to_string(),
        Some(v) => v,
    };
    match (style, value) {
        (CellStyle::Month, v) => format_year_month(v).unwrap_or_else(|| EMPTY_CELL.to_string()),
        (CellStyle::Amount, Value::Number(n)) => n
            .as_f64()
            .map(|f| format_fixed(f, 2))
            .unwrap_or_else(|| n.to_string()),
        (CellStyle::Plain, Value::Number(n)) => n
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| n.to_string()),
        (_, Value::String(s)) => s.clone(),
        (_, other) => other.to_string(),
    }
}
