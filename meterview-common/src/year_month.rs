use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A report period in the billing API's `YYYYMM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: u16,
    pub month: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected YYYYMM, got {0:?}")]
pub struct InvalidYearMonth(pub String);

impl YearMonth {
    pub fn new(year: u16, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// `YYYY-MM`, the form used on chart axes and in the month filter.
    pub fn dashed(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = InvalidYearMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || InvalidYearMonth(s.to_string());
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: u16 = s[..4].parse().map_err(|_| invalid())?;
        let month: u8 = s[4..].parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// Rewrite the first run of six digits as `YYYY-MM`; anything else is kept.
///
/// Works on the string form so both `202501` and `"202501"` normalize the same.
pub fn format_year_month(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Some(dash_first_six_digits(&raw))
}

fn dash_first_six_digits(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let start = (0..bytes.len().saturating_sub(5))
        .find(|&i| bytes[i..i + 6].iter().all(u8::is_ascii_digit));
    match start {
        Some(i) => format!("{}{}-{}{}", &raw[..i], &raw[i..i + 4], &raw[i + 4..i + 6], &raw[i + 6..]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_and_display() {
        let ym: YearMonth = "202510".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2025, month: 10 });
        assert_eq!(ym.to_string(), "202510");
        assert_eq!(ym.dashed(), "2025-10");
    }

    #[test]
    fn rejects_bad_input() {
        for bad in ["2025", "2025-01", "202513", "202500", "abcdef", "2025011"] {
            assert!(bad.parse::<YearMonth>().is_err(), "{bad}");
        }
    }

    #[test]
    fn formats_numbers_and_strings() {
        assert_eq!(format_year_month(&json!(202503)).as_deref(), Some("2025-03"));
        assert_eq!(format_year_month(&json!("202411")).as_deref(), Some("2024-11"));
        assert_eq!(format_year_month(&json!(null)), None);
    }

    #[test]
    fn leaves_unmatched_values_alone() {
        assert_eq!(format_year_month(&json!("2025")).as_deref(), Some("2025"));
        assert_eq!(format_year_month(&json!("Q1-2025")).as_deref(), Some("Q1-2025"));
        // Only the first run is rewritten, longer runs keep their tail.
        assert_eq!(format_year_month(&json!(20250101)).as_deref(), Some("2025-0101"));
    }
}
