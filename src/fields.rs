//! Cleanup for locale-formatted amounts and loosely formatted dates found in
//! bank and wallet exports.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// How an amount cell that holds no digits at all should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blank {
    /// Empty cells and a bare `-` mean "nothing on this side" (ledger debit/credit columns).
    AsZero,
    /// Empty cells and a bare `-` are not an amount.
    AsInvalid,
}

/// Strip everything except ASCII digits, `.` and `-`, then parse.
///
/// `"₹1,234.50 Dr"` becomes `1234.5`. Leftovers that still do not form a
/// number (`"1.2.3"`, `"5-3"`) are `None` regardless of the blank policy.
pub fn clean_amount(raw: &str, blank: Blank) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return match blank {
            Blank::AsZero => Some(0.0),
            Blank::AsInvalid => None,
        };
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// Tried in order after whitespace is collapsed. Day-first bank formats come
// before the US slash form.
const DATE_FORMATS: &[&str] = &[
    "%d %b %Y",  // 04 Sep 2025
    "%b %d, %Y", // Sep 4, 2025
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",  // 04-Sep-2025
    "%d %B %Y",  // 4 September 2025
    "%B %d, %Y", // September 4, 2025
    "%b %d %Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
];

/// Parse a statement date. Returns `None` for anything unrecognized; callers
/// must drop the row rather than substitute a default date.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, fmt) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&text) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
        .map(|dt| dt.date())
}
