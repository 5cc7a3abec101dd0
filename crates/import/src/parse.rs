use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// Everything that is not a digit, separator, or sign gets stripped before
/// amount parsing — currency symbols, spaces, stray text.
static AMOUNT_JUNK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\d.,\-]").unwrap());

/// Date formats tried in this exact order. The order is a behavioral
/// contract: `01/02/2023` parses day-first because `%d/%m/%Y` is tried
/// before `%m/%d/%Y`. Reordering changes the meaning of ambiguous dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m.%d.%Y",
    "%Y.%m.%d",
    "%d %m %Y",
    "%m %d %Y",
    "%Y %m %d",
];

/// Fallback formats for inputs the fixed list misses: month names and
/// datetime stamps whose time-of-day is discarded.
const RELAXED_DATE_FORMATS: &[&str] = &["%d %b %Y", "%b %d %Y", "%B %d, %Y", "%d %B %Y"];
const RELAXED_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse an amount out of arbitrary statement text.
///
/// Returns `None` on anything unparseable; never panics. Handles both
/// `1,234.56` and `1.234,56`: when both separators appear, the one further
/// right is the decimal point. A lone comma is a decimal point only when it
/// is followed by at most two digits; otherwise commas are thousands
/// separators and are stripped.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut cleaned = AMOUNT_JUNK.replace_all(trimmed, "").into_owned();

    if cleaned.contains(',') && cleaned.contains('.') {
        // Both guaranteed present, so the rfinds compare as Some(_) values.
        if cleaned.rfind(',') > cleaned.rfind('.') {
            cleaned = cleaned.replace('.', "").replace(',', ".");
        } else {
            cleaned = cleaned.replace(',', "");
        }
    } else if cleaned.contains(',') {
        let parts: Vec<&str> = cleaned.split(',').collect();
        if parts.len() == 2 && parts[1].len() <= 2 {
            cleaned = cleaned.replace(',', ".");
        } else {
            cleaned = cleaned.replace(',', "");
        }
    }

    Decimal::from_str(&cleaned).ok()
}

/// Parse a calendar date out of arbitrary statement text.
///
/// Tries `DATE_FORMATS` in order, then the relaxed fallbacks. Returns `None`
/// when nothing matches; never panics.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    for fmt in RELAXED_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    for fmt in RELAXED_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    None
}
