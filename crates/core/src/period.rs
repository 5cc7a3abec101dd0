use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation window token. Unrecognized tokens resolve to `Monthly`;
/// that fallback is documented behavior, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub fn parse(token: &str) -> Self {
        match token.to_lowercase().as_str() {
            "daily" => Period::Daily,
            "weekly" => Period::Weekly,
            "monthly" => Period::Monthly,
            "yearly" => Period::Yearly,
            _ => Period::Monthly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }

    /// Days left in the current window, counted from `today` exclusive.
    /// A daily window has nothing left by definition.
    pub fn days_remaining(self, today: NaiveDate) -> i64 {
        match self {
            Period::Daily => 0,
            Period::Weekly => {
                i64::from((6 - today.weekday().num_days_from_monday()) % 7)
            }
            Period::Monthly => (next_month_start(today) - today).num_days(),
            Period::Yearly => {
                let next_year = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap();
                (next_year - today).num_days()
            }
        }
    }
}

impl std::str::FromStr for Period {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Period::parse(s))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Resolve a period token against an anchor date. Always yields a valid
    /// window with `start <= end`:
    /// daily → the anchor day; weekly → Monday..Sunday of the anchor's ISO
    /// week; monthly → first..last day of the anchor's month; yearly →
    /// Jan 1..Dec 31 of the anchor's year.
    pub fn for_period(period: Period, anchor: NaiveDate) -> Self {
        match period {
            Period::Daily => DateRange::new(anchor, anchor),
            Period::Weekly => {
                let start =
                    anchor - Duration::days(i64::from(anchor.weekday().num_days_from_monday()));
                DateRange::new(start, start + Duration::days(6))
            }
            Period::Monthly => {
                DateRange::new(month_start(anchor), next_month_start(anchor) - Duration::days(1))
            }
            Period::Yearly => DateRange::new(
                NaiveDate::from_ymd_opt(anchor.year(), 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(anchor.year(), 12, 31).unwrap(),
            ),
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn total_days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Days of the window consumed so far, counting `today` itself.
    /// Negative when `today` precedes the window; callers guard on `<= 0`.
    pub fn days_elapsed(self, today: NaiveDate) -> i64 {
        (today - self.start).num_days() + 1
    }
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

/// First day of the month `n` whole months before the one containing `date`.
pub fn months_back(date: NaiveDate, n: u32) -> NaiveDate {
    month_start(date) - Months::new(n)
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date) + Months::new(1)
}
