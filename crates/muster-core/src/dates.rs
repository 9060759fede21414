//! Calendar-day arithmetic and display formatting.
//!
//! Everything here operates on plain calendar dates. There is no
//! time-of-day component and no timezone conversion anywhere in the
//! crate; dates are constructed and compared purely from their
//! year/month/day fields.

use chrono::{Duration, NaiveDate};

/// How a date is rendered in report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    /// `MM/DD`, zero-padded.
    MonthDay,
    /// `YYYY.MM.DD`, zero-padded.
    YearDotted,
}

impl DisplayFormat {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "short" | "md" | "mm/dd" => Some(Self::MonthDay),
            "dotted" | "full" | "yyyy.mm.dd" => Some(Self::YearDotted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthDay => "short",
            Self::YearDotted => "dotted",
        }
    }
}

/// Parse a strict `YYYY-MM-DD` string. Returns `None` on anything
/// malformed; callers treat that as the empty/defensive case rather
/// than an error.
pub fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Canonical `YYYY-MM-DD` with a zero-padded four-digit year.
pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Shift by `n` calendar days. Crosses month and year boundaries;
/// `n` may be negative.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    date + Duration::days(n)
}

/// True iff `b` is the calendar day immediately after `a`.
pub fn is_next_day(a: NaiveDate, b: NaiveDate) -> bool {
    add_days(a, 1) == b
}

pub fn format_date(date: NaiveDate, style: DisplayFormat) -> String {
    match style {
        DisplayFormat::MonthDay => date.format("%m/%d").to_string(),
        DisplayFormat::YearDotted => date.format("%Y.%m.%d").to_string(),
    }
}
