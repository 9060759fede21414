//! Holiday classification for one region.
//!
//! The segment builder only ever asks one question of this module:
//! is a given date a holiday? That capability is behind the
//! [`HolidayProvider`] trait so the region table can be swapped for a
//! file-backed one, or stubbed out entirely in tests, without touching
//! any of the aggregation code.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use tracing::info;

use crate::dates::{add_days, parse_iso};

pub trait HolidayProvider: std::fmt::Debug {
    /// Human-readable region name, e.g. `"South Korea"`.
    fn name(&self) -> &str;

    /// True iff `date` appears in the region's holiday table.
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// A red day is a non-working day on the calendar grid: Sunday or a
/// regional holiday.
pub fn is_red_day(provider: &dyn HolidayProvider, date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun || provider.is_holiday(date)
}

/// True iff every date strictly between `a` and `b` (`a < b`) is a
/// Saturday, Sunday, or holiday. Vacuously true when `b` is the day
/// after `a`. Only the `RED` merge mode consults this.
pub fn all_red_between(provider: &dyn HolidayProvider, a: NaiveDate, b: NaiveDate) -> bool {
    let mut day = add_days(a, 1);
    while day < b {
        if day.weekday() != Weekday::Sat && !is_red_day(provider, day) {
            return false;
        }
        day = add_days(day, 1);
    }
    true
}

/// A fixed-date holiday table.
#[derive(Debug, Clone)]
pub struct HolidayTable {
    name: String,
    dates: BTreeSet<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct HolidayFile {
    name: Option<String>,
    dates: Vec<String>,
}

// Statutory and substitute holidays, South Korea, 2024-2026. The
// election days and the one-off 2024-10-01 rest day are included
// because the grid treats them as red all the same.
const KOREA_HOLIDAYS: &[&str] = &[
    // 2024
    "2024-01-01",
    "2024-02-09", "2024-02-10", "2024-02-11", "2024-02-12",
    "2024-03-01",
    "2024-04-10",
    "2024-05-05", "2024-05-06",
    "2024-05-15",
    "2024-06-06",
    "2024-08-15",
    "2024-09-16", "2024-09-17", "2024-09-18",
    "2024-10-01", "2024-10-03", "2024-10-09",
    "2024-12-25",
    // 2025
    "2025-01-01",
    "2025-01-27", "2025-01-28", "2025-01-29", "2025-01-30",
    "2025-03-01", "2025-03-03",
    "2025-05-05", "2025-05-06",
    "2025-06-03", "2025-06-06",
    "2025-08-15",
    "2025-10-03", "2025-10-05", "2025-10-06", "2025-10-07", "2025-10-08",
    "2025-10-09",
    "2025-12-25",
    // 2026
    "2026-01-01",
    "2026-02-16", "2026-02-17", "2026-02-18",
    "2026-03-01", "2026-03-02",
    "2026-05-05",
    "2026-05-24", "2026-05-25",
    "2026-06-06",
    "2026-08-15", "2026-08-17",
    "2026-09-24", "2026-09-25", "2026-09-26",
    "2026-10-03", "2026-10-05", "2026-10-09",
    "2026-12-25",
];

impl HolidayTable {
    /// The built-in region table.
    pub fn korea() -> Self {
        let dates = KOREA_HOLIDAYS
            .iter()
            .filter_map(|iso| parse_iso(iso))
            .collect();
        Self {
            name: "South Korea".to_string(),
            dates,
        }
    }

    pub fn new(name: impl Into<String>, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            name: name.into(),
            dates: dates.into_iter().collect(),
        }
    }

    /// Load a replacement table from a TOML file of the form:
    ///
    /// ```toml
    /// name = "South Korea"
    /// dates = ["2024-01-01", "2024-03-01"]
    /// ```
    #[tracing::instrument(skip(path))]
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed: HolidayFile = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let mut dates = BTreeSet::new();
        for entry in &parsed.dates {
            let date = parse_iso(entry).ok_or_else(|| {
                anyhow!("invalid holiday date {:?} in {}", entry, path.display())
            })?;
            dates.insert(date);
        }

        let name = parsed
            .name
            .unwrap_or_else(|| "custom region".to_string());
        info!(
            file = %path.display(),
            region = %name,
            count = dates.len(),
            "loaded holiday table"
        );

        Ok(Self { name, dates })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl HolidayProvider for HolidayTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}
