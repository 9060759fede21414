//! Per-participant aggregation: turns the raw (date, names) events
//! into one report row per participant.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;

use crate::dates::{DisplayFormat, format_iso};
use crate::holiday::HolidayProvider;
use crate::segment::{MergeMode, build_segments, format_segments};

/// Canonical identity of a participant's attendance set: the sorted,
/// deduplicated dates. This is the join key for row grouping and for
/// per-group merge-mode overrides.
///
/// Kept as a typed date list rather than the joined string so two
/// different sets can never collide through formatting; `Display`
/// produces the comma-joined ISO form when a string key is wanted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatesKey(Vec<NaiveDate>);

impl DatesKey {
    pub fn new(dates: &BTreeSet<NaiveDate>) -> Self {
        Self(dates.iter().copied().collect())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DatesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|d| format_iso(*d))
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

/// One participant's line in the report. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    /// Formatted segment list, e.g. `"2024.01.01~2024.01.02, 2024.01.05"`.
    pub periods: String,
    /// Count of distinct selected dates. Independent of the merge
    /// mode: bridging changes how dates display, never how many were
    /// attended.
    pub day_count: usize,
    pub dates_key: DatesKey,
}

/// Aggregate the current events into report rows, one per participant
/// with at least one date, sorted by name.
///
/// Names sort in code-point order, which coincides with Korean
/// alphabetical order for Hangul syllables. Recomputed fresh on every
/// call; the event counts involved make caching pointless.
pub fn build_report(
    events: &BTreeMap<NaiveDate, Vec<String>>,
    mode: MergeMode,
    style: DisplayFormat,
    provider: &dyn HolidayProvider,
) -> Vec<ReportRow> {
    let mut by_name: BTreeMap<String, BTreeSet<NaiveDate>> = BTreeMap::new();
    for (&date, names) in events {
        for name in names {
            if name.is_empty() {
                continue;
            }
            by_name.entry(name.clone()).or_default().insert(date);
        }
    }

    by_name
        .into_iter()
        .map(|(name, dates)| {
            let sorted: Vec<NaiveDate> = dates.iter().copied().collect();
            let segments = build_segments(&sorted, mode, provider);
            ReportRow {
                name,
                periods: format_segments(&segments, style),
                day_count: sorted.len(),
                dates_key: DatesKey::new(&dates),
            }
        })
        .collect()
}
