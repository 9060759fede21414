//! Collapses a participant's sorted date set into minimal display
//! segments under a gap-bridging policy.

use chrono::NaiveDate;

use crate::dates::{DisplayFormat, format_date, is_next_day};
use crate::holiday::{HolidayProvider, all_red_between};

/// Policy for which gaps between selected dates get bridged into one
/// displayed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MergeMode {
    /// Only literally consecutive dates merge.
    Keep,
    /// Gaps merge when every day in between is a Saturday, Sunday, or
    /// holiday.
    Red,
    /// Everything collapses into one min-to-max span.
    All,
}

impl MergeMode {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "keep" => Some(Self::Keep),
            "red" => Some(Self::Red),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Red => "red",
            Self::All => "all",
        }
    }
}

/// A closed date range chosen for display. `start == end` renders as a
/// single date token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Segment {
    pub fn contains(&self, other: &Segment) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Build the segment list for one participant.
///
/// `dates` must already be sorted and deduplicated; the aggregator
/// guarantees that. The scan is a single greedy forward pass: the
/// connect rule is monotonic in date order, so no backtracking is
/// needed and the result is the unique minimal segmentation.
pub fn build_segments(
    dates: &[NaiveDate],
    mode: MergeMode,
    provider: &dyn HolidayProvider,
) -> Vec<Segment> {
    let Some((&first, rest)) = dates.split_first() else {
        return Vec::new();
    };

    if mode == MergeMode::All {
        let last = rest.last().copied().unwrap_or(first);
        return vec![Segment { start: first, end: last }];
    }

    let mut segments = Vec::new();
    let mut start = first;
    let mut prev = first;

    for &cur in rest {
        let connects = is_next_day(prev, cur)
            || (mode == MergeMode::Red && all_red_between(provider, prev, cur));
        if connects {
            prev = cur;
        } else {
            segments.push(Segment { start, end: prev });
            start = cur;
            prev = cur;
        }
    }

    segments.push(Segment { start, end: prev });
    segments
}

/// Render segments in the given style, joined by `", "`.
pub fn format_segments(segments: &[Segment], style: DisplayFormat) -> String {
    segments
        .iter()
        .map(|seg| {
            if seg.start == seg.end {
                format_date(seg.start, style)
            } else {
                format!(
                    "{}~{}",
                    format_date(seg.start, style),
                    format_date(seg.end, style)
                )
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
