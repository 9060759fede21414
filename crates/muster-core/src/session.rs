//! Caller-owned session state and the user-action surface.
//!
//! The session holds the only mutable state in the system: the
//! selected dates with their name lists, the global merge mode and
//! display format, per-group overrides, and the highlight selection.
//! Every read (report, grouping, highlight set) is recomputed from the
//! current events; nothing derived is cached.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

use crate::dates::DisplayFormat;
use crate::group::{RowGroup, group_rows};
use crate::holiday::HolidayProvider;
use crate::report::{DatesKey, ReportRow, build_report};
use crate::segment::{MergeMode, build_segments, format_segments};

fn name_separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    // Whitespace (incl. ideographic space via \s), ASCII and
    // full-width comma/semicolon, ideographic comma.
    SEPARATORS.get_or_init(|| {
        Regex::new(r"[\s,;、，；]+").expect("separator pattern is a valid regex")
    })
}

/// Split raw free-text name input into unique, trimmed tokens.
/// Order of first appearance is preserved; empty tokens are dropped.
pub fn split_names(raw: &str) -> Vec<String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();
    for token in name_separators().split(raw) {
        if token.is_empty() || !seen.insert(token) {
            continue;
        }
        out.push(token.to_string());
    }
    out
}

#[derive(Debug)]
pub struct Session {
    events: BTreeMap<NaiveDate, Vec<String>>,
    mode: MergeMode,
    format: DisplayFormat,
    overrides: BTreeMap<DatesKey, MergeMode>,
    highlight: Option<String>,
    holidays: Box<dyn HolidayProvider>,
}

impl Session {
    pub fn new(
        mode: MergeMode,
        format: DisplayFormat,
        holidays: Box<dyn HolidayProvider>,
    ) -> Self {
        Self {
            events: BTreeMap::new(),
            mode,
            format,
            overrides: BTreeMap::new(),
            highlight: None,
            holidays,
        }
    }

    pub fn events(&self) -> &BTreeMap<NaiveDate, Vec<String>> {
        &self.events
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    pub fn format(&self) -> DisplayFormat {
        self.format
    }

    pub fn holidays(&self) -> &dyn HolidayProvider {
        self.holidays.as_ref()
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    /// Select a date; an empty event appears if it was not selected.
    #[tracing::instrument(skip(self), fields(date = %date))]
    pub fn select_date(&mut self, date: NaiveDate) {
        self.events.entry(date).or_default();
    }

    /// Remove a date and its names. Unconditional once invoked; the
    /// destructive-action confirmation is the caller's gate. Returns
    /// whether the date was selected.
    #[tracing::instrument(skip(self), fields(date = %date))]
    pub fn deselect_date(&mut self, date: NaiveDate) -> bool {
        let removed = self.events.remove(&date);
        if let Some(names) = &removed {
            info!(count = names.len(), "deselected date");
        }
        removed.is_some()
    }

    /// Tokenize `raw` and add the names to `date`, selecting the date
    /// if needed. Already-present names and empty input are no-ops.
    /// Returns how many names were actually added.
    #[tracing::instrument(skip(self, raw), fields(date = %date))]
    pub fn add_names(&mut self, date: NaiveDate, raw: &str) -> usize {
        let tokens = split_names(raw);
        if tokens.is_empty() {
            debug!("no names in input, nothing recorded");
            return 0;
        }

        let entry = self.events.entry(date).or_default();
        let mut added = 0;
        for token in tokens {
            if !entry.contains(&token) {
                entry.push(token);
                added += 1;
            }
        }
        debug!(added, total = entry.len(), "added names");
        added
    }

    /// Remove one name from a date. Removing the last name leaves an
    /// empty event; only deselection deletes the date itself. Returns
    /// false when the date or name was absent.
    #[tracing::instrument(skip(self), fields(date = %date, name = %name))]
    pub fn remove_name(&mut self, date: NaiveDate, name: &str) -> bool {
        let Some(names) = self.events.get_mut(&date) else {
            return false;
        };
        let before = names.len();
        names.retain(|n| n != name);
        before != names.len()
    }

    #[tracing::instrument(skip(self))]
    pub fn set_mode(&mut self, mode: MergeMode) {
        self.mode = mode;
    }

    #[tracing::instrument(skip(self))]
    pub fn set_format(&mut self, format: DisplayFormat) {
        self.format = format;
    }

    /// Per-group merge-mode override; display only, `day_count` is
    /// never touched.
    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub fn set_override(&mut self, key: DatesKey, mode: MergeMode) {
        self.overrides.insert(key, mode);
    }

    #[tracing::instrument(skip(self, key), fields(key = %key))]
    pub fn clear_override(&mut self, key: &DatesKey) -> bool {
        self.overrides.remove(key).is_some()
    }

    pub fn override_for(&self, key: &DatesKey) -> Option<MergeMode> {
        self.overrides.get(key).copied()
    }

    pub fn set_highlight(&mut self, name: Option<String>) {
        self.highlight = name;
    }

    /// The highlighted participant's date set; empty when nothing is
    /// highlighted or the name is unknown.
    pub fn highlighted_dates(&self) -> BTreeSet<NaiveDate> {
        let Some(name) = self.highlight.as_deref() else {
            return BTreeSet::new();
        };
        self.events
            .iter()
            .filter(|(_, names)| names.iter().any(|n| n == name))
            .map(|(&date, _)| date)
            .collect()
    }

    /// Drop everything: events, overrides, highlight.
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self) {
        info!(events = self.events.len(), "resetting session");
        self.events.clear();
        self.overrides.clear();
        self.highlight = None;
    }

    /// One row per participant, under the global merge mode.
    pub fn report(&self) -> Vec<ReportRow> {
        build_report(&self.events, self.mode, self.format, self.holidays.as_ref())
    }

    /// The report reduced to rowspan groups.
    pub fn grouped_report(&self) -> Vec<RowGroup> {
        group_rows(&self.report())
    }

    /// The period string for a group, honoring its override if one is
    /// set, otherwise the global mode.
    pub fn period_for_group(&self, key: &DatesKey) -> String {
        let mode = self.override_for(key).unwrap_or(self.mode);
        let segments = build_segments(key.dates(), mode, self.holidays.as_ref());
        format_segments(&segments, self.format)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Session, split_names};
    use crate::dates::DisplayFormat;
    use crate::holiday::HolidayTable;
    use crate::segment::MergeMode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn session() -> Session {
        Session::new(
            MergeMode::Keep,
            DisplayFormat::YearDotted,
            Box::new(HolidayTable::new("none", [])),
        )
    }

    #[test]
    fn splits_on_mixed_separators() {
        assert_eq!(split_names("Kim, Lee  Park"), vec!["Kim", "Lee", "Park"]);
        assert_eq!(split_names("Kim;Lee"), vec!["Kim", "Lee"]);
        assert_eq!(split_names("김，이；박、최"), vec!["김", "이", "박", "최"]);
        assert_eq!(split_names("Kim\u{3000}Lee"), vec!["Kim", "Lee"]);
    }

    #[test]
    fn split_drops_empties_and_duplicates() {
        assert!(split_names("").is_empty());
        assert!(split_names("  ,, ;; ").is_empty());
        assert_eq!(split_names("Kim, Kim,Kim"), vec!["Kim"]);
        // Case-sensitive: these are two participants.
        assert_eq!(split_names("kim Kim"), vec!["kim", "Kim"]);
    }

    #[test]
    fn add_names_selects_the_date_and_dedupes() {
        let mut s = session();
        assert_eq!(s.add_names(date(2024, 1, 1), "Kim, Lee  Park"), 3);
        assert_eq!(s.add_names(date(2024, 1, 1), "Kim"), 0);
        assert_eq!(
            s.events().get(&date(2024, 1, 1)).map(Vec::len),
            Some(3)
        );
    }

    #[test]
    fn empty_input_records_nothing() {
        let mut s = session();
        assert_eq!(s.add_names(date(2024, 1, 1), "  , ; "), 0);
        // Nothing recorded: the date was not even selected.
        assert!(!s.events().contains_key(&date(2024, 1, 1)));
        assert!(s.report().is_empty());
    }

    #[test]
    fn removing_last_name_keeps_the_event() {
        let mut s = session();
        s.add_names(date(2024, 1, 1), "Kim");
        assert!(s.remove_name(date(2024, 1, 1), "Kim"));
        assert!(s.events().contains_key(&date(2024, 1, 1)));
        assert_eq!(s.events().get(&date(2024, 1, 1)).map(Vec::len), Some(0));
    }

    #[test]
    fn removing_absent_name_is_a_noop() {
        let mut s = session();
        s.add_names(date(2024, 1, 1), "Kim");
        assert!(!s.remove_name(date(2024, 1, 1), "Lee"));
        assert!(!s.remove_name(date(2024, 1, 2), "Kim"));
        assert_eq!(s.events().get(&date(2024, 1, 1)).map(Vec::len), Some(1));
    }

    #[test]
    fn deselect_deletes_unconditionally() {
        let mut s = session();
        s.add_names(date(2024, 1, 1), "Kim Lee");
        assert!(s.deselect_date(date(2024, 1, 1)));
        assert!(!s.deselect_date(date(2024, 1, 1)));
        assert!(s.events().is_empty());
    }

    #[test]
    fn override_changes_period_not_day_count() {
        let mut s = session();
        s.add_names(date(2024, 1, 1), "Kim");
        s.add_names(date(2024, 1, 2), "Kim");
        s.add_names(date(2024, 1, 5), "Kim");

        let groups = s.grouped_report();
        assert_eq!(groups.len(), 1);
        let key = groups[0].dates_key.clone();
        assert_eq!(s.period_for_group(&key), "2024.01.01~2024.01.02, 2024.01.05");

        s.set_override(key.clone(), MergeMode::All);
        assert_eq!(s.period_for_group(&key), "2024.01.01~2024.01.05");

        // Day count is untouched by the override.
        let groups = s.grouped_report();
        assert_eq!(groups[0].day_count, 3);

        assert!(s.clear_override(&key));
        assert!(!s.clear_override(&key));
        assert_eq!(s.period_for_group(&key), "2024.01.01~2024.01.02, 2024.01.05");
    }

    #[test]
    fn highlight_reflects_current_events() {
        let mut s = session();
        s.add_names(date(2024, 1, 1), "Kim Lee");
        s.add_names(date(2024, 1, 3), "Kim");

        s.set_highlight(Some("Kim".to_string()));
        let dates: Vec<NaiveDate> = s.highlighted_dates().into_iter().collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 3)]);

        s.set_highlight(Some("Nobody".to_string()));
        assert!(s.highlighted_dates().is_empty());

        s.set_highlight(None);
        assert!(s.highlighted_dates().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = session();
        s.add_names(date(2024, 1, 1), "Kim");
        let key = s.grouped_report()[0].dates_key.clone();
        s.set_override(key.clone(), MergeMode::All);
        s.set_highlight(Some("Kim".to_string()));

        s.reset();
        assert!(s.events().is_empty());
        assert!(s.report().is_empty());
        assert!(s.override_for(&key).is_none());
        assert!(s.highlight().is_none());
    }
}
