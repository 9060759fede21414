//! Groups report rows that share an identical attendance set so the
//! rendering layer can merge them visually. The group size is the
//! renderer's rowspan count; the core only hands back the mapping.

use std::collections::BTreeMap;

use crate::report::{DatesKey, ReportRow};

/// Rows sharing the same (`dates_key`, `day_count`) pair. This is a
/// display relation, not participant identity: two people who attended
/// the exact same dates land in one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowGroup {
    pub dates_key: DatesKey,
    pub day_count: usize,
    /// The period string under the global merge mode. A per-group
    /// override replaces this at render time, never `day_count`.
    pub periods: String,
    /// Member names, sorted; same collation as the report rows.
    pub names: Vec<String>,
}

impl RowGroup {
    /// Rowspan for the rendering layer.
    pub fn span(&self) -> usize {
        self.names.len()
    }
}

/// Reduce report rows into ordered groups.
///
/// Group order follows the first member of each group after name
/// sorting, so the grouped view lines up with the name-sorted report
/// regardless of insertion order.
pub fn group_rows(rows: &[ReportRow]) -> Vec<RowGroup> {
    let mut groups: BTreeMap<(DatesKey, usize), RowGroup> = BTreeMap::new();

    for row in rows {
        groups
            .entry((row.dates_key.clone(), row.day_count))
            .or_insert_with(|| RowGroup {
                dates_key: row.dates_key.clone(),
                day_count: row.day_count,
                periods: row.periods.clone(),
                names: Vec::new(),
            })
            .names
            .push(row.name.clone());
    }

    let mut out: Vec<RowGroup> = groups.into_values().collect();
    for group in &mut out {
        group.names.sort();
    }
    out.sort_by(|a, b| a.names.first().cmp(&b.names.first()));
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::group_rows;
    use crate::dates::DisplayFormat;
    use crate::holiday::HolidayTable;
    use crate::report::build_report;
    use crate::segment::MergeMode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn report_for(
        entries: &[((i32, u32, u32), &[&str])],
    ) -> Vec<crate::report::ReportRow> {
        let events: BTreeMap<NaiveDate, Vec<String>> = entries
            .iter()
            .map(|&((y, m, d), names)| {
                (date(y, m, d), names.iter().map(ToString::to_string).collect())
            })
            .collect();
        build_report(
            &events,
            MergeMode::Keep,
            DisplayFormat::YearDotted,
            &HolidayTable::new("none", []),
        )
    }

    #[test]
    fn identical_date_sets_share_a_group() {
        let rows = report_for(&[
            ((2024, 1, 1), &["Kim", "Lee"]),
            ((2024, 1, 2), &["Lee", "Kim"]),
            ((2024, 1, 3), &["Park"]),
        ]);

        let groups = group_rows(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].names, vec!["Kim", "Lee"]);
        assert_eq!(groups[0].span(), 2);
        assert_eq!(groups[1].names, vec!["Park"]);
    }

    #[test]
    fn one_differing_date_breaks_the_group() {
        let rows = report_for(&[
            ((2024, 1, 1), &["Kim", "Lee"]),
            ((2024, 1, 2), &["Kim"]),
        ]);

        let groups = group_rows(&rows);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.span() == 1));
    }

    #[test]
    fn grouping_ignores_insertion_order() {
        let forward = report_for(&[
            ((2024, 1, 1), &["Kim", "Lee"]),
            ((2024, 1, 2), &["Kim", "Lee"]),
        ]);
        let reversed = report_for(&[
            ((2024, 1, 1), &["Lee", "Kim"]),
            ((2024, 1, 2), &["Lee", "Kim"]),
        ]);

        assert_eq!(group_rows(&forward), group_rows(&reversed));
    }

    #[test]
    fn empty_report_groups_to_nothing() {
        assert!(group_rows(&[]).is_empty());
    }
}
