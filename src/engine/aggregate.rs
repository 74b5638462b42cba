use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{UtilizationEntry, ValueSchema};

/// How a calendar date maps to the label of the week it belongs to. Both
/// labels are derived from the ISO week start (Monday) of the entry's date,
/// so every date in the same calendar week yields the same label.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeekPolicy {
    /// The week's start date formatted as `DD/MM`.
    IsoWeekStart,
    /// A `Week of DD/MM` label around the same start date.
    WeekOf,
}

/// Whether weekly totals in percentage deployments are clamped to [0, 100].
/// Clipping applies to the summed total only, never to individual entries:
/// a user logging more than 100% in a week is truncated in reports, not
/// rejected at entry time.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClipPolicy {
    None,
    ClipSum,
}

/// The grouping key for a summary row. The per-user dashboard breaks totals
/// down by project; the team view collapses projects and keeps only the
/// user/week pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    UserProjectWeek,
    UserWeek,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub group_by: GroupBy,
    pub week_policy: WeekPolicy,
    pub clip_policy: ClipPolicy,
}

/// Optional filters applied to the snapshot before aggregation. Each field
/// that is set must match; an empty filter keeps everything.
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub user: Option<String>,
    pub project: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &UtilizationEntry) -> bool {
        if let Some(user) = &self.user {
            if &entry.user != user {
                return false;
            }
        }
        if let Some(project) = &self.project {
            if &entry.project != project {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.week_ending < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.week_ending > to {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, entries: &[UtilizationEntry]) -> Vec<UtilizationEntry> {
        entries
            .iter()
            .filter(|entry| self.matches(entry))
            .cloned()
            .collect()
    }
}

/// One aggregated row: the total value logged by a user (optionally per
/// project) in one calendar week. Derived on every render, never persisted.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WeeklySummary {
    pub user: String,
    /// None when the grouping collapses projects (`GroupBy::UserWeek`).
    pub project: Option<String>,
    pub week_start: NaiveDate,
    pub week_label: String,
    pub total: f64,
}

impl WeeklySummary {
    /// The total expressed as a percentage of available time. Hours totals
    /// are scaled against the weekly capacity; percentage totals pass through.
    pub fn utilization_percent(&self, schema: &ValueSchema) -> f64 {
        match schema {
            ValueSchema::Hours { weekly_capacity } => self.total / weekly_capacity * 100.0,
            ValueSchema::Percentage => self.total,
        }
    }
}

/// Start of the ISO week (Monday) containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

pub fn week_label(date: NaiveDate, policy: WeekPolicy) -> String {
    let start = week_start(date);
    match policy {
        WeekPolicy::IsoWeekStart => start.format("%d/%m").to_string(),
        WeekPolicy::WeekOf => format!("Week of {}", start.format("%d/%m")),
    }
}

/// Collapses entries into per-week totals. Output rows are sorted ascending
/// by (user, project, week start), so a fixed input always yields the same
/// sequence regardless of entry order. Empty input yields an empty result.
pub fn aggregate(entries: &[UtilizationEntry], options: &AggregateOptions) -> Vec<WeeklySummary> {
    let mut groups: BTreeMap<(String, Option<String>, NaiveDate), f64> = BTreeMap::new();

    for entry in entries {
        let project = match options.group_by {
            GroupBy::UserProjectWeek => Some(entry.project.clone()),
            GroupBy::UserWeek => None,
        };
        let key = (entry.user.clone(), project, week_start(entry.week_ending));
        *groups.entry(key).or_insert(0.0) += entry.value.amount();
    }

    groups
        .into_iter()
        .map(|((user, project, start), mut total)| {
            if options.clip_policy == ClipPolicy::ClipSum {
                total = total.clamp(0.0, 100.0);
            }
            WeeklySummary {
                user,
                project,
                week_start: start,
                week_label: week_label(start, options.week_policy),
                total,
            }
        })
        .collect()
}

/// Mean utilization percentage per week across all summary rows, in
/// chronological order. This is the series the admin view charts and the
/// forecast extrapolates from.
pub fn team_average_series(
    summaries: &[WeeklySummary],
    schema: &ValueSchema,
) -> Vec<(NaiveDate, f64)> {
    let mut weeks: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();

    for summary in summaries {
        let slot = weeks.entry(summary.week_start).or_insert((0.0, 0));
        slot.0 += summary.utilization_percent(schema);
        slot.1 += 1;
    }

    weeks
        .into_iter()
        .map(|(week, (sum, count))| (week, sum / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryValue;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(user: &str, project: &str, week_ending: NaiveDate, value: EntryValue) -> UtilizationEntry {
        UtilizationEntry {
            id: Uuid::new_v4(),
            user: user.to_string(),
            project: project.to_string(),
            description: None,
            week_ending,
            value,
            submitted_at: Utc::now(),
        }
    }

    fn options(group_by: GroupBy, clip_policy: ClipPolicy) -> AggregateOptions {
        AggregateOptions {
            group_by,
            week_policy: WeekPolicy::IsoWeekStart,
            clip_policy,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let summaries = aggregate(&[], &options(GroupBy::UserProjectWeek, ClipPolicy::None));
        assert!(summaries.is_empty());
    }

    #[test]
    fn single_entry_total_equals_value() {
        let entries = vec![entry("alex", "apollo", date(2024, 1, 12), EntryValue::Hours(32.0))];
        let summaries = aggregate(&entries, &options(GroupBy::UserProjectWeek, ClipPolicy::None));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].user, "alex");
        assert_eq!(summaries[0].project.as_deref(), Some("apollo"));
        assert_eq!(summaries[0].total, 32.0);
        // 2024-01-12 is a Friday; its ISO week starts Monday the 8th.
        assert_eq!(summaries[0].week_start, date(2024, 1, 8));
        assert_eq!(summaries[0].week_label, "08/01");
    }

    #[test]
    fn entries_in_same_week_merge_into_one_row() {
        let entries = vec![
            entry("alex", "apollo", date(2024, 1, 9), EntryValue::Hours(10.0)),
            entry("alex", "apollo", date(2024, 1, 12), EntryValue::Hours(5.5)),
            entry("alex", "apollo", date(2024, 1, 14), EntryValue::Hours(4.5)),
        ];
        let summaries = aggregate(&entries, &options(GroupBy::UserProjectWeek, ClipPolicy::None));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total, 20.0);
    }

    #[test]
    fn entries_in_different_weeks_stay_separate() {
        let entries = vec![
            entry("alex", "apollo", date(2024, 1, 12), EntryValue::Hours(10.0)),
            entry("alex", "apollo", date(2024, 1, 15), EntryValue::Hours(8.0)),
        ];
        let summaries = aggregate(&entries, &options(GroupBy::UserProjectWeek, ClipPolicy::None));
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].week_start, date(2024, 1, 8));
        assert_eq!(summaries[1].week_start, date(2024, 1, 15));
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut entries = vec![
            entry("jamie", "borealis", date(2024, 2, 6), EntryValue::Hours(12.0)),
            entry("alex", "apollo", date(2024, 2, 8), EntryValue::Hours(20.0)),
            entry("alex", "borealis", date(2024, 2, 7), EntryValue::Hours(6.0)),
            entry("alex", "apollo", date(2024, 2, 9), EntryValue::Hours(4.0)),
        ];
        let opts = options(GroupBy::UserProjectWeek, ClipPolicy::None);
        let forward = aggregate(&entries, &opts);
        entries.reverse();
        let backward = aggregate(&entries, &opts);
        assert_eq!(forward, backward);
    }

    #[test]
    fn aggregation_conserves_total_value() {
        let entries = vec![
            entry("jamie", "borealis", date(2024, 2, 6), EntryValue::Hours(12.0)),
            entry("alex", "apollo", date(2024, 2, 8), EntryValue::Hours(20.0)),
            entry("alex", "apollo", date(2024, 2, 19), EntryValue::Hours(7.5)),
        ];
        let summaries = aggregate(&entries, &options(GroupBy::UserProjectWeek, ClipPolicy::None));
        let summary_total: f64 = summaries.iter().map(|s| s.total).sum();
        let entry_total: f64 = entries.iter().map(|e| e.value.amount()).sum();
        assert_eq!(summary_total, entry_total);
    }

    #[test]
    fn aggregation_is_idempotent_on_a_snapshot() {
        let entries = vec![
            entry("alex", "apollo", date(2024, 2, 8), EntryValue::Hours(20.0)),
            entry("jamie", "borealis", date(2024, 2, 6), EntryValue::Hours(12.0)),
        ];
        let opts = options(GroupBy::UserProjectWeek, ClipPolicy::None);
        assert_eq!(aggregate(&entries, &opts), aggregate(&entries, &opts));
    }

    #[test]
    fn clip_sum_clamps_weekly_total_not_entries() {
        let entries = vec![
            entry("alex", "apollo", date(2024, 3, 4), EntryValue::Percentage(60.0)),
            entry("alex", "apollo", date(2024, 3, 6), EntryValue::Percentage(70.0)),
        ];
        let clipped = aggregate(&entries, &options(GroupBy::UserProjectWeek, ClipPolicy::ClipSum));
        assert_eq!(clipped[0].total, 100.0);

        let unclipped = aggregate(&entries, &options(GroupBy::UserProjectWeek, ClipPolicy::None));
        assert_eq!(unclipped[0].total, 130.0);
    }

    #[test]
    fn user_week_grouping_collapses_projects() {
        let entries = vec![
            entry("alex", "apollo", date(2024, 2, 6), EntryValue::Percentage(40.0)),
            entry("alex", "borealis", date(2024, 2, 8), EntryValue::Percentage(35.0)),
        ];
        let summaries = aggregate(&entries, &options(GroupBy::UserWeek, ClipPolicy::None));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].project, None);
        assert_eq!(summaries[0].total, 75.0);
    }

    #[test]
    fn week_labels_are_deterministic_within_a_week() {
        // Monday through Sunday of the same ISO week.
        let monday = date(2024, 1, 8);
        let sunday = date(2024, 1, 14);
        assert_eq!(
            week_label(monday, WeekPolicy::IsoWeekStart),
            week_label(sunday, WeekPolicy::IsoWeekStart)
        );
        assert_eq!(week_label(monday, WeekPolicy::IsoWeekStart), "08/01");
        assert_eq!(week_label(sunday, WeekPolicy::WeekOf), "Week of 08/01");
    }

    #[test]
    fn filter_is_applied_per_field() {
        let entries = vec![
            entry("alex", "apollo", date(2024, 2, 6), EntryValue::Hours(8.0)),
            entry("jamie", "apollo", date(2024, 2, 7), EntryValue::Hours(6.0)),
            entry("alex", "borealis", date(2024, 3, 5), EntryValue::Hours(4.0)),
        ];

        let by_user = EntryFilter {
            user: Some("alex".to_string()),
            ..Default::default()
        };
        assert_eq!(by_user.apply(&entries).len(), 2);

        let by_range = EntryFilter {
            from: Some(date(2024, 3, 1)),
            to: Some(date(2024, 3, 31)),
            ..Default::default()
        };
        let in_range = by_range.apply(&entries);
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].project, "borealis");
    }

    #[test]
    fn team_average_is_the_mean_over_summary_rows() {
        let entries = vec![
            entry("alex", "apollo", date(2024, 2, 6), EntryValue::Hours(40.0)),
            entry("jamie", "borealis", date(2024, 2, 7), EntryValue::Hours(20.0)),
        ];
        let summaries = aggregate(&entries, &options(GroupBy::UserProjectWeek, ClipPolicy::None));
        let schema = ValueSchema::Hours { weekly_capacity: 40.0 };
        let series = team_average_series(&summaries, &schema);
        assert_eq!(series.len(), 1);
        // 100% and 50% of capacity average to 75%.
        assert_eq!(series[0].1, 75.0);
    }
}
