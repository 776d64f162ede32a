//! Progress and schedule metrics.
//!
//! Pure functions that turn a snapshot of tasks and reports into the figures
//! the dashboard shows. Nothing here performs I/O or reads the clock: the
//! current time is always passed in. Every function is total; malformed
//! statuses, dates or progress values degrade to "not counted" or 0.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::fields::{TaskStatus, WeeklyFallback};
use crate::report::{Timestamped, WeeklyReport};
use crate::store::{parse_date_lenient, SiteStore};
use crate::task::Task;

/// Number of weekly reports shown in the planned-vs-actual series.
pub const WEEKLY_WINDOW: usize = 4;

/// Synthetic (planned, actual) ramp shown when there are no weekly reports.
const FALLBACK_RAMP: [(f64, f64); WEEKLY_WINDOW] =
    [(20.0, 15.0), (40.0, 35.0), (60.0, 55.0), (80.0, 75.0)];

/// Task totals per recognised status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub pending_tasks: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
}

impl TaskCounts {
    /// Sum of the three buckets; never more than the number of tasks counted.
    pub fn recognised(&self) -> usize {
        self.pending_tasks + self.active_tasks + self.completed_tasks
    }
}

/// One point of the weekly planned-vs-actual series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub planned: f64,
    pub actual: f64,
}

/// Everything the overview screen needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub counts: TaskCounts,
    pub total_tasks: usize,
    pub on_schedule_percentage: u8,
    pub overdue_tasks: usize,
    pub weekly_series: Vec<WeeklyPoint>,
    pub daily_reports_this_month: usize,
    pub weekly_reports_this_month: usize,
    pub safety_incidents_this_month: usize,
}

/// Count tasks whose status is exactly `pending`, `in_progress` or `completed`.
///
/// Unlike the on-schedule rule there is no case or synonym folding here:
/// `"Completed"` or `"done"` falls in no bucket.
pub fn compute_task_counts(tasks: &[Task]) -> TaskCounts {
    let mut counts = TaskCounts::default();
    for task in tasks {
        match TaskStatus::from_canonical(&task.status) {
            Some(TaskStatus::Pending) => counts.pending_tasks += 1,
            Some(TaskStatus::InProgress) => counts.active_tasks += 1,
            Some(TaskStatus::Completed) => counts.completed_tasks += 1,
            None => log::trace!("task {} has unrecognised status {:?}", task.id, task.status),
        }
    }
    counts
}

/// Whether a single task is on schedule at `now`.
///
/// Completed tasks always are. In-progress tasks are when their due date is
/// strictly after `now`; a missing or malformed due date means they are not.
pub fn is_on_schedule(task: &Task, now: DateTime<Utc>) -> bool {
    match task.parsed_status() {
        Some(TaskStatus::Completed) => true,
        Some(TaskStatus::InProgress) => task
            .due_date
            .as_deref()
            .and_then(parse_date_lenient)
            .is_some_and(|due| due > now),
        _ => false,
    }
}

/// Whether a task is in progress with a due date at or before `now`.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    task.parsed_status() == Some(TaskStatus::InProgress)
        && task
            .due_date
            .as_deref()
            .and_then(parse_date_lenient)
            .is_some_and(|due| due <= now)
}

/// Percentage of tasks on schedule, rounded half-up, in `0..=100`.
///
/// An empty task list is vacuously on schedule and yields 100.
pub fn calculate_on_schedule_percentage(tasks: &[Task], now: DateTime<Utc>) -> u8 {
    if tasks.is_empty() {
        return 100;
    }
    let total = tasks.len();
    let on_schedule = tasks.iter().filter(|t| is_on_schedule(t, now)).count();
    // round(on/total * 100) half-up, in integers: floor((200 * on + total) / (2 * total))
    let pct = (200 * on_schedule + total) / (2 * total);
    pct.min(100) as u8
}

/// Planned-vs-actual series from the most recent weekly reports.
///
/// Takes the `WEEKLY_WINDOW` most recently created reports, oldest first,
/// labelled "Week 1".. by position. With no reports the synthetic ramp is
/// returned.
pub fn generate_weekly_progress_series(weekly_reports: &[WeeklyReport]) -> Vec<WeeklyPoint> {
    generate_weekly_progress_series_with(weekly_reports, WeeklyFallback::Ramp)
}

/// As `generate_weekly_progress_series`, with an explicit policy for empty input.
pub fn generate_weekly_progress_series_with(
    weekly_reports: &[WeeklyReport],
    fallback: WeeklyFallback,
) -> Vec<WeeklyPoint> {
    if weekly_reports.is_empty() {
        log::debug!("no weekly reports, using {:?} fallback", fallback);
        return match fallback {
            WeeklyFallback::Ramp => FALLBACK_RAMP
                .iter()
                .enumerate()
                .map(|(i, &(planned, actual))| WeeklyPoint {
                    week: week_label(i),
                    planned,
                    actual,
                })
                .collect(),
            WeeklyFallback::Empty => Vec::new(),
        };
    }

    // Stable sort keeps input order among equal or unparseable timestamps,
    // which sort as oldest.
    let mut ordered: Vec<&WeeklyReport> = weekly_reports.iter().collect();
    ordered.sort_by_key(|r| r.created_at());
    let start = ordered.len().saturating_sub(WEEKLY_WINDOW);

    ordered[start..]
        .iter()
        .enumerate()
        .map(|(i, r)| WeeklyPoint {
            week: week_label(i),
            planned: r.planned_progress.value(),
            actual: r.actual_progress.value(),
        })
        .collect()
}

fn week_label(index: usize) -> String {
    format!("Week {}", index + 1)
}

/// Reports created within the given 0-based `month` of `year` (UTC).
///
/// Reports with a missing or malformed timestamp are excluded, as is
/// everything when `month` is out of range.
pub fn filter_monthly_reports<T: Timestamped>(reports: &[T], month: u32, year: i32) -> Vec<&T> {
    if month > 11 {
        return Vec::new();
    }
    reports
        .iter()
        .filter(|r| {
            r.created_at()
                .is_some_and(|ts| ts.year() == year && ts.month0() == month)
        })
        .collect()
}

/// Compute the full overview for a store snapshot at `now`.
pub fn summarize(store: &SiteStore, now: DateTime<Utc>, fallback: WeeklyFallback) -> DashboardSummary {
    let (month, year) = (now.month0(), now.year());
    let daily_this_month = filter_monthly_reports(&store.daily_reports, month, year);

    DashboardSummary {
        counts: compute_task_counts(&store.tasks),
        total_tasks: store.tasks.len(),
        on_schedule_percentage: calculate_on_schedule_percentage(&store.tasks, now),
        overdue_tasks: store.tasks.iter().filter(|t| is_overdue(t, now)).count(),
        weekly_series: generate_weekly_progress_series_with(&store.weekly_reports, fallback),
        daily_reports_this_month: daily_this_month.len(),
        weekly_reports_this_month: filter_monthly_reports(&store.weekly_reports, month, year).len(),
        safety_incidents_this_month: daily_this_month
            .iter()
            .filter(|r| r.has_safety_incident())
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::DailyReport;

    fn at(s: &str) -> DateTime<Utc> {
        parse_date_lenient(s).unwrap()
    }

    fn task(id: u64, status: &str, due: &str) -> Task {
        Task::new(id, format!("task {id}"), "site").with_status(status).with_due(due)
    }

    #[test]
    fn test_counts_mixed_statuses() {
        let tasks = vec![
            task(1, "completed", "2024-01-01"),
            task(2, "in_progress", "2999-01-01"),
            task(3, "pending", "2024-01-01"),
            task(4, "Completed", "2024-01-01"),
            task(5, "on hold", "2024-01-01"),
            task(6, "done", "2024-01-01"),
            task(7, "In Progress", "2999-01-01"),
        ];
        let counts = compute_task_counts(&tasks);
        assert_eq!(
            counts,
            TaskCounts { pending_tasks: 1, active_tasks: 1, completed_tasks: 1 }
        );
        assert_eq!(counts.recognised(), 3);
        assert!(counts.recognised() < tasks.len());
        // the on-schedule rule still folds case and synonyms
        assert_eq!(calculate_on_schedule_percentage(&tasks, at("2025-01-01")), 71);
    }

    #[test]
    fn test_counts_empty() {
        assert_eq!(compute_task_counts(&[]), TaskCounts::default());
    }

    #[test]
    fn test_on_schedule_reference_scenario() {
        let tasks = vec![
            task(1, "completed", "2024-01-01"),
            task(2, "in_progress", "2999-01-01"),
            task(3, "pending", "2024-01-01"),
        ];
        let now = at("2025-01-01");
        assert_eq!(
            compute_task_counts(&tasks),
            TaskCounts { pending_tasks: 1, active_tasks: 1, completed_tasks: 1 }
        );
        assert_eq!(calculate_on_schedule_percentage(&tasks, now), 67);
    }

    #[test]
    fn test_on_schedule_empty_is_100() {
        assert_eq!(calculate_on_schedule_percentage(&[], at("2025-01-01")), 100);
        assert_eq!(calculate_on_schedule_percentage(&[], at("1970-01-01")), 100);
    }

    #[test]
    fn test_on_schedule_mixed_case_in_progress() {
        let now = at("2025-01-01");
        let a = [task(1, "In Progress", "2025-06-01")];
        let b = [task(1, "in_progress", "2025-06-01")];
        let c = [task(1, "in-progress", "2025-06-01")];
        assert_eq!(calculate_on_schedule_percentage(&a, now), 100);
        assert_eq!(calculate_on_schedule_percentage(&a, now), calculate_on_schedule_percentage(&b, now));
        assert_eq!(calculate_on_schedule_percentage(&c, now), 100);
    }

    #[test]
    fn test_on_schedule_due_must_be_strictly_after_now() {
        let now = at("2025-01-01T00:00:00Z");
        assert!(!is_on_schedule(&task(1, "in_progress", "2025-01-01"), now));
        assert!(is_on_schedule(&task(1, "in_progress", "2025-01-01T00:00:01Z"), now));
        assert!(is_overdue(&task(1, "in_progress", "2025-01-01"), now));
    }

    #[test]
    fn test_on_schedule_bad_due_dates_degrade() {
        let now = at("2025-01-01");
        let mut missing = task(1, "in_progress", "x");
        missing.due_date = None;
        let tasks = vec![missing, task(2, "in_progress", "not a date"), task(3, "done", "not a date")];
        // only the completed task counts: round(1/3 * 100) = 33
        assert_eq!(calculate_on_schedule_percentage(&tasks, now), 33);
        assert!(!is_overdue(&tasks[1], now));
    }

    #[test]
    fn test_on_schedule_rounds_half_up() {
        let now = at("2025-01-01");
        // 1 of 8 = 12.5% -> 13
        let mut tasks = vec![task(1, "completed", "2024-01-01")];
        tasks.extend((2..=8).map(|i| task(i, "pending", "2024-01-01")));
        assert_eq!(calculate_on_schedule_percentage(&tasks, now), 13);
        // 1 of 6 = 16.67% -> 17
        tasks.truncate(6);
        assert_eq!(calculate_on_schedule_percentage(&tasks, now), 17);
        // 1 of 200 = 0.5% -> 1
        let mut many = vec![task(1, "completed", "2024-01-01")];
        many.extend((2..=200).map(|i| task(i, "pending", "2024-01-01")));
        assert_eq!(calculate_on_schedule_percentage(&many, now), 1);
    }

    #[test]
    fn test_on_schedule_monotonic_in_due_date() {
        let now = at("2025-01-01");
        let mut prev = 0;
        for due in ["2024-06-01", "2024-12-31", "2025-01-02", "2026-01-01"] {
            let tasks = vec![task(1, "in_progress", due), task(2, "pending", "2024-01-01")];
            let pct = calculate_on_schedule_percentage(&tasks, now);
            assert!(pct >= prev, "{pct} < {prev} for due {due}");
            prev = pct;
        }
        assert_eq!(prev, 50);
    }

    #[test]
    fn test_weekly_series_empty_uses_ramp() {
        let series = generate_weekly_progress_series(&[]);
        assert_eq!(series.len(), 4);
        let planned: Vec<f64> = series.iter().map(|p| p.planned).collect();
        let actual: Vec<f64> = series.iter().map(|p| p.actual).collect();
        let labels: Vec<&str> = series.iter().map(|p| p.week.as_str()).collect();
        assert_eq!(planned, vec![20.0, 40.0, 60.0, 80.0]);
        assert_eq!(actual, vec![15.0, 35.0, 55.0, 75.0]);
        assert_eq!(labels, vec!["Week 1", "Week 2", "Week 3", "Week 4"]);
    }

    #[test]
    fn test_weekly_series_empty_fallback_policy() {
        assert!(generate_weekly_progress_series_with(&[], WeeklyFallback::Empty).is_empty());
    }

    #[test]
    fn test_weekly_series_takes_latest_four_oldest_first() {
        // Deliberately out of creation order.
        let reports = vec![
            WeeklyReport::new(3, "2024-05-20", 30.0, 28.0),
            WeeklyReport::new(1, "2024-05-06", 10.0, 9.0),
            WeeklyReport::new(6, "2024-06-10", 60.0, "57"),
            WeeklyReport::new(2, "2024-05-13", 20.0, 18.0),
            WeeklyReport::new(5, "2024-06-03", "fifty", 49.0),
            WeeklyReport::new(4, "2024-05-27", 40.0, 39.0),
        ];
        let series = generate_weekly_progress_series(&reports);
        assert_eq!(
            series,
            vec![
                WeeklyPoint { week: "Week 1".into(), planned: 30.0, actual: 28.0 },
                WeeklyPoint { week: "Week 2".into(), planned: 40.0, actual: 39.0 },
                WeeklyPoint { week: "Week 3".into(), planned: 0.0, actual: 49.0 },
                WeeklyPoint { week: "Week 4".into(), planned: 60.0, actual: 57.0 },
            ]
        );
    }

    #[test]
    fn test_weekly_series_fewer_than_window() {
        let reports = vec![
            WeeklyReport::new(2, "2024-05-13T10:00:00Z", 20.0, 18.0),
            WeeklyReport::new(1, "2024-05-06T10:00:00Z", 10.0, 9.0),
        ];
        let series = generate_weekly_progress_series(&reports);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].planned, 10.0);
        assert_eq!(series[1].week, "Week 2");
    }

    #[test]
    fn test_weekly_series_unparseable_timestamps_are_oldest() {
        let reports = vec![
            WeeklyReport::new(1, "2024-05-06", 10.0, 9.0),
            WeeklyReport::new(2, "??", 99.0, 99.0),
            WeeklyReport::new(3, "2024-05-13", 20.0, 19.0),
            WeeklyReport::new(4, "2024-05-20", 30.0, 29.0),
            WeeklyReport::new(5, "2024-05-27", 40.0, 39.0),
        ];
        let planned: Vec<f64> = generate_weekly_progress_series(&reports)
            .iter()
            .map(|p| p.planned)
            .collect();
        assert_eq!(planned, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_filter_monthly_reports() {
        let reports = vec![
            DailyReport::new(1, "2024-02-01T00:00:00Z"),
            DailyReport::new(2, "2024-02-29T23:59:59Z"),
            DailyReport::new(3, "2024-03-01T00:00:00Z"),
            DailyReport::new(4, "2023-02-15"),
            DailyReport::new(5, "garbage"),
        ];
        let ids: Vec<u64> = filter_monthly_reports(&reports, 1, 2024).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(filter_monthly_reports(&reports, 6, 2024).is_empty());
        assert!(filter_monthly_reports(&reports, 12, 2024).is_empty());
    }

    #[test]
    fn test_filter_monthly_reports_all_match() {
        let reports = vec![
            WeeklyReport::new(1, "2024-11-04", 1.0, 1.0),
            WeeklyReport::new(2, "2024-11-11", 2.0, 2.0),
            WeeklyReport::new(3, "2024-11-30T18:00:00Z", 3.0, 3.0),
        ];
        assert_eq!(filter_monthly_reports(&reports, 10, 2024).len(), reports.len());
    }

    #[test]
    fn test_summarize() {
        let mut store = SiteStore::default();
        store.tasks = vec![
            task(1, "completed", "2024-05-01"),
            task(2, "in_progress", "2024-05-01"),
            task(3, "in_progress", "2024-07-01"),
            task(4, "pending", "2024-08-01"),
        ];
        let mut incident = DailyReport::new(2, "2024-06-12T16:00:00Z");
        incident.safety_incident = Some("Fall from ladder, no injury".into());
        store.daily_reports = vec![
            DailyReport::new(1, "2024-06-11T16:00:00Z"),
            incident,
            DailyReport::new(3, "2024-05-31T16:00:00Z"),
        ];
        store.weekly_reports = vec![WeeklyReport::new(1, "2024-06-07", 30.0, 25.0)];

        let summary = summarize(&store, at("2024-06-15T12:00:00Z"), WeeklyFallback::Ramp);
        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.counts.active_tasks, 2);
        assert_eq!(summary.on_schedule_percentage, 50);
        assert_eq!(summary.overdue_tasks, 1);
        assert_eq!(summary.weekly_series.len(), 1);
        assert_eq!(summary.daily_reports_this_month, 2);
        assert_eq!(summary.weekly_reports_this_month, 1);
        assert_eq!(summary.safety_incidents_this_month, 1);
    }
}
