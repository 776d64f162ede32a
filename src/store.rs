//! Site store operations and utility functions.
//!
//! This module provides the `SiteStore` struct, the in-memory snapshot of a
//! site's tasks and reports that the metrics layer reads from, along with the
//! date parsing, formatting and table helpers shared by the CLI and TUI.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::fields::{ReportKind, TaskStatus};
use crate::report::{DailyReport, Report, Timestamped, WeeklyReport};
use crate::task::Task;

/// In-memory snapshot of one site's tasks and reports.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStore {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, alias = "daily_reports")]
    pub daily_reports: Vec<DailyReport>,
    #[serde(default, alias = "weekly_reports")]
    pub weekly_reports: Vec<WeeklyReport>,
}

/// Counts of records added or replaced by `SiteStore::merge`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub replaced: usize,
}

impl MergeStats {
    fn record(&mut self, replaced: bool) {
        if replaced {
            self.replaced += 1;
        } else {
            self.added += 1;
        }
    }
}

impl SiteStore {
    /// Load a store from a JSON file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            log::debug!("store {} does not exist yet, starting empty", path.display());
            return Ok(SiteStore::default());
        }
        let buf = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store: SiteStore = serde_json::from_str(&buf).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!(
            "loaded {}: {} tasks, {} daily reports, {} weekly reports",
            path.display(),
            store.tasks.len(),
            store.daily_reports.len(),
            store.weekly_reports.len()
        );
        Ok(store)
    }

    /// Load a store, falling back to an empty one if the file is unreadable.
    ///
    /// For read-only views only: a corrupt file is logged and shown as empty.
    /// Never save the result, or the file on disk is replaced.
    pub fn load_or_default(path: &Path) -> Self {
        match SiteStore::load(path) {
            Ok(store) => store,
            Err(e) => {
                log::warn!("{e}; starting with an empty store");
                SiteStore::default()
            }
        }
    }

    /// Save the store to a JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let data = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(data.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        log::debug!("saved {}", path.display());
        Ok(())
    }

    /// Generate the next available task ID, or `None` once IDs are exhausted.
    pub fn next_task_id(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0).checked_add(1)
    }

    /// Generate the next available report ID for the given collection.
    pub fn next_report_id(&self, kind: ReportKind) -> Option<u64> {
        let max = match kind {
            ReportKind::Daily => self.daily_reports.iter().map(|r| r.id).max(),
            ReportKind::Weekly => self.weekly_reports.iter().map(|r| r.id).max(),
        };
        max.unwrap_or(0).checked_add(1)
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_task_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Set a task's status to the canonical string for `status`.
    /// Returns false when no task has that ID.
    pub fn set_task_status(&mut self, id: u64, status: TaskStatus) -> bool {
        match self.get_task_mut(id) {
            Some(task) => {
                task.status = status.as_str().to_string();
                true
            }
            None => false,
        }
    }

    /// Remove tasks by IDs, returning how many were removed.
    pub fn remove_tasks(&mut self, ids: &HashSet<u64>) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !ids.contains(&t.id));
        before - self.tasks.len()
    }

    /// Merge a snapshot (e.g. a backend export) into this store.
    ///
    /// Records whose ID already exists are replaced in place; the rest are
    /// appended in snapshot order.
    pub fn merge(&mut self, other: SiteStore) -> MergeStats {
        let mut stats = MergeStats::default();
        for task in other.tasks {
            stats.record(upsert(&mut self.tasks, task, |t| t.id));
        }
        for report in other.daily_reports {
            stats.record(upsert(&mut self.daily_reports, report, |r| r.id));
        }
        for report in other.weekly_reports {
            stats.record(upsert(&mut self.weekly_reports, report, |r| r.id));
        }
        stats
    }

    /// Both report collections as one list, newest first.
    /// Reports with an unparseable timestamp sort last.
    pub fn reports(&self) -> Vec<Report> {
        let mut all: Vec<Report> = self
            .daily_reports
            .iter()
            .cloned()
            .map(Report::Daily)
            .chain(self.weekly_reports.iter().cloned().map(Report::Weekly))
            .collect();
        all.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        all
    }
}

/// Replace the element with the same key, or push. Returns true on replace.
fn upsert<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> K) -> bool {
    let k = key(&item);
    match items.iter().position(|existing| key(existing) == k) {
        Some(idx) => {
            items[idx] = item;
            true
        }
        None => {
            items.push(item);
            false
        }
    }
}

/// Parse a backend date or timestamp string into UTC.
///
/// Accepts RFC 3339 (`2024-03-15T08:30:00Z`, with or without fraction or
/// offset), naive date-times (treated as UTC) and bare `YYYY-MM-DD` dates
/// (midnight UTC). Anything else yields `None`.
pub fn parse_date_lenient(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Parse human-friendly date input from the command line.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_date_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {}d", delta)
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Format a raw task status for display.
/// Unrecognised values are shown as-is so bad data stays visible.
pub fn format_status(raw: &str) -> String {
    match TaskStatus::parse(raw) {
        Some(TaskStatus::Pending) => "Pending".into(),
        Some(TaskStatus::InProgress) => "In Progress".into(),
        Some(TaskStatus::Completed) => "Completed".into(),
        None => format!("?{}", raw.trim()),
    }
}

/// Print tasks in a formatted table.
pub fn print_task_table(tasks: &[&Task], today: NaiveDate) {
    println!(
        "{:<5} {:<12} {:<12} {:<11} {:<10} {}",
        "ID", "Status", "Project", "Due", "Assignee", "Name"
    );
    for t in tasks {
        println!(
            "{:<5} {:<12} {:<12} {:<11} {:<10} {}",
            t.id,
            truncate(&format_status(&t.status), 12),
            truncate(&t.project_id, 12),
            format_due_relative(t.due(), today),
            truncate(t.assigned_to_id.as_deref().unwrap_or("-"), 10),
            t.name
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_lenient_formats() {
        let midnight = ymd(2024, 3, 15).and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert_eq!(parse_date_lenient("2024-03-15"), Some(midnight));
        assert_eq!(parse_date_lenient("2024-03-15T00:00:00.000Z"), Some(midnight));
        assert_eq!(parse_date_lenient("2024-03-15T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_date_lenient("2024-03-15T00:00:00"), Some(midnight));
        assert_eq!(parse_date_lenient("  2024-03-15 "), Some(midnight));
        assert_eq!(parse_date_lenient("15/03/2024"), None);
        assert_eq!(parse_date_lenient(""), None);
    }

    #[test]
    fn test_parse_date_input() {
        let today = ymd(2024, 6, 10);
        assert_eq!(parse_date_input("today", today), Some(today));
        assert_eq!(parse_date_input("Tomorrow", today), Some(ymd(2024, 6, 11)));
        assert_eq!(parse_date_input("in 3d", today), Some(ymd(2024, 6, 13)));
        assert_eq!(parse_date_input("in 2w", today), Some(ymd(2024, 6, 24)));
        assert_eq!(parse_date_input("2024-12-01", today), Some(ymd(2024, 12, 1)));
        assert_eq!(parse_date_input("someday", today), None);
    }

    #[test]
    fn test_format_due_relative() {
        let today = ymd(2024, 6, 10);
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(format_due_relative(Some(ymd(2024, 6, 11)), today), "tomorrow");
        assert_eq!(format_due_relative(Some(ymd(2024, 6, 15)), today), "in 5d");
        assert_eq!(format_due_relative(Some(ymd(2024, 6, 8)), today), "2d late");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("much longer text", 6), "much …");
    }

    #[test]
    fn test_merge_replaces_and_appends() {
        let mut store = SiteStore::default();
        store.tasks.push(Task::new(1, "Excavation", "p1"));
        store.tasks.push(Task::new(2, "Piling", "p1"));

        let mut snapshot = SiteStore::default();
        snapshot.tasks.push(Task::new(2, "Piling", "p1").with_status("completed"));
        snapshot.tasks.push(Task::new(3, "Pile caps", "p1"));
        snapshot.weekly_reports.push(WeeklyReport::new(1, "2024-05-06", 10.0, 9.0));

        let stats = store.merge(snapshot);
        assert_eq!(stats, MergeStats { added: 2, replaced: 1 });
        assert_eq!(store.tasks.len(), 3);
        assert_eq!(store.get_task(2).unwrap().status, "completed");
        assert_eq!(store.weekly_reports.len(), 1);
    }

    #[test]
    fn test_bad_field_keeps_rest_of_store() {
        let dir = std::env::temp_dir().join(format!("sitedash-badfield-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("yard_site.json");
        fs::write(
            &path,
            r#"{
              "tasks": [
                {"id": 1, "name": "A", "projectId": "p", "status": "pending"},
                {"id": 2, "name": "B", "projectId": "p", "status": null}
              ],
              "weeklyReports": [
                {"id": 1, "createdAt": "2024-05-03T12:00:00Z", "plannedProgress": null, "actualProgress": 12}
              ]
            }"#,
        )
        .unwrap();

        let mut store = SiteStore::load(&path).unwrap();
        assert_eq!(store.tasks.len(), 2);
        assert_eq!(store.weekly_reports[0].planned_progress.value(), 0.0);
        assert_eq!(store.weekly_reports[0].actual_progress.value(), 12.0);

        let id = store.next_task_id().unwrap();
        store.tasks.push(Task::new(id, "C", "p"));
        store.save(&path).unwrap();
        let names: Vec<String> = SiteStore::load(&path).unwrap().tasks.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_ids_exhausted_at_max() {
        let mut store = SiteStore::default();
        store.tasks.push(Task::new(u64::MAX, "Imported", "p"));
        store.weekly_reports.push(WeeklyReport::new(u64::MAX, "2024-05-03", 10.0, 9.0));
        assert_eq!(store.next_task_id(), None);
        assert_eq!(store.next_report_id(ReportKind::Weekly), None);
        assert_eq!(store.next_report_id(ReportKind::Daily), Some(1));
    }

    #[test]
    fn test_remove_and_ids() {
        let mut store = SiteStore::default();
        assert_eq!(store.next_task_id(), Some(1));
        store.tasks.push(Task::new(4, "Scaffold", "p"));
        store.tasks.push(Task::new(9, "Rebar", "p"));
        assert_eq!(store.next_task_id(), Some(10));
        assert_eq!(store.next_report_id(ReportKind::Daily), Some(1));

        let removed = store.remove_tasks(&HashSet::from([4, 42]));
        assert_eq!(removed, 1);
        assert!(store.get_task(4).is_none());
        assert!(store.set_task_status(9, TaskStatus::Completed));
        assert!(!store.set_task_status(4, TaskStatus::Completed));
        assert_eq!(store.get_task(9).unwrap().status, "completed");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("sitedash-store-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tower_site.json");

        let mut store = SiteStore::default();
        store.tasks.push(Task::new(1, "Survey", "tower").with_due("2024-07-01"));
        store.daily_reports.push(DailyReport::new(1, "2024-06-30T17:00:00Z"));
        store.save(&path).unwrap();

        let loaded = SiteStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = std::env::temp_dir().join(format!("sitedash-corrupt-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("missing_site.json");
        assert_eq!(SiteStore::load(&missing).unwrap(), SiteStore::default());

        let corrupt = dir.join("corrupt_site.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert!(matches!(SiteStore::load(&corrupt), Err(StoreError::Parse { .. })));
        assert_eq!(SiteStore::load_or_default(&corrupt), SiteStore::default());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_reports_newest_first() {
        let mut store = SiteStore::default();
        store.daily_reports.push(DailyReport::new(1, "2024-05-01"));
        store.daily_reports.push(DailyReport::new(2, "garbage"));
        store.weekly_reports.push(WeeklyReport::new(1, "2024-05-07", 5.0, 4.0));
        let ids: Vec<(ReportKind, u64)> = store.reports().iter().map(|r| (r.kind(), r.id())).collect();
        assert_eq!(
            ids,
            vec![(ReportKind::Weekly, 1), (ReportKind::Daily, 1), (ReportKind::Daily, 2)]
        );
    }
}
