//! Enumerations and field types for site records.
//!
//! This module defines the structured vocabulary used across the dashboard:
//! the task status set (with tolerant parsing of backend variants), report
//! kinds, the weekly-series fallback policy and CLI sort keys.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Recognised task status.
///
/// Task records keep their status as the raw string the backend sent; this
/// enum is what that string means once normalised.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Interpret a raw status string.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `-` and spaces
    /// as `_`, so `"In Progress"`, `"in-progress"` and `"in_progress"` are the
    /// same status. Returns `None` for anything outside the synonym sets.
    pub fn parse(raw: &str) -> Option<TaskStatus> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect();
        match key.as_str() {
            "pending" | "not_started" => Some(TaskStatus::Pending),
            "in_progress" | "inprogress" | "active" | "ongoing" => Some(TaskStatus::InProgress),
            "completed" | "complete" | "done" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    /// Match only the exact canonical string, with no normalisation.
    pub fn from_canonical(raw: &str) -> Option<TaskStatus> {
        [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed]
            .into_iter()
            .find(|s| s.as_str() == raw)
    }

    /// Canonical wire string written back to the store.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Which report collection a record belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Daily,
    Weekly,
}

/// What the weekly planned-vs-actual series shows when no weekly reports exist.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WeeklyFallback {
    /// Four synthetic points ramping 20/15 .. 80/75.
    #[default]
    Ramp,
    /// No points at all.
    Empty,
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Due,
    Id,
    Name,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_statuses() {
        assert_eq!(TaskStatus::parse("pending"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("completed"), Some(TaskStatus::Completed));
    }

    #[test]
    fn test_parse_tolerates_casing_and_separators() {
        assert_eq!(TaskStatus::parse("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("  IN_PROGRESS "), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("Completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("Done"), Some(TaskStatus::Completed));
    }

    #[test]
    fn test_from_canonical_is_exact() {
        assert_eq!(TaskStatus::from_canonical("in_progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_canonical("completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::from_canonical("Completed"), None);
        assert_eq!(TaskStatus::from_canonical("done"), None);
        assert_eq!(TaskStatus::from_canonical(" pending"), None);
    }

    #[test]
    fn test_parse_unknown_status() {
        assert_eq!(TaskStatus::parse("blocked"), None);
        assert_eq!(TaskStatus::parse(""), None);
        assert_eq!(TaskStatus::parse("in progress later"), None);
    }

    #[test]
    fn test_as_str_round_trips_through_parse() {
        for s in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::parse(s.as_str()), Some(s));
        }
    }
}
