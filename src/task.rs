//! Task data structure and related functionality.
//!
//! A `Task` is a unit of site work tracked against a project. Status and dates
//! are kept exactly as the backend delivered them, and are interpreted on
//! demand so that a malformed value never prevents a store from loading.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::TaskStatus;
use crate::lenient;
use crate::store::parse_date_lenient;

/// A unit of work on a construction site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, alias = "project_id", deserialize_with = "lenient::string")]
    pub project_id: String,
    #[serde(default, alias = "assigned_to_id", deserialize_with = "lenient::opt_string")]
    pub assigned_to_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, alias = "start_date", deserialize_with = "lenient::opt_string")]
    pub start_date: Option<String>,
    #[serde(default, alias = "due_date", deserialize_with = "lenient::opt_string")]
    pub due_date: Option<String>,
}

impl Task {
    pub fn new(id: u64, name: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            project_id: project_id.into(),
            assigned_to_id: None,
            status: TaskStatus::Pending.as_str().to_string(),
            start_date: None,
            due_date: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_due(mut self, due: impl Into<String>) -> Self {
        self.due_date = Some(due.into());
        self
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to_id = Some(assignee.into());
        self
    }

    /// Recognised status, or `None` when the raw string is outside the vocabulary.
    pub fn parsed_status(&self) -> Option<TaskStatus> {
        TaskStatus::parse(&self.status)
    }

    /// Due date as a calendar day, if present and parseable.
    pub fn due(&self) -> Option<NaiveDate> {
        self.due_date
            .as_deref()
            .and_then(parse_date_lenient)
            .map(|dt| dt.date_naive())
    }

    /// Start date as a calendar day, if present and parseable.
    pub fn start(&self) -> Option<NaiveDate> {
        self.start_date
            .as_deref()
            .and_then(parse_date_lenient)
            .map(|dt| dt.date_naive())
    }
}
