//! # sitedash - construction-site progress dashboard
//!
//! Tracks the tasks and progress reports of construction sites and derives the
//! figures a site dashboard shows: pending / active / completed task counts,
//! the share of tasks on schedule, the weekly planned-vs-actual series and
//! monthly report submissions.
//!
//! ## Layout
//!
//! - [`task`], [`report`]: the records, as the backend delivers them.
//! - [`store`]: a site's snapshot of tasks and reports, persisted as JSON.
//! - [`metrics`]: pure functions from a snapshot (and an injected clock) to
//!   dashboard figures. They never fail; bad data degrades to defaults.
//! - [`site`]: discovery of per-site store files in the data directory.
//! - [`cmd`], [`cli`]: the `sitedash` command line.
//! - [`tui`]: the terminal dashboard.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use site_dashboard::metrics::{calculate_on_schedule_percentage, compute_task_counts};
//! use site_dashboard::task::Task;
//!
//! let tasks = vec![
//!     Task::new(1, "Pour slab", "tower").with_status("completed"),
//!     Task::new(2, "Erect formwork", "tower").with_status("In Progress").with_due("2999-01-01"),
//!     Task::new(3, "Cure slab", "tower"),
//! ];
//! let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
//! assert_eq!(compute_task_counts(&tasks).pending_tasks, 1);
//! assert_eq!(calculate_on_schedule_percentage(&tasks, now), 67);
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod lenient;
pub mod metrics;
pub mod report;
pub mod site;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod run;
    pub mod utils;
}
