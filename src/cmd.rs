//! Command implementations for the CLI interface.
//!
//! This module contains the subcommand definitions and their handlers: task
//! and report collaborators that mutate the site store, the metric reports
//! printed from it, and site management.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::fields::*;
use crate::metrics::{
    filter_monthly_reports, generate_weekly_progress_series_with, is_overdue, summarize,
};
use crate::report::{DailyReport, ProgressValue, Report, WeeklyReport};
use crate::site::{create_site, discover_sites};
use crate::store::*;
use crate::task::Task;
use crate::tui::run::run_dashboard;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the dashboard interface.
    Ui,

    /// Print task counts, on-schedule percentage and this month's submissions.
    Stats {
        /// Evaluate as of this date (YYYY-MM-DD or RFC 3339) instead of now.
        #[arg(long)]
        now: Option<String>,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the weekly planned-vs-actual progress series.
    Weekly {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List reports submitted in a calendar month.
    Monthly {
        /// Month number 1-12 (default: current month).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Year (default: current year).
        #[arg(long)]
        year: Option<i32>,
    },

    /// Add a new task.
    Add {
        /// Task name.
        name: String,
        /// Project identifier.
        #[arg(long)]
        project: String,
        /// Assigned user identifier.
        #[arg(long)]
        assignee: Option<String>,
        /// Initial status.
        #[arg(long, value_enum, default_value_t = TaskStatus::Pending)]
        status: TaskStatus,
        /// Start date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        start: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks with optional filters.
    List {
        /// Only tasks with this status.
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        /// Only tasks for this project.
        #[arg(long)]
        project: Option<String>,
        /// Only in-progress tasks past their due date.
        #[arg(long)]
        overdue: bool,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Id)]
        sort: SortKey,
        /// Show at most this many tasks.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Change a task's status.
    Status {
        /// Task ID.
        id: u64,
        /// New status.
        #[arg(value_enum)]
        status: TaskStatus,
    },

    /// Edit task fields.
    Update {
        /// Task ID.
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        /// Remove the assignee.
        #[arg(long, conflicts_with = "assignee")]
        clear_assignee: bool,
    },

    /// Delete one or more tasks.
    Delete {
        /// Task IDs.
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Upload a daily or weekly progress report.
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// List uploaded reports, newest first.
    Reports {
        /// Only this kind of report.
        #[arg(long, value_enum)]
        kind: Option<ReportKind>,
        /// Show at most this many reports.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Merge a JSON snapshot (tasks, dailyReports, weeklyReports) into the store.
    Import {
        /// Input JSON file path.
        input: String,
    },

    /// List site stores in the data directory.
    Sites,

    /// Create a new site store.
    NewSite {
        /// Site display name.
        name: String,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ReportAction {
    /// Daily progress report.
    Daily {
        /// Report date (default: today).
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        weather: Option<String>,
        /// Workers on site.
        #[arg(long)]
        manpower: Option<u32>,
        #[arg(long)]
        work_done: Option<String>,
        /// Description of any safety incident.
        #[arg(long)]
        safety_incident: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },
    /// Weekly progress report.
    Weekly {
        /// Planned progress (percent).
        #[arg(long)]
        planned: String,
        /// Actual progress (percent).
        #[arg(long)]
        actual: String,
        #[arg(long)]
        week_start: Option<String>,
        #[arg(long)]
        week_end: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
    },
}

/// Load a store that is about to be modified, exiting if it can't be read.
///
/// Falling back to an empty store here would overwrite the file on save.
pub fn load_for_edit_or_exit(db_path: &Path) -> SiteStore {
    SiteStore::load(db_path).unwrap_or_else(|e| {
        eprintln!("{e}");
        eprintln!("Refusing to modify {}; fix or move the file first.", db_path.display());
        std::process::exit(1);
    })
}

fn id_or_exit(id: Option<u64>, what: &str) -> u64 {
    id.unwrap_or_else(|| {
        eprintln!("No {what} IDs left: the store already holds ID {}.", u64::MAX);
        std::process::exit(1);
    })
}

fn save_or_exit(store: &SiteStore, db_path: &Path) {
    if let Err(e) = store.save(db_path) {
        eprintln!("Failed to save store: {e}");
        std::process::exit(1);
    }
}

/// Parse a date argument, exiting with a message when it is not understood.
fn date_arg_or_exit(raw: &str, today: NaiveDate) -> String {
    match parse_date_input(raw, today) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => {
            eprintln!("Unrecognised date '{raw}'. Use YYYY-MM-DD, today, tomorrow or in Nd.");
            std::process::exit(1);
        }
    }
}

/// Resolve the evaluation time for metric commands.
fn resolve_now(now: Option<String>) -> DateTime<Utc> {
    match now {
        None => Utc::now(),
        Some(raw) => parse_date_lenient(&raw).unwrap_or_else(|| {
            eprintln!("Unrecognised --now value '{raw}'. Use YYYY-MM-DD or RFC 3339.");
            std::process::exit(1);
        }),
    }
}

/// Launch the dashboard interface.
pub fn cmd_ui(db_path: &Path, fallback: WeeklyFallback) {
    if let Err(e) = run_dashboard(db_path, fallback) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Print the dashboard summary.
pub fn cmd_stats(store: &SiteStore, now: Option<String>, json: bool, fallback: WeeklyFallback) {
    let now = resolve_now(now);
    let summary = summarize(store, now, fallback);

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Failed to serialise summary: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let c = summary.counts;
    println!("Tasks            {}", summary.total_tasks);
    println!("  Pending        {}", c.pending_tasks);
    println!("  In progress    {}", c.active_tasks);
    println!("  Completed      {}", c.completed_tasks);
    let unrecognised = summary.total_tasks - c.recognised();
    if unrecognised > 0 {
        println!("  Unrecognised   {}", unrecognised);
    }
    println!("  Overdue        {}", summary.overdue_tasks);
    println!("On schedule      {}%", summary.on_schedule_percentage);
    println!("This month ({})", now.format("%B %Y"));
    println!("  Daily reports  {}", summary.daily_reports_this_month);
    println!("  Weekly reports {}", summary.weekly_reports_this_month);
    println!("  Safety events  {}", summary.safety_incidents_this_month);
}

/// Print the weekly planned-vs-actual series.
pub fn cmd_weekly(store: &SiteStore, json: bool, fallback: WeeklyFallback) {
    let series = generate_weekly_progress_series_with(&store.weekly_reports, fallback);

    if json {
        match serde_json::to_string_pretty(&series) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Failed to serialise series: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if series.is_empty() {
        println!("No weekly reports.");
        return;
    }
    if store.weekly_reports.is_empty() {
        println!("No weekly reports yet; showing the placeholder ramp.");
    }
    println!("{:<8} {:>8} {:>8} {:>8}", "Week", "Planned", "Actual", "Delta");
    for p in &series {
        println!(
            "{:<8} {:>8.1} {:>8.1} {:>+8.1}",
            p.week,
            p.planned,
            p.actual,
            p.actual - p.planned
        );
    }
}

/// List reports submitted in a given month.
pub fn cmd_monthly(store: &SiteStore, month: Option<u32>, year: Option<i32>) {
    let today = Local::now().date_naive();
    // CLI months are 1-based; the metrics layer takes 0-based.
    let month0 = month.map(|m| m - 1).unwrap_or_else(|| today.month0());
    let year = year.unwrap_or_else(|| today.year());

    let daily = filter_monthly_reports(&store.daily_reports, month0, year);
    let weekly = filter_monthly_reports(&store.weekly_reports, month0, year);

    println!("{}-{:02}: {} daily, {} weekly", year, month0 + 1, daily.len(), weekly.len());
    for r in daily {
        println!(
            "  DPR {:<4} {:<25} {}",
            r.id,
            r.created_at,
            r.weather.as_deref().unwrap_or("-")
        );
    }
    for r in weekly {
        println!(
            "  WPR {:<4} {:<25} planned {:.1} / actual {:.1}",
            r.id,
            r.created_at,
            r.planned_progress.value(),
            r.actual_progress.value()
        );
    }
}

/// Add a new task to the store.
pub fn cmd_add(
    store: &mut SiteStore,
    db_path: &Path,
    name: String,
    project: String,
    assignee: Option<String>,
    status: TaskStatus,
    start: Option<String>,
    due: Option<String>,
) {
    let project = project.trim().to_string();
    if project.is_empty() {
        eprintln!("Project cannot be empty.");
        std::process::exit(1);
    }

    let today = Local::now().date_naive();
    let id = id_or_exit(store.next_task_id(), "task");
    let mut task = Task::new(id, name, project).with_status(status.as_str());
    if let Some(a) = assignee.filter(|a| !a.trim().is_empty()) {
        task = task.with_assignee(a.trim());
    }
    if let Some(s) = start {
        task = task.with_start(date_arg_or_exit(&s, today));
    }
    if let Some(d) = due {
        task = task.with_due(date_arg_or_exit(&d, today));
    }

    store.tasks.push(task);
    save_or_exit(store, db_path);
    log::info!("added task {id}");
    println!("Added task {}", id);
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(
    store: &SiteStore,
    status: Option<TaskStatus>,
    project: Option<String>,
    overdue: bool,
    sort: SortKey,
    limit: Option<usize>,
) {
    let now = Utc::now();
    let mut filtered: Vec<&Task> = store
        .tasks
        .iter()
        .filter(|t| status.is_none() || t.parsed_status() == status)
        .filter(|t| project.as_deref().map_or(true, |p| t.project_id == p))
        .filter(|t| !overdue || is_overdue(t, now))
        .collect();

    match sort {
        SortKey::Due => filtered.sort_by_key(|t| (t.due().unwrap_or(NaiveDate::MAX), t.id)),
        SortKey::Id => filtered.sort_by_key(|t| t.id),
        SortKey::Name => filtered.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
    }
    if let Some(n) = limit {
        filtered.truncate(n);
    }

    if filtered.is_empty() {
        println!("No tasks.");
        return;
    }
    print_task_table(&filtered, now.date_naive());
}

/// Change a task's status.
pub fn cmd_status(store: &mut SiteStore, db_path: &Path, id: u64, status: TaskStatus) {
    if !store.set_task_status(id, status) {
        eprintln!("Task with ID {} not found", id);
        std::process::exit(1);
    }
    save_or_exit(store, db_path);
    println!("Task {} is now {}.", id, format_status(status.as_str()));
}

/// Edit task fields.
pub fn cmd_update(
    store: &mut SiteStore,
    db_path: &Path,
    id: u64,
    name: Option<String>,
    project: Option<String>,
    assignee: Option<String>,
    start: Option<String>,
    due: Option<String>,
    clear_due: bool,
    clear_assignee: bool,
) {
    let today = Local::now().date_naive();
    let start = start.map(|s| date_arg_or_exit(&s, today));
    let due = due.map(|d| date_arg_or_exit(&d, today));

    let Some(task) = store.get_task_mut(id) else {
        eprintln!("Task with ID {} not found", id);
        std::process::exit(1);
    };
    if let Some(n) = name {
        task.name = n;
    }
    if let Some(p) = project.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
        task.project_id = p;
    }
    if let Some(a) = assignee {
        task.assigned_to_id = Some(a);
    }
    if clear_assignee {
        task.assigned_to_id = None;
    }
    if start.is_some() {
        task.start_date = start;
    }
    if due.is_some() {
        task.due_date = due;
    }
    if clear_due {
        task.due_date = None;
    }

    save_or_exit(store, db_path);
    println!("Updated task {}", id);
}

/// Delete tasks by ID.
pub fn cmd_delete(store: &mut SiteStore, db_path: &Path, ids: Vec<u64>) {
    let ids: HashSet<u64> = ids.into_iter().collect();
    let removed = store.remove_tasks(&ids);
    if removed == 0 {
        eprintln!("No matching tasks.");
        std::process::exit(1);
    }
    save_or_exit(store, db_path);
    println!("Deleted {} task(s).", removed);
}

/// Upload a report. Reports are immutable once stored.
pub fn cmd_report(store: &mut SiteStore, db_path: &Path, action: ReportAction) {
    let now = Utc::now();
    let created_at = now.to_rfc3339();

    let label = match action {
        ReportAction::Daily { date, weather, manpower, work_done, safety_incident, remarks } => {
            let date = date_arg_or_exit(date.as_deref().unwrap_or("today"), Local::now().date_naive());
            let id = id_or_exit(store.next_report_id(ReportKind::Daily), "daily report");
            let mut report = DailyReport::new(id, created_at);
            report.date = Some(date);
            report.weather = weather;
            report.manpower = manpower;
            report.work_done = work_done;
            report.safety_incident = safety_incident;
            report.remarks = remarks;
            store.daily_reports.push(report);
            format!("daily report {}", id)
        }
        ReportAction::Weekly { planned, actual, week_start, week_end, summary, remarks } => {
            let id = id_or_exit(store.next_report_id(ReportKind::Weekly), "weekly report");
            let planned = ProgressValue::Text(planned);
            let actual = ProgressValue::Text(actual);
            if planned.value() == 0.0 || actual.value() == 0.0 {
                log::warn!("weekly report {id} has a zero or non-numeric progress figure");
            }
            let mut report = WeeklyReport::new(id, created_at, planned, actual);
            report.week_start = week_start;
            report.week_end = week_end;
            report.summary = summary;
            report.remarks = remarks;
            store.weekly_reports.push(report);
            format!("weekly report {}", id)
        }
    };

    save_or_exit(store, db_path);
    println!("Uploaded {}", label);
}

/// List reports, newest first.
pub fn cmd_reports(store: &SiteStore, kind: Option<ReportKind>, limit: Option<usize>) {
    let reports: Vec<Report> = store
        .reports()
        .into_iter()
        .filter(|r| kind.map_or(true, |k| r.kind() == k))
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if reports.is_empty() {
        println!("No reports.");
        return;
    }

    println!("{:<4} {:<5} {:<26} {}", "Kind", "ID", "Created", "Details");
    for r in &reports {
        let details = match r {
            Report::Daily(d) => {
                let incident = if d.has_safety_incident() { " [SAFETY]" } else { "" };
                format!(
                    "{} | {} workers | {}{}",
                    d.weather.as_deref().unwrap_or("-"),
                    d.manpower.map(|m| m.to_string()).unwrap_or_else(|| "-".into()),
                    truncate(d.work_done.as_deref().unwrap_or("-"), 40),
                    incident
                )
            }
            Report::Weekly(w) => format!(
                "planned {:.1} / actual {:.1}",
                w.planned_progress.value(),
                w.actual_progress.value()
            ),
        };
        let kind = match r.kind() {
            ReportKind::Daily => "DPR",
            ReportKind::Weekly => "WPR",
        };
        println!("{:<4} {:<5} {:<26} {}", kind, r.id(), truncate(r.raw_created_at(), 26), details);
    }
}

/// Merge a JSON snapshot into the store.
pub fn cmd_import(store: &mut SiteStore, db_path: &Path, input: String) {
    let input = Path::new(&input);
    if !input.exists() {
        eprintln!("Snapshot file not found: {}", input.display());
        std::process::exit(1);
    }
    let snapshot = match SiteStore::load(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read snapshot: {e}");
            std::process::exit(1);
        }
    };

    let stats = store.merge(snapshot);
    save_or_exit(store, db_path);
    println!("Imported: {} added, {} replaced.", stats.added, stats.replaced);
}

/// List site stores with their task counts.
pub fn cmd_sites(data_dir: &Path) {
    let sites = discover_sites(data_dir).unwrap_or_else(|e| {
        eprintln!("Failed to discover sites: {}", e);
        std::process::exit(1);
    });
    if sites.is_empty() {
        println!("No sites in {}.", data_dir.display());
        return;
    }
    println!("{:<24} {:>6} {:>8}", "Site", "Tasks", "Reports");
    for site in sites {
        match site.load_store() {
            Ok(store) => println!(
                "{:<24} {:>6} {:>8}",
                truncate(&site.display_name, 24),
                store.tasks.len(),
                store.daily_reports.len() + store.weekly_reports.len()
            ),
            Err(e) => {
                log::warn!("{e}");
                println!("{:<24} {:>6} {:>8}", truncate(&site.display_name, 24), "?", "?");
            }
        }
    }
}

/// Create a new site store.
pub fn cmd_new_site(data_dir: &Path, name: &str) {
    if let Err(e) = fs::create_dir_all(data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }
    match create_site(name, data_dir) {
        Ok(site) => println!("Created site '{}' at {}", site.display_name, site.file_path.display()),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

