//! Main application logic for the dashboard interface.
//!
//! This module contains the `DashboardApp` struct which holds the loaded site
//! store, recomputes the dashboard figures after every change, handles key
//! input, and renders the Overview, Tasks and Reports tabs.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table,
        TableState, Tabs, Wrap,
    },
    Frame, Terminal,
};

use crate::fields::{TaskStatus, WeeklyFallback};
use crate::metrics::{is_overdue, summarize, DashboardSummary};
use crate::report::Report;
use crate::site::Site;
use crate::store::{format_due_relative, format_status, SiteStore};
use crate::task::Task;
use crate::tui::{
    colors::{schedule_color, status_color, ACTUAL_GREEN, ALERT_RED, PLANNED_BLUE, SITE_ORANGE},
    enums::{ReportView, Tab, TaskFilter, TaskView, ViewState},
    utils::centered_rect,
};

/// Status a task moves to when cycled from the dashboard.
fn next_status(current: Option<TaskStatus>) -> TaskStatus {
    match current {
        Some(TaskStatus::Pending) => TaskStatus::InProgress,
        Some(TaskStatus::InProgress) => TaskStatus::Completed,
        Some(TaskStatus::Completed) | None => TaskStatus::Pending,
    }
}

/// Move a table selection by `delta`, clamped to `len` rows.
fn move_selection(state: &mut TableState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1);
    state.select(Some(next as usize));
}

/// Keep a selection inside `len` rows after the underlying list changed.
fn clamp_selection(state: &mut TableState, len: usize) {
    match (state.selected(), len) {
        (_, 0) => state.select(None),
        (None, _) => state.select(Some(0)),
        (Some(i), n) if i >= n => state.select(Some(n - 1)),
        _ => {}
    }
}

/// Dashboard state for one site store.
pub struct DashboardApp {
    store: SiteStore,
    db_path: PathBuf,
    site_name: String,
    fallback: WeeklyFallback,
    summary: DashboardSummary,
    reports: Vec<Report>,
    view: ViewState,
    filter: TaskFilter,
    task_table: TableState,
    report_table: TableState,
    status_message: String,
    /// Set when the store file could not be read; edits are refused until a
    /// reload succeeds so the file on disk is never overwritten.
    load_error: Option<String>,
}

/// Load the store for display, keeping the error so edits can be refused.
fn load_for_view(db_path: &Path) -> (SiteStore, Option<String>) {
    match SiteStore::load(db_path) {
        Ok(store) => (store, None),
        Err(e) => {
            log::warn!("{e}; showing an empty, read-only dashboard");
            (SiteStore::default(), Some(e.to_string()))
        }
    }
}

impl DashboardApp {
    /// Create the app, loading the store at `db_path`.
    pub fn new(db_path: &Path, fallback: WeeklyFallback) -> Self {
        let (store, load_error) = load_for_view(db_path);
        let site_name = Site::from_file(db_path.to_path_buf())
            .map(|s| s.display_name)
            .unwrap_or_else(|| db_path.display().to_string());
        let summary = summarize(&store, Utc::now(), fallback);

        let mut app = DashboardApp {
            store,
            db_path: db_path.to_path_buf(),
            site_name,
            fallback,
            summary,
            reports: Vec::new(),
            view: ViewState::default(),
            filter: TaskFilter::default(),
            task_table: TableState::default(),
            report_table: TableState::default(),
            status_message: String::new(),
            load_error,
        };
        if let Some(e) = &app.load_error {
            app.status_message = format!("Read-only: {e}");
        }
        app.recompute();
        app
    }

    /// Reload the store from disk and refresh everything derived from it.
    fn reload(&mut self) {
        let (store, load_error) = load_for_view(&self.db_path);
        self.store = store;
        self.status_message = match &load_error {
            Some(e) => format!("Read-only: {e}"),
            None => "Reloaded.".to_string(),
        };
        self.load_error = load_error;
        self.recompute();
    }

    /// Recompute figures and lists from the in-memory store.
    fn recompute(&mut self) {
        self.summary = summarize(&self.store, Utc::now(), self.fallback);
        self.reports = self.store.reports();

        if let TaskView::Detail(id) = self.view.tasks {
            if self.store.get_task(id).is_none() {
                self.view.forget_task(id);
            }
        }
        if let ReportView::Detail(i) = self.view.reports {
            if i >= self.reports.len() {
                self.view.reports = ReportView::List;
            }
        }

        let task_len = self.visible_tasks().len();
        clamp_selection(&mut self.task_table, task_len);
        clamp_selection(&mut self.report_table, self.reports.len());
    }

    /// Tasks passing the current filter, by due date then ID.
    fn visible_tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .store
            .tasks
            .iter()
            .filter(|t| self.filter.matches(t.parsed_status()))
            .collect();
        tasks.sort_by_key(|t| (t.due().is_none(), t.due(), t.id));
        tasks
    }

    fn selected_task_id(&self) -> Option<u64> {
        match self.view.tasks {
            TaskView::Detail(id) => Some(id),
            TaskView::List => self
                .task_table
                .selected()
                .and_then(|i| self.visible_tasks().get(i).map(|t| t.id)),
        }
    }

    /// Advance the selected task's status and persist it.
    fn cycle_selected_status(&mut self) {
        if let Some(e) = &self.load_error {
            self.status_message = format!("Read-only: {e}");
            return;
        }
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let Some(current) = self.store.get_task(id).map(|t| t.parsed_status()) else {
            return;
        };
        let status = next_status(current);
        self.store.set_task_status(id, status);

        match self.store.save(&self.db_path) {
            Ok(()) => {
                self.status_message = format!("Task {} is now {}.", id, format_status(status.as_str()));
            }
            Err(e) => {
                log::error!("{e}");
                self.status_message = format!("Save failed: {e}");
            }
        }
        self.recompute();
    }

    /// Apply one key press. Returns true if the app should quit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        self.status_message.clear();

        if self.view.help {
            if matches!(key, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.view.toggle_help();
            }
            return false;
        }

        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                self.view.back();
                return false;
            }
            KeyCode::Char('h') | KeyCode::Char('?') => {
                self.view.toggle_help();
                return false;
            }
            KeyCode::Char('r') => {
                self.reload();
                return false;
            }
            KeyCode::Tab | KeyCode::Right => {
                self.view.select_tab(self.view.tab.next());
                return false;
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.view.select_tab(self.view.tab.prev());
                return false;
            }
            KeyCode::Char(c @ '1'..='3') => {
                self.view.select_tab(Tab::ALL[(c as u8 - b'1') as usize]);
                return false;
            }
            _ => {}
        }

        match self.view.tab {
            Tab::Overview => {}
            Tab::Tasks => self.handle_tasks_key(key),
            Tab::Reports => self.handle_reports_key(key),
        }
        false
    }

    fn handle_tasks_key(&mut self, key: KeyCode) {
        let len = self.visible_tasks().len();
        match (self.view.tasks, key) {
            (_, KeyCode::Char('s')) => self.cycle_selected_status(),
            (TaskView::List, KeyCode::Down | KeyCode::Char('j')) => move_selection(&mut self.task_table, len, 1),
            (TaskView::List, KeyCode::Up | KeyCode::Char('k')) => move_selection(&mut self.task_table, len, -1),
            (TaskView::List, KeyCode::Char('f')) => {
                self.filter = self.filter.cycle();
                self.task_table.select(None);
                self.recompute();
                self.status_message = format!("Showing {} tasks.", self.filter.label());
            }
            (TaskView::List, KeyCode::Enter) => {
                if let Some(id) = self.selected_task_id() {
                    self.view.open_task(id);
                }
            }
            _ => {}
        }
    }

    fn handle_reports_key(&mut self, key: KeyCode) {
        let len = self.reports.len();
        match (self.view.reports, key) {
            (ReportView::List, KeyCode::Down | KeyCode::Char('j')) => move_selection(&mut self.report_table, len, 1),
            (ReportView::List, KeyCode::Up | KeyCode::Char('k')) => move_selection(&mut self.report_table, len, -1),
            (ReportView::List, KeyCode::Enter) => {
                if let Some(i) = self.report_table.selected().filter(|&i| i < len) {
                    self.view.open_report(i);
                }
            }
            _ => {}
        }
    }

    /// Poll for one keyboard event. Returns true if the app should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code));
                }
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Tab::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.title())))
            .collect();
        let tabs = Tabs::new(titles)
            .select(self.view.tab.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" SITE DASHBOARD  {} ", self.site_name)),
            )
            .highlight_style(Style::default().fg(SITE_ORANGE).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, area);
    }

    fn render_overview(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(8), Constraint::Min(8)])
            .split(area);

        let pct = self.summary.on_schedule_percentage;
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("On schedule"))
            .gauge_style(Style::default().fg(schedule_color(pct)))
            .percent(u16::from(pct))
            .label(format!("{}%", pct));
        f.render_widget(gauge, chunks[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        let c = self.summary.counts;
        let overdue_style = if self.summary.overdue_tasks > 0 {
            Style::default().fg(ALERT_RED).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let task_lines = vec![
            Line::from(format!("Total        {}", self.summary.total_tasks)),
            Line::from(format!("Pending      {}", c.pending_tasks)),
            Line::from(format!("In progress  {}", c.active_tasks)),
            Line::from(format!("Completed    {}", c.completed_tasks)),
            Line::from(Span::styled(format!("Overdue      {}", self.summary.overdue_tasks), overdue_style)),
        ];
        f.render_widget(
            Paragraph::new(task_lines).block(Block::default().borders(Borders::ALL).title("Tasks")),
            middle[0],
        );

        let incident_style = if self.summary.safety_incidents_this_month > 0 {
            Style::default().fg(ALERT_RED).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let month_lines = vec![
            Line::from(format!("Daily reports     {}", self.summary.daily_reports_this_month)),
            Line::from(format!("Weekly reports    {}", self.summary.weekly_reports_this_month)),
            Line::from(Span::styled(
                format!("Safety incidents  {}", self.summary.safety_incidents_this_month),
                incident_style,
            )),
        ];
        f.render_widget(
            Paragraph::new(month_lines)
                .block(Block::default().borders(Borders::ALL).title("Submitted this month")),
            middle[1],
        );

        self.render_weekly_chart(f, chunks[2]);
    }

    fn render_weekly_chart(&self, f: &mut Frame, area: Rect) {
        let title = if self.store.weekly_reports.is_empty() && self.fallback == WeeklyFallback::Ramp {
            "Weekly progress: planned vs actual (placeholder, no reports yet)"
        } else {
            "Weekly progress: planned vs actual"
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.summary.weekly_series.is_empty() {
            let empty = Paragraph::new("No weekly reports.")
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let bar = |value: f64, color: Color, label: &'static str| {
            Bar::default()
                .value(value.round().max(0.0) as u64)
                .text_value(format!("{:.0}", value))
                .label(Line::from(label))
                .style(Style::default().fg(color))
        };
        let mut chart = BarChart::default()
            .block(block)
            .bar_width(5)
            .bar_gap(1)
            .group_gap(4)
            .max(100);
        for point in &self.summary.weekly_series {
            let bars = [
                bar(point.planned, PLANNED_BLUE, "plan"),
                bar(point.actual, ACTUAL_GREEN, "act"),
            ];
            chart = chart.data(BarGroup::default().label(Line::from(point.week.clone())).bars(&bars));
        }
        f.render_widget(chart, area);
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let now = Utc::now();
        let today = now.date_naive();

        let header = Row::new(["ID", "Status", "Project", "Due", "Assignee", "Name"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(SITE_ORANGE).fg(Color::Black));

        let tasks = self.visible_tasks();
        let shown = tasks.len();
        let rows: Vec<Row> = tasks
            .iter()
            .map(|task| {
                let due_style = if is_overdue(task, now) {
                    Style::default().fg(ALERT_RED)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(task.id.to_string()),
                    Cell::from(format_status(&task.status)),
                    Cell::from(task.project_id.clone()),
                    Cell::from(format_due_relative(task.due(), today)).style(due_style),
                    Cell::from(task.assigned_to_id.clone().unwrap_or_else(|| "-".into())),
                    Cell::from(task.name.clone()),
                ])
                .style(Style::default().fg(status_color(task.parsed_status())))
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Length(13),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(20),
        ];
        let title = format!(
            "Tasks ({}/{}, filter: {}) - f filter, s status, Enter details",
            shown,
            self.store.tasks.len(),
            self.filter.label()
        );
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.task_table);
    }

    fn render_task_detail(&self, f: &mut Frame, area: Rect, id: u64) {
        let Some(task) = self.store.get_task(id) else {
            return;
        };
        let now = Utc::now();
        let today = now.date_naive();
        let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();
        let label = |s: &'static str| Span::styled(format!("{:<12}", s), Style::default().add_modifier(Modifier::BOLD));

        let schedule = if crate::metrics::is_on_schedule(task, now) {
            Span::styled("on schedule", Style::default().fg(ACTUAL_GREEN))
        } else {
            Span::styled("not on schedule", Style::default().fg(ALERT_RED))
        };
        let lines = vec![
            Line::from(vec![label("Name"), Span::raw(task.name.clone())]),
            Line::from(vec![label("Project"), Span::raw(task.project_id.clone())]),
            Line::from(vec![label("Assignee"), Span::raw(or_dash(task.assigned_to_id.as_deref()))]),
            Line::from(vec![
                label("Status"),
                Span::styled(format_status(&task.status), Style::default().fg(status_color(task.parsed_status()))),
            ]),
            Line::from(vec![label("Start"), Span::raw(or_dash(task.start_date.as_deref()))]),
            Line::from(vec![
                label("Due"),
                Span::raw(format!(
                    "{} ({})",
                    or_dash(task.due_date.as_deref()),
                    format_due_relative(task.due(), today)
                )),
            ]),
            Line::from(vec![label("Schedule"), schedule]),
        ];
        let detail = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(format!("Task {}", task.id)))
            .wrap(Wrap { trim: false });
        f.render_widget(detail, area);
    }

    fn render_report_list(&mut self, f: &mut Frame, area: Rect) {
        let header = Row::new(["Kind", "ID", "Created", "Details"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(SITE_ORANGE).fg(Color::Black));

        let rows: Vec<Row> = self
            .reports
            .iter()
            .map(|report| match report {
                Report::Daily(d) => {
                    let style = if d.has_safety_incident() {
                        Style::default().fg(ALERT_RED)
                    } else {
                        Style::default()
                    };
                    Row::new(vec![
                        Cell::from("DPR"),
                        Cell::from(d.id.to_string()),
                        Cell::from(d.created_at.clone()),
                        Cell::from(format!(
                            "{} | {} workers",
                            d.weather.as_deref().unwrap_or("-"),
                            d.manpower.map(|m| m.to_string()).unwrap_or_else(|| "-".into())
                        )),
                    ])
                    .style(style)
                }
                Report::Weekly(w) => Row::new(vec![
                    Cell::from("WPR"),
                    Cell::from(w.id.to_string()),
                    Cell::from(w.created_at.clone()),
                    Cell::from(format!(
                        "planned {:.1} / actual {:.1}",
                        w.planned_progress.value(),
                        w.actual_progress.value()
                    )),
                ]),
            })
            .collect();

        let widths = [
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(27),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Reports ({}) - Enter details", self.reports.len())),
            )
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.report_table);
    }

    fn render_report_detail(&self, f: &mut Frame, area: Rect, index: usize) {
        let Some(report) = self.reports.get(index) else {
            return;
        };
        let field = |name: &'static str, value: Option<String>| {
            Line::from(vec![
                Span::styled(format!("{:<16}", name), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(value.unwrap_or_else(|| "-".into())),
            ])
        };

        let (title, lines) = match report {
            Report::Daily(d) => (
                format!("Daily report {}", d.id),
                vec![
                    field("Created", Some(d.created_at.clone())),
                    field("Date", d.date.clone()),
                    field("Weather", d.weather.clone()),
                    field("Manpower", d.manpower.map(|m| m.to_string())),
                    field("Work done", d.work_done.clone()),
                    field("Safety incident", d.safety_incident.clone()),
                    field("Remarks", d.remarks.clone()),
                ],
            ),
            Report::Weekly(w) => (
                format!("Weekly report {}", w.id),
                vec![
                    field("Created", Some(w.created_at.clone())),
                    field("Week", Some(format!(
                        "{} to {}",
                        w.week_start.as_deref().unwrap_or("?"),
                        w.week_end.as_deref().unwrap_or("?")
                    ))),
                    field("Planned", Some(format!("{:.1}", w.planned_progress.value()))),
                    field("Actual", Some(format!("{:.1}", w.actual_progress.value()))),
                    field("Summary", w.summary.clone()),
                    field("Remarks", w.remarks.clone()),
                ],
            ),
        };

        let detail = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        f.render_widget(detail, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 60, area);
        let lines: Vec<Line> = [
            ("Tab / Right", "next tab"),
            ("Shift+Tab / Left", "previous tab"),
            ("1 2 3", "jump to tab"),
            ("Up/Down, j/k", "move selection"),
            ("Enter", "open details"),
            ("Esc", "back"),
            ("f", "cycle task status filter"),
            ("s", "advance task status (saved)"),
            ("r", "reload store from disk"),
            ("h / ?", "toggle help"),
            ("q", "quit"),
        ]
        .iter()
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(format!("{:<18}", k), Style::default().fg(SITE_ORANGE)),
                Span::raw(*v),
            ])
        })
        .collect();

        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help")),
            area,
        );
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let hint = match (self.view.tab, self.view.in_detail()) {
                (_, true) => "Esc back",
                (Tab::Overview, false) => "Tab switch view",
                (Tab::Tasks, false) => "f filter | s status | Enter details",
                (Tab::Reports, false) => "Enter details",
            };
            format!("{} | r reload | h help | q quit", hint)
        };
        let bar = Paragraph::new(text)
            .style(Style::default().bg(SITE_ORANGE).fg(Color::Black))
            .alignment(Alignment::Left);
        f.render_widget(bar, area);
    }

    /// Draw the whole screen.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_header(f, chunks[0]);
        match self.view.tab {
            Tab::Overview => self.render_overview(f, chunks[1]),
            Tab::Tasks => match self.view.tasks {
                TaskView::List => self.render_task_list(f, chunks[1]),
                TaskView::Detail(id) => self.render_task_detail(f, chunks[1], id),
            },
            Tab::Reports => match self.view.reports {
                ReportView::List => self.render_report_list(f, chunks[1]),
                ReportView::Detail(i) => self.render_report_detail(f, chunks[1], i),
            },
        }
        if self.view.help {
            self.render_help(f, chunks[1]);
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop. Redraws and handles input until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
