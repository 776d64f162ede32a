//! Enumerations for dashboard view state.
//!
//! Each tab owns an explicit subview enum; `ViewState` holds them together and
//! is the only place transitions happen.

use crate::fields::TaskStatus;

/// Top-level dashboard tabs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tab {
    Overview,
    Tasks,
    Reports,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Tasks, Tab::Reports];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Tasks => "Tasks",
            Tab::Reports => "Reports",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Overview => 0,
            Tab::Tasks => 1,
            Tab::Reports => 2,
        }
    }

    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// What the Tasks tab is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskView {
    List,
    Detail(u64),
}

/// What the Reports tab is showing. Detail holds the row index in the
/// newest-first report list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReportView {
    List,
    Detail(usize),
}

/// Status filter applied to the task list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl TaskFilter {
    /// All -> Pending -> In progress -> Completed -> All.
    pub fn cycle(self) -> TaskFilter {
        match self {
            TaskFilter::All => TaskFilter::Only(TaskStatus::Pending),
            TaskFilter::Only(TaskStatus::Pending) => TaskFilter::Only(TaskStatus::InProgress),
            TaskFilter::Only(TaskStatus::InProgress) => TaskFilter::Only(TaskStatus::Completed),
            TaskFilter::Only(TaskStatus::Completed) => TaskFilter::All,
        }
    }

    pub fn matches(self, status: Option<TaskStatus>) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Only(s) => status == Some(s),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Only(TaskStatus::Pending) => "pending",
            TaskFilter::Only(TaskStatus::InProgress) => "in progress",
            TaskFilter::Only(TaskStatus::Completed) => "completed",
        }
    }
}

/// Which screen is displayed, per tab, plus the help overlay.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ViewState {
    pub tab: Tab,
    pub tasks: TaskView,
    pub reports: ReportView,
    pub help: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            tab: Tab::Overview,
            tasks: TaskView::List,
            reports: ReportView::List,
            help: false,
        }
    }
}

impl ViewState {
    /// Switch tabs. Each tab keeps its own subview.
    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.help = false;
    }

    pub fn open_task(&mut self, id: u64) {
        self.tab = Tab::Tasks;
        self.tasks = TaskView::Detail(id);
    }

    pub fn open_report(&mut self, index: usize) {
        self.tab = Tab::Reports;
        self.reports = ReportView::Detail(index);
    }

    pub fn toggle_help(&mut self) {
        self.help = !self.help;
    }

    /// Whether the current tab is showing a detail screen.
    pub fn in_detail(&self) -> bool {
        match self.tab {
            Tab::Overview => false,
            Tab::Tasks => matches!(self.tasks, TaskView::Detail(_)),
            Tab::Reports => matches!(self.reports, ReportView::Detail(_)),
        }
    }

    /// Step back one level: close help, else leave a detail screen.
    /// Returns false when already at the top of the current tab.
    pub fn back(&mut self) -> bool {
        if self.help {
            self.help = false;
            return true;
        }
        match self.tab {
            Tab::Tasks if self.tasks != TaskView::List => {
                self.tasks = TaskView::List;
                true
            }
            Tab::Reports if self.reports != ReportView::List => {
                self.reports = ReportView::List;
                true
            }
            _ => false,
        }
    }

    /// Drop a task detail screen whose task no longer exists.
    pub fn forget_task(&mut self, id: u64) {
        if self.tasks == TaskView::Detail(id) {
            self.tasks = TaskView::List;
        }
    }
}
