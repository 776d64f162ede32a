//! Color constants for the dashboard.

use ratatui::style::Color;

use crate::fields::TaskStatus;

/// Header and status bar background.
pub const SITE_ORANGE: Color = Color::Rgb(230, 126, 34);
/// Planned progress bars.
pub const PLANNED_BLUE: Color = Color::Rgb(52, 101, 164);
/// Actual progress bars, and an on-schedule share of 80% or more.
pub const ACTUAL_GREEN: Color = Color::Rgb(0, 128, 0);
/// On-schedule share between 50% and 80%.
pub const AMBER: Color = Color::Rgb(255, 191, 0);
/// On-schedule share under 50%, overdue tasks, safety incidents.
pub const ALERT_RED: Color = Color::Rgb(178, 34, 34);

/// Gauge color for an on-schedule percentage.
pub fn schedule_color(pct: u8) -> Color {
    match pct {
        80.. => ACTUAL_GREEN,
        50..=79 => AMBER,
        _ => ALERT_RED,
    }
}

/// Row color for a task status.
pub fn status_color(status: Option<TaskStatus>) -> Color {
    match status {
        Some(TaskStatus::Completed) => Color::DarkGray,
        Some(TaskStatus::InProgress) => AMBER,
        Some(TaskStatus::Pending) => Color::White,
        None => Color::Magenta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_color_thresholds() {
        assert_eq!(schedule_color(100), ACTUAL_GREEN);
        assert_eq!(schedule_color(80), ACTUAL_GREEN);
        assert_eq!(schedule_color(79), AMBER);
        assert_eq!(schedule_color(50), AMBER);
        assert_eq!(schedule_color(49), ALERT_RED);
        assert_eq!(schedule_color(0), ALERT_RED);
    }
}
