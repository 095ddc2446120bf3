//! Per-project task statistics.

use super::{Task, TaskPriority, TaskStatus};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Tasks created within this many days count as recent.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Task counts per priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    /// `Low` tasks.
    #[serde(rename = "Low")]
    pub low: usize,
    /// `Medium` tasks.
    #[serde(rename = "Medium")]
    pub medium: usize,
    /// `High` tasks.
    #[serde(rename = "High")]
    pub high: usize,
    /// `Urgent` tasks.
    #[serde(rename = "Urgent")]
    pub urgent: usize,
}

/// Task counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    /// `To Do` tasks.
    #[serde(rename = "To Do")]
    pub to_do: usize,
    /// `In Progress` tasks.
    #[serde(rename = "In Progress")]
    pub in_progress: usize,
    /// `Done` tasks.
    #[serde(rename = "Done")]
    pub done: usize,
}

/// Snapshot of a project's task statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalytics {
    /// Number of tasks.
    pub total_tasks: usize,
    /// Share of `Done` tasks in hundredths of a percent (`10_000` = 100%).
    pub completion_rate_hundredths: u64,
    /// Counts per priority.
    pub tasks_by_priority: PriorityBreakdown,
    /// Counts per status.
    pub tasks_by_status: StatusBreakdown,
    /// Tasks past their due date and not done.
    pub overdue_tasks: usize,
    /// Tasks created within the last [`RECENT_WINDOW_DAYS`] days.
    pub recent_tasks: usize,
}

impl ProjectAnalytics {
    /// Aggregates `tasks` as observed at `now`.
    #[must_use]
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let recent_cutoff = now - TimeDelta::days(RECENT_WINDOW_DAYS);
        let mut analytics = Self {
            total_tasks: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.priority() {
                TaskPriority::Low => analytics.tasks_by_priority.low += 1,
                TaskPriority::Medium => analytics.tasks_by_priority.medium += 1,
                TaskPriority::High => analytics.tasks_by_priority.high += 1,
                TaskPriority::Urgent => analytics.tasks_by_priority.urgent += 1,
            }
            match task.status() {
                TaskStatus::ToDo => analytics.tasks_by_status.to_do += 1,
                TaskStatus::InProgress => analytics.tasks_by_status.in_progress += 1,
                TaskStatus::Done => analytics.tasks_by_status.done += 1,
            }
            if task.is_overdue(now) {
                analytics.overdue_tasks += 1;
            }
            if task.created_at() >= recent_cutoff {
                analytics.recent_tasks += 1;
            }
        }
        analytics.completion_rate_hundredths =
            completion_rate_hundredths(analytics.tasks_by_status.done, analytics.total_tasks);
        analytics
    }
}

/// Rounded `done / total` in hundredths of a percent; zero for no tasks.
fn completion_rate_hundredths(done: usize, total: usize) -> u64 {
    let (Ok(done_tasks), Ok(total_tasks)) = (u64::try_from(done), u64::try_from(total)) else {
        return 0;
    };
    let scaled = done_tasks.saturating_mul(10_000);
    let half = total_tasks.checked_div(2).unwrap_or(0);
    scaled
        .saturating_add(half)
        .checked_div(total_tasks)
        .unwrap_or(0)
}
