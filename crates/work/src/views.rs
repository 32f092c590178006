//! Read models handed to the presentation layer.

use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::Serialize;
use ncwork_core::{LogEntry, MonthKey, MonthLock, Task, TaskStatus};

/// Dashboard for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    /// Management overview of every task
    Team {
        /// All tasks
        tasks: Vec<Task>,
        /// Tasks not yet done or closed
        pending: Vec<Task>,
        /// Pending task count per field user (zero counts included)
        pending_by_user: BTreeMap<String, usize>,
    },
    /// A field user's own tasks
    Personal {
        /// Tasks the user is assigned to or reports on
        tasks: Vec<Task>,
        /// Counts over the assigned tasks
        summary: TaskSummary,
    },
}

/// Task counts for one assignee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    /// Tasks assigned
    pub total: usize,
    /// Not started
    pub todo: usize,
    /// In progress
    pub running: usize,
    /// Done or closed
    pub completed: usize,
}

impl TaskSummary {
    /// Count statuses over `tasks`.
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut acc, task| {
            acc.total += 1;
            match task.status {
                TaskStatus::ToDo => acc.todo += 1,
                TaskStatus::Running => acc.running += 1,
                TaskStatus::Done | TaskStatus::Closed => acc.completed += 1,
            }
            acc
        })
    }
}

/// A user's month of logs.
#[derive(Debug, Clone, Serialize)]
pub struct Timesheet {
    /// Month covered
    pub month: MonthKey,
    /// Entries in date order
    pub entries: Vec<LogEntry>,
    /// Approval, once given
    pub approval: Option<MonthLock>,
}

impl Timesheet {
    /// Whether the month is locked.
    pub fn is_approved(&self) -> bool {
        self.approval.is_some()
    }
}

/// State of one (user, date) pair for the daily log form.
#[derive(Debug, Clone, Serialize)]
pub struct DaySheet {
    /// User
    pub user: String,
    /// Date
    pub date: NaiveDate,
    /// Entries already recorded
    pub entries: Vec<LogEntry>,
    /// Approved leave covers the date
    pub on_leave: bool,
    /// The month is approved
    pub month_locked: bool,
    /// The date is inside the editable window
    pub in_window: bool,
}

impl DaySheet {
    /// Whether new entries may be recorded.
    pub fn can_log(&self) -> bool {
        self.in_window && !self.month_locked && !self.on_leave
    }
}
