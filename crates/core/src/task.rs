//! Task model - the unit of assigned work.

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use crate::error::ParseError;
use crate::id::TaskId;
use crate::Time;

/// A task assigned to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Assignee (user name)
    pub assigned_to: String,

    /// Creator (user name)
    pub created_by: String,

    /// Planned start
    pub start_date: Option<NaiveDate>,

    /// Planned end
    pub end_date: Option<NaiveDate>,

    /// Current status
    pub status: TaskStatus,

    /// Users who report on this task alongside the assignee
    #[serde(default)]
    pub reporters: Vec<String>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl Task {
    /// Human readable label used wherever a task is picked from a list.
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.id, self.title, self.assigned_to)
    }

    /// Whether `user` is the assignee or a listed reporter.
    pub fn involves(&self, user: &str) -> bool {
        self.assigned_to == user || self.reporters.iter().any(|r| r == user)
    }

    /// Whether the task still needs work.
    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }
}

/// Task status. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    ToDo,
    /// Being worked on
    Running,
    /// Work finished
    Done,
    /// Finished and signed off
    Closed,
}

impl TaskStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::ToDo,
        TaskStatus::Running,
        TaskStatus::Done,
        TaskStatus::Closed,
    ];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::Running => "Running",
            TaskStatus::Done => "Done",
            TaskStatus::Closed => "Closed",
        }
    }

    /// Neither done nor closed.
    pub fn is_pending(&self) -> bool {
        matches!(self, TaskStatus::ToDo | TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "todo" => Ok(TaskStatus::ToDo),
            "running" => Ok(TaskStatus::Running),
            "done" => Ok(TaskStatus::Done),
            "closed" => Ok(TaskStatus::Closed),
            _ => Err(ParseError::new("task status", s)),
        }
    }
}

/// Filter for querying tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Only tasks assigned to this user
    pub assigned_to: Option<String>,

    /// Only tasks assigned to or reported on by this user
    pub involving: Option<String>,

    /// Filter by status
    pub status: Option<Vec<TaskStatus>>,
}

impl TaskFilter {
    /// Tasks assigned to `user`.
    pub fn assigned_to(user: impl Into<String>) -> Self {
        Self {
            assigned_to: Some(user.into()),
            ..Default::default()
        }
    }

    /// Whether a task passes this filter.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(user) = &self.assigned_to {
            if &task.assigned_to != user {
                return false;
            }
        }
        if let Some(user) = &self.involving {
            if !task.involves(user) {
                return false;
            }
        }
        if let Some(statuses) = &self.status {
            if !statuses.contains(&task.status) {
                return false;
            }
        }
        true
    }
}
