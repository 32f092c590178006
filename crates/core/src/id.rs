//! Sequential identifiers for ncwork entities.
//!
//! Ids are plain counters handed out by the tracker (`count + 1`). Nothing
//! is ever deleted, so an id is never reused within a process lifetime.

use serde::{Deserialize, Serialize};

/// Unique identifier for a Task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Wrap a raw task number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The id that follows a store holding `count` tasks.
    pub fn next_after(count: usize) -> Self {
        Self(count as u64 + 1)
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim_start_matches('#').parse()?))
    }
}

/// Unique identifier for a log entry (work, call or meeting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(u64);

impl LogId {
    /// Wrap a raw log number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The id that follows a store holding `count` log entries.
    pub fn next_after(count: usize) -> Self {
        Self(count as u64 + 1)
    }
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "log-{}", self.0)
    }
}

/// Unique identifier for a leave request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaveId(u64);

impl LeaveId {
    /// Wrap a raw leave number.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The id that follows a store holding `count` leave requests.
    pub fn next_after(count: usize) -> Self {
        Self(count as u64 + 1)
    }
}

impl std::fmt::Display for LeaveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "leave-{}", self.0)
    }
}
