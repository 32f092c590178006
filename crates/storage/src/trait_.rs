//! Storage trait abstraction.

use async_trait::async_trait;
use ncwork_core::{
    LeaveBalance, LeaveFilter, LeaveId, LeaveRequest, LogEntry, LogFilter, LogId, MonthKey,
    MonthLock, Task, TaskFilter, TaskId,
};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for ncwork data.
///
/// Saves are upserts keyed by the record's id. Listing returns records in
/// id order. Nothing is ever deleted.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Task operations ===

    /// Save a task (create or update).
    async fn save_task(&mut self, task: &Task) -> Result<()>;

    /// Load a task by ID.
    async fn load_task(&self, id: TaskId) -> Result<Option<Task>>;

    /// List tasks matching the filter.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    /// Number of tasks ever created.
    async fn count_tasks(&self) -> Result<usize>;

    // === Log operations ===

    /// Save a log entry (create or update).
    async fn save_log(&mut self, entry: &LogEntry) -> Result<()>;

    /// Load a log entry by ID.
    async fn load_log(&self, id: LogId) -> Result<Option<LogEntry>>;

    /// List log entries matching the filter.
    async fn list_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>>;

    /// Number of log entries ever written.
    async fn count_logs(&self) -> Result<usize>;

    // === Leave operations ===

    /// Save a leave request (create or update).
    async fn save_leave(&mut self, leave: &LeaveRequest) -> Result<()>;

    /// Load a leave request by ID.
    async fn load_leave(&self, id: LeaveId) -> Result<Option<LeaveRequest>>;

    /// List leave requests matching the filter.
    async fn list_leaves(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>>;

    /// Number of leave requests ever made.
    async fn count_leaves(&self) -> Result<usize>;

    /// Save a user's leave balance.
    async fn save_balance(&mut self, user: &str, balance: &LeaveBalance) -> Result<()>;

    /// Load a user's leave balance.
    async fn load_balance(&self, user: &str) -> Result<Option<LeaveBalance>>;

    // === Month approval operations ===

    /// Save a month lock.
    async fn save_month_lock(&mut self, lock: &MonthLock) -> Result<()>;

    /// Load the lock for a month, if the month is approved.
    async fn load_month_lock(&self, key: &MonthKey) -> Result<Option<MonthLock>>;

    /// List month locks, optionally for one user.
    async fn list_month_locks(&self, user: Option<&str>) -> Result<Vec<MonthLock>>;
}
