//! In-memory storage implementation.
//!
//! Keeps every record in insertion order. Data lives as long as the value
//! does; there is no persistence across restarts.

use std::collections::{BTreeMap, HashMap};
use ncwork_core::{
    LeaveBalance, LeaveFilter, LeaveId, LeaveRequest, LogEntry, LogFilter, LogId, MonthKey,
    MonthLock, Task, TaskFilter, TaskId,
};
use tracing::trace;
use super::{Result, Storage};

/// Process-lifetime storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tasks: Vec<Task>,
    logs: Vec<LogEntry>,
    leaves: Vec<LeaveRequest>,
    balances: HashMap<String, LeaveBalance>,
    month_locks: BTreeMap<MonthKey, MonthLock>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Replace the item with a matching key or append it.
fn upsert<T: Clone, K: PartialEq>(items: &mut Vec<T>, item: &T, key: impl Fn(&T) -> K) {
    let k = key(item);
    match items.iter().position(|existing| key(existing) == k) {
        Some(i) => items[i] = item.clone(),
        None => items.push(item.clone()),
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_task(&mut self, task: &Task) -> Result<()> {
        trace!(task = %task.id, "save task");
        upsert(&mut self.tasks, task, |t| t.id);
        Ok(())
    }

    async fn load_task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        Ok(self.tasks.iter().filter(|t| filter.matches(t)).cloned().collect())
    }

    async fn count_tasks(&self) -> Result<usize> {
        Ok(self.tasks.len())
    }

    async fn save_log(&mut self, entry: &LogEntry) -> Result<()> {
        trace!(log = %entry.id, user = %entry.user, "save log");
        upsert(&mut self.logs, entry, |e| e.id);
        Ok(())
    }

    async fn load_log(&self, id: LogId) -> Result<Option<LogEntry>> {
        Ok(self.logs.iter().find(|e| e.id == id).cloned())
    }

    async fn list_logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        Ok(self.logs.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    async fn count_logs(&self) -> Result<usize> {
        Ok(self.logs.len())
    }

    async fn save_leave(&mut self, leave: &LeaveRequest) -> Result<()> {
        trace!(leave = %leave.id, user = %leave.user, "save leave");
        upsert(&mut self.leaves, leave, |l| l.id);
        Ok(())
    }

    async fn load_leave(&self, id: LeaveId) -> Result<Option<LeaveRequest>> {
        Ok(self.leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn list_leaves(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>> {
        Ok(self.leaves.iter().filter(|l| filter.matches(l)).cloned().collect())
    }

    async fn count_leaves(&self) -> Result<usize> {
        Ok(self.leaves.len())
    }

    async fn save_balance(&mut self, user: &str, balance: &LeaveBalance) -> Result<()> {
        self.balances.insert(user.to_string(), balance.clone());
        Ok(())
    }

    async fn load_balance(&self, user: &str) -> Result<Option<LeaveBalance>> {
        Ok(self.balances.get(user).cloned())
    }

    async fn save_month_lock(&mut self, lock: &MonthLock) -> Result<()> {
        trace!(month = %lock.key, "save month lock");
        self.month_locks.insert(lock.key.clone(), lock.clone());
        Ok(())
    }

    async fn load_month_lock(&self, key: &MonthKey) -> Result<Option<MonthLock>> {
        Ok(self.month_locks.get(key).cloned())
    }

    async fn list_month_locks(&self, user: Option<&str>) -> Result<Vec<MonthLock>> {
        Ok(self
            .month_locks
            .values()
            .filter(|lock| user.map_or(true, |u| lock.key.user == u))
            .cloned()
            .collect())
    }
}
