//! Work tracking service.
//!
//! [`WorkTracker`] owns the store and is the only way records change. Every
//! public operation takes the store lock once and performs its whole
//! read-modify-write under it, so concurrent callers are serialized.

use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use ncwork_core::{
    CallLog, CallType, LeaveBalance, LeaveFilter, LeaveId, LeaveRequest, LeaveStatus, LeaveType,
    LogDetail, LogEntry, LogFilter, LogId, LogKind, MeetingLog, MeetingMode, MeetingScope,
    MonthApproval, MonthKey, MonthLock, Role, Roster, StateRef, Task, TaskFilter, TaskId,
    TaskStatus, UpdateType, User, WorkLog,
};
use ncwork_storage::{MemoryStorage, Storage};
use crate::clock::{Clock, SystemClock};
use crate::config::{LogPolicy, WorkConfig};
use crate::error::{Result, WorkError};
use crate::policy::{AccessPolicy, LogBlock};
use crate::views::{Dashboard, DaySheet, TaskSummary, Timesheet};

/// Fields for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    /// Short title, must not be empty
    pub title: String,
    /// Free-text details
    pub description: String,
    /// Assignee
    pub assigned_to: String,
    /// Creator, who must be allowed to assign to `assigned_to`
    pub created_by: String,
    /// Planned start
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Planned end, not before `start_date`
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Rostered users who follow the task
    #[serde(default)]
    pub reporters: Vec<String>,
}

impl NewTask {
    /// Task with no dates or reporters.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        assigned_to: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            assigned_to: assigned_to.into(),
            created_by: created_by.into(),
            start_date: None,
            end_date: None,
            reporters: Vec::new(),
        }
    }

    /// Set the planned date range.
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// Add reporters.
    pub fn with_reporters(mut self, reporters: Vec<String>) -> Self {
        self.reporters = reporters;
        self
    }
}

/// Fields of a call entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCallLog {
    /// Person called
    pub person: String,
    /// Kind of call
    pub call_type: CallType,
    /// Where the other party is
    pub state: StateRef,
    /// Notes
    #[serde(default)]
    pub description: String,
    /// Related task
    #[serde(default)]
    pub task: Option<TaskId>,
}

/// Fields of a meeting entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeetingLog {
    /// Who the meeting was with
    pub scope: MeetingScope,
    /// Online or in person
    pub mode: MeetingMode,
    /// Attendees
    pub participants: String,
    /// What was decided
    pub outcome: String,
    /// Related task
    #[serde(default)]
    pub task: Option<TaskId>,
}

/// In-memory work tracker over a pluggable store.
pub struct WorkTracker<S: Storage> {
    storage: Mutex<S>,
    roster: Roster,
    policy: AccessPolicy,
    log_policy: LogPolicy,
    clock: Arc<dyn Clock>,
}

impl WorkTracker<MemoryStorage> {
    /// Tracker over a fresh in-memory store.
    pub async fn in_memory(config: WorkConfig) -> Result<Self> {
        Self::init(MemoryStorage::new(), config).await
    }
}

impl<S: Storage> WorkTracker<S> {
    /// Build a tracker and seed a leave balance for every rostered user that
    /// does not have one yet.
    pub async fn init(mut storage: S, config: WorkConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| WorkError::Invalid(e.to_string()))?;

        for user in config.roster.users() {
            if storage.load_balance(&user.name).await?.is_none() {
                let balance = LeaveBalance::from(config.leave_allowance);
                storage.save_balance(&user.name, &balance).await?;
            }
        }

        info!(
            users = config.roster.len(),
            log_policy = ?config.log_policy,
            window = ?config.editable_window_days,
            "work tracker initialized"
        );

        Ok(Self {
            storage: Mutex::new(storage),
            roster: config.roster,
            policy: AccessPolicy::new(config.editable_window_days),
            log_policy: config.log_policy,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Tear the tracker down, handing back its store.
    pub fn teardown(self) -> S {
        info!("work tracker shut down");
        self.storage.into_inner()
    }

    /// The fixed roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The access policy in force.
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Today's date as the tracker sees it.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn user(&self, name: &str) -> Result<&User> {
        self.roster
            .get(name)
            .ok_or_else(|| WorkError::NotFound(format!("user '{}'", name)))
    }

    fn management(&self, name: &str, action: &str) -> Result<&User> {
        let user = self.user(name)?;
        if user.role != Role::Management {
            warn!(actor = name, action, "rejected: management only");
            return Err(WorkError::unauthorized(name, action));
        }
        Ok(user)
    }

    // === Tasks ===

    /// Create a task. Management assigns to field staff; field staff assign
    /// to themselves.
    pub async fn create_task(&self, spec: NewTask) -> Result<TaskId> {
        let creator = self.user(&spec.created_by)?;
        let assignee = self.user(&spec.assigned_to)?;
        if !self.policy.can_assign(creator, assignee) {
            warn!(creator = %creator.name, assignee = %assignee.name, "rejected task assignment");
            return Err(WorkError::unauthorized(
                &creator.name,
                format!("assign tasks to {}", assignee.name),
            ));
        }

        let title = spec.title.trim();
        if title.is_empty() {
            return Err(WorkError::Invalid("task title is empty".to_string()));
        }
        if let (Some(start), Some(end)) = (spec.start_date, spec.end_date) {
            if end < start {
                return Err(WorkError::Invalid(format!(
                    "task ends ({}) before it starts ({})",
                    end, start
                )));
            }
        }
        for reporter in &spec.reporters {
            self.user(reporter)?;
        }

        let mut store = self.storage.lock().await;
        let id = TaskId::next_after(store.count_tasks().await?);
        let now = Utc::now();
        let task = Task {
            id,
            title: title.to_string(),
            description: spec.description,
            assigned_to: assignee.name.clone(),
            created_by: creator.name.clone(),
            start_date: spec.start_date,
            end_date: spec.end_date,
            status: TaskStatus::ToDo,
            reporters: spec.reporters,
            created_at: now,
            updated_at: now,
        };
        store.save_task(&task).await?;

        info!(task = %id, assignee = %task.assigned_to, creator = %task.created_by, "task created");
        Ok(id)
    }

    /// Set a task's status. Any status may follow any other.
    pub async fn set_task_status(&self, task_id: TaskId, status: TaskStatus, actor: &str) -> Result<Task> {
        let user = self.user(actor)?;
        let mut store = self.storage.lock().await;
        let mut task = store
            .load_task(task_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("task {}", task_id)))?;

        if !self.policy.can_edit(user, &task) {
            warn!(actor, task = %task_id, "rejected status change");
            return Err(WorkError::unauthorized(actor, format!("edit task {}", task_id)));
        }

        let previous = task.status;
        task.status = status;
        task.updated_at = Utc::now();
        store.save_task(&task).await?;

        info!(task = %task_id, actor, from = %previous, to = %status, "task status changed");
        Ok(task)
    }

    /// Load one task.
    pub async fn get_task(&self, task_id: TaskId) -> Result<Task> {
        self.storage
            .lock()
            .await
            .load_task(task_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("task {}", task_id)))
    }

    /// List tasks matching the filter.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        Ok(self.storage.lock().await.list_tasks(filter).await?)
    }

    /// Tasks `user` is allowed to see.
    pub async fn visible_tasks(&self, user: &str) -> Result<Vec<Task>> {
        let user = self.user(user)?;
        let tasks = self.storage.lock().await.list_tasks(&TaskFilter::default()).await?;
        Ok(tasks.into_iter().filter(|t| self.policy.can_view(user, t)).collect())
    }

    // === Daily logs ===

    async fn log_block(&self, store: &S, user: &str, date: NaiveDate) -> Result<Option<LogBlock>> {
        let today = self.clock.today();
        if !self.policy.in_window(today, date) {
            if let Some((from, to)) = self.policy.editable_window(today) {
                return Ok(Some(LogBlock::OutsideWindow { from, to }));
            }
        }
        if store.load_month_lock(&MonthKey::of(user, date)).await?.is_some() {
            return Ok(Some(LogBlock::MonthLocked));
        }
        if self.on_leave(store, user, date).await? {
            return Ok(Some(LogBlock::OnLeave));
        }
        Ok(None)
    }

    async fn on_leave(&self, store: &S, user: &str, date: NaiveDate) -> Result<bool> {
        let filter = LeaveFilter {
            user: Some(user.to_string()),
            status: Some(LeaveStatus::Approved),
            date: Some(date),
        };
        Ok(!store.list_leaves(&filter).await?.is_empty())
    }

    async fn ensure_log_allowed(&self, store: &S, user: &str, date: NaiveDate) -> Result<()> {
        match self.log_block(store, user, date).await? {
            Some(block) => {
                warn!(user, %date, ?block, "log write rejected");
                Err(block.into_error(user, date))
            }
            None => Ok(()),
        }
    }

    /// A referenced task must exist and be editable by the logging user.
    async fn check_task_ref(&self, store: &S, user: &User, task: Option<TaskId>) -> Result<()> {
        let Some(task_id) = task else {
            return Ok(());
        };
        let task = store
            .load_task(task_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("task {}", task_id)))?;
        if !self.policy.can_edit(user, &task) {
            return Err(WorkError::unauthorized(&user.name, format!("log against task {}", task_id)));
        }
        Ok(())
    }

    async fn append_log(&self, store: &mut S, user: &str, date: NaiveDate, detail: LogDetail) -> Result<LogId> {
        let entry = LogEntry {
            id: LogId::next_after(store.count_logs().await?),
            user: user.to_string(),
            date,
            recorded_at: Utc::now(),
            detail,
        };
        store.save_log(&entry).await?;
        Ok(entry.id)
    }

    /// Whether `user` may record logs for `date`.
    pub async fn can_log_work(&self, user: &str, date: NaiveDate) -> Result<bool> {
        self.user(user)?;
        let store = self.storage.lock().await;
        Ok(self.log_block(&store, user, date).await?.is_none())
    }

    /// Record task work for a day.
    ///
    /// Under [`LogPolicy::Upsert`] a second entry for the same day rewrites
    /// the first; under [`LogPolicy::Strict`] it is rejected.
    pub async fn add_work_log(
        &self,
        user: &str,
        date: NaiveDate,
        task: Option<TaskId>,
        description: &str,
        update_type: Option<UpdateType>,
    ) -> Result<LogId> {
        let logger = self.user(user)?;
        if description.trim().is_empty() {
            return Err(WorkError::Invalid("work description is empty".to_string()));
        }
        if update_type == Some(UpdateType::Leave) {
            return Err(WorkError::Invalid("leave entries are written by the system".to_string()));
        }

        let mut store = self.storage.lock().await;
        self.ensure_log_allowed(&store, user, date).await?;
        self.check_task_ref(&store, logger, task).await?;

        let work = WorkLog {
            task,
            description: description.to_string(),
            update_type,
        };

        if self.log_policy != LogPolicy::Append {
            let existing = store
                .list_logs(&LogFilter {
                    kind: Some(LogKind::Work),
                    ..LogFilter::for_user(user).with_date(date)
                })
                .await?
                .into_iter()
                .next();

            if let Some(mut entry) = existing {
                if self.log_policy == LogPolicy::Strict {
                    warn!(user, %date, "duplicate work log rejected");
                    return Err(WorkError::DuplicateLog {
                        user: user.to_string(),
                        date,
                    });
                }
                entry.detail = LogDetail::Work(work);
                entry.recorded_at = Utc::now();
                store.save_log(&entry).await?;
                info!(log = %entry.id, user, %date, "work log updated");
                return Ok(entry.id);
            }
        }

        let id = self.append_log(&mut store, user, date, LogDetail::Work(work)).await?;
        info!(log = %id, user, %date, task = ?task, "work log recorded");
        Ok(id)
    }

    /// Record a call.
    pub async fn add_call_log(&self, user: &str, date: NaiveDate, call: NewCallLog) -> Result<LogId> {
        let logger = self.user(user)?;
        if call.person.trim().is_empty() {
            return Err(WorkError::Invalid("call needs the person called".to_string()));
        }
        if let StateRef::Other(text) = &call.state {
            if text.trim().is_empty() {
                return Err(WorkError::Invalid("state 'Other' needs a name".to_string()));
            }
        }

        let mut store = self.storage.lock().await;
        self.ensure_log_allowed(&store, user, date).await?;
        self.check_task_ref(&store, logger, call.task).await?;

        let detail = LogDetail::Call(CallLog {
            person: call.person,
            call_type: call.call_type,
            state: call.state,
            description: call.description,
            task: call.task,
        });
        let id = self.append_log(&mut store, user, date, detail).await?;
        info!(log = %id, user, %date, "call logged");
        Ok(id)
    }

    /// Record a meeting.
    pub async fn add_meeting_log(&self, user: &str, date: NaiveDate, meeting: NewMeetingLog) -> Result<LogId> {
        let logger = self.user(user)?;
        if meeting.participants.trim().is_empty() {
            return Err(WorkError::Invalid("meeting needs participants".to_string()));
        }
        if meeting.outcome.trim().is_empty() {
            return Err(WorkError::Invalid("meeting needs an outcome".to_string()));
        }

        let mut store = self.storage.lock().await;
        self.ensure_log_allowed(&store, user, date).await?;
        self.check_task_ref(&store, logger, meeting.task).await?;

        let detail = LogDetail::Meeting(MeetingLog {
            scope: meeting.scope,
            mode: meeting.mode,
            participants: meeting.participants,
            outcome: meeting.outcome,
            task: meeting.task,
        });
        let id = self.append_log(&mut store, user, date, detail).await?;
        info!(log = %id, user, %date, "meeting logged");
        Ok(id)
    }

    /// Open the daily log form for (user, date).
    ///
    /// On a day of approved leave inside the editable window this writes the
    /// single "On Leave" marker if it is not there yet (and the month is not
    /// locked). Under [`LogPolicy::Upsert`] and [`LogPolicy::Strict`] a work
    /// log already recorded for the day is rewritten into the marker.
    pub async fn open_day(&self, user: &str, date: NaiveDate) -> Result<DaySheet> {
        self.user(user)?;
        let mut store = self.storage.lock().await;

        let on_leave = self.on_leave(&store, user, date).await?;
        let month_locked = store.load_month_lock(&MonthKey::of(user, date)).await?.is_some();
        let in_window = self.policy.in_window(self.clock.today(), date);
        let filter = LogFilter::for_user(user).with_date(date);

        if on_leave && !month_locked && in_window {
            let entries = store.list_logs(&filter).await?;
            if !entries.iter().any(LogEntry::is_leave_marker) {
                let existing = match self.log_policy {
                    LogPolicy::Append => None,
                    LogPolicy::Upsert | LogPolicy::Strict => {
                        entries.into_iter().find(|e| e.kind() == LogKind::Work)
                    }
                };
                match existing {
                    Some(mut entry) => {
                        entry.detail = LogDetail::Work(WorkLog::on_leave());
                        entry.recorded_at = Utc::now();
                        store.save_log(&entry).await?;
                        info!(log = %entry.id, user, %date, "work log replaced by on-leave entry");
                    }
                    None => {
                        let id = self
                            .append_log(&mut store, user, date, LogDetail::Work(WorkLog::on_leave()))
                            .await?;
                        info!(log = %id, user, %date, "on-leave entry inserted");
                    }
                }
            }
        }

        Ok(DaySheet {
            user: user.to_string(),
            date,
            entries: store.list_logs(&filter).await?,
            on_leave,
            month_locked,
            in_window,
        })
    }

    /// Every entry recorded for `date`.
    pub async fn logs_for_date(&self, date: NaiveDate) -> Result<Vec<LogEntry>> {
        Ok(self.storage.lock().await.list_logs(&LogFilter::on_date(date)).await?)
    }

    /// Every entry recorded by `user`.
    pub async fn logs_for_user(&self, user: &str) -> Result<Vec<LogEntry>> {
        self.user(user)?;
        Ok(self.storage.lock().await.list_logs(&LogFilter::for_user(user)).await?)
    }

    // === Leave ===

    async fn balance_of(&self, store: &S, user: &str) -> Result<LeaveBalance> {
        store
            .load_balance(user)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("leave balance for '{}'", user)))
    }

    /// Apply for a day of leave.
    pub async fn apply_leave(
        &self,
        user: &str,
        leave_type: LeaveType,
        date: NaiveDate,
        reason: &str,
    ) -> Result<LeaveId> {
        self.user(user)?;
        let mut store = self.storage.lock().await;

        let balance = self.balance_of(&store, user).await?;
        if balance.remaining(leave_type) == 0 {
            warn!(user, %leave_type, "leave rejected: no balance");
            return Err(WorkError::InsufficientBalance {
                user: user.to_string(),
                leave_type,
            });
        }

        let already = store
            .list_leaves(&LeaveFilter {
                user: Some(user.to_string()),
                date: Some(date),
                ..Default::default()
            })
            .await?;
        if !already.is_empty() {
            return Err(WorkError::Invalid(format!("{} already requested leave for {}", user, date)));
        }

        let leave = LeaveRequest {
            id: LeaveId::next_after(store.count_leaves().await?),
            user: user.to_string(),
            leave_type,
            date,
            reason: reason.to_string(),
            status: LeaveStatus::Pending,
            applied_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        };
        store.save_leave(&leave).await?;

        info!(leave = %leave.id, user, %leave_type, %date, "leave applied");
        Ok(leave.id)
    }

    /// Approve a pending leave request and take one day off the balance.
    ///
    /// The balance is checked again here, so approvals can never drive it
    /// below zero.
    pub async fn approve_leave(&self, leave_id: LeaveId, approver: &str) -> Result<LeaveRequest> {
        self.management(approver, "approve leave")?;
        let mut store = self.storage.lock().await;

        let mut leave = store
            .load_leave(leave_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("leave {}", leave_id)))?;
        if leave.user == approver {
            return Err(WorkError::unauthorized(approver, "approve their own leave"));
        }
        if leave.is_approved() {
            return Err(WorkError::Invalid(format!("{} is already approved", leave_id)));
        }

        let mut balance = self.balance_of(&store, &leave.user).await?;
        if !balance.debit(leave.leave_type) {
            warn!(leave = %leave_id, user = %leave.user, "approval rejected: balance exhausted");
            return Err(WorkError::InsufficientBalance {
                user: leave.user.clone(),
                leave_type: leave.leave_type,
            });
        }

        leave.status = LeaveStatus::Approved;
        leave.approved_by = Some(approver.to_string());
        leave.approved_at = Some(Utc::now());
        store.save_balance(&leave.user, &balance).await?;
        store.save_leave(&leave).await?;

        info!(
            leave = %leave_id,
            user = %leave.user,
            approver,
            remaining = balance.remaining(leave.leave_type),
            "leave approved"
        );
        Ok(leave)
    }

    /// Leave requests matching the filter.
    pub async fn list_leaves(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>> {
        Ok(self.storage.lock().await.list_leaves(filter).await?)
    }

    /// Requests awaiting approval.
    pub async fn pending_leaves(&self) -> Result<Vec<LeaveRequest>> {
        self.list_leaves(&LeaveFilter::pending()).await
    }

    /// Remaining leave per type.
    pub async fn leave_balance(&self, user: &str) -> Result<BTreeMap<LeaveType, u32>> {
        self.user(user)?;
        let store = self.storage.lock().await;
        Ok(self.balance_of(&store, user).await?.as_map().clone())
    }

    // === Monthly approval ===

    /// Approve and permanently lock a user's month. Approving twice is
    /// reported, not rejected.
    pub async fn approve_month(&self, approver: &str, user: &str, month: u32, year: i32) -> Result<MonthApproval> {
        self.management(approver, "approve months")?;
        self.user(user)?;
        let key = MonthKey::new(user, month, year);
        if key.bounds().is_none() {
            return Err(WorkError::Invalid(format!("no such month: {}-{}", year, month)));
        }

        let mut store = self.storage.lock().await;
        if store.load_month_lock(&key).await?.is_some() {
            debug!(month = %key, "month already approved");
            return Ok(MonthApproval::AlreadyApproved);
        }

        let lock = MonthLock {
            key,
            approved_by: approver.to_string(),
            approved_at: Utc::now(),
        };
        store.save_month_lock(&lock).await?;

        info!(month = %lock.key, approver, "month approved");
        Ok(MonthApproval::Approved)
    }

    /// Whether a user's month is locked.
    pub async fn is_month_approved(&self, user: &str, month: u32, year: i32) -> Result<bool> {
        self.user(user)?;
        let key = MonthKey::new(user, month, year);
        Ok(self.storage.lock().await.load_month_lock(&key).await?.is_some())
    }

    // === Views ===

    /// Dashboard for `user`: the team overview for management, own task
    /// counts for field staff.
    pub async fn dashboard(&self, user: &str) -> Result<Dashboard> {
        let viewer = self.user(user)?;
        let tasks = self.storage.lock().await.list_tasks(&TaskFilter::default()).await?;

        match viewer.role {
            Role::Management => {
                let mut pending_by_user: BTreeMap<String, usize> = self
                    .roster
                    .with_role(Role::Field)
                    .map(|u| (u.name.clone(), 0))
                    .collect();
                let pending: Vec<Task> = tasks.iter().filter(|t| t.is_pending()).cloned().collect();
                for task in &pending {
                    *pending_by_user.entry(task.assigned_to.clone()).or_insert(0) += 1;
                }
                Ok(Dashboard::Team {
                    tasks,
                    pending,
                    pending_by_user,
                })
            }
            Role::Field => {
                let summary = TaskSummary::of(tasks.iter().filter(|t| t.assigned_to == viewer.name));
                let tasks = tasks.into_iter().filter(|t| self.policy.can_view(viewer, t)).collect();
                Ok(Dashboard::Personal { tasks, summary })
            }
        }
    }

    /// A user's month. Field staff may only read their own.
    pub async fn timesheet(&self, viewer: &str, user: &str, month: u32, year: i32) -> Result<Timesheet> {
        let reader = self.user(viewer)?;
        self.user(user)?;
        if reader.role == Role::Field && reader.name != user {
            return Err(WorkError::unauthorized(viewer, format!("read the timesheet of {}", user)));
        }

        let key = MonthKey::new(user, month, year);
        let (from, to) = key
            .bounds()
            .ok_or_else(|| WorkError::Invalid(format!("no such month: {}-{}", year, month)))?;

        let store = self.storage.lock().await;
        let mut entries = store
            .list_logs(&LogFilter {
                between: Some((from, to)),
                ..LogFilter::for_user(user)
            })
            .await?;
        entries.sort_by_key(|e| (e.date, e.id));
        let approval = store.load_month_lock(&key).await?;

        Ok(Timesheet {
            month: key,
            entries,
            approval,
        })
    }

    /// Every log entry, for management review.
    pub async fn team_logs(&self, viewer: &str) -> Result<Vec<LogEntry>> {
        self.management(viewer, "read team timesheets")?;
        Ok(self.storage.lock().await.list_logs(&LogFilter::default()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use ncwork_core::{IndianState, LeaveAllowance, ON_LEAVE_DESCRIPTION};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn today() -> NaiveDate {
        date(6, 10)
    }

    fn config() -> WorkConfig {
        WorkConfig {
            roster: Roster::new(vec![
                User::new("A", Role::Field),
                User::new("B", Role::Field),
                User::new("C", Role::Field),
                User::new("X", Role::Management),
                User::new("Y", Role::Management),
                User::new("Z", Role::Management),
            ]),
            ..WorkConfig::default()
        }
    }

    async fn tracker_with(config: WorkConfig) -> WorkTracker<MemoryStorage> {
        WorkTracker::in_memory(config)
            .await
            .unwrap()
            .with_clock(Arc::new(FixedClock(today())))
    }

    async fn tracker() -> WorkTracker<MemoryStorage> {
        tracker_with(config()).await
    }

    fn call(person: &str, state: StateRef) -> NewCallLog {
        NewCallLog {
            person: person.to_string(),
            call_type: CallType::Client,
            state,
            description: "Follow-up on quote".to_string(),
            task: None,
        }
    }

    fn meeting() -> NewMeetingLog {
        NewMeetingLog {
            scope: MeetingScope::Government,
            mode: MeetingMode::Offline,
            participants: "District office".to_string(),
            outcome: "Permit approved".to_string(),
            task: None,
        }
    }

    // === Tasks ===

    #[tokio::test]
    async fn test_task_ids_strictly_increase() {
        let tracker = tracker().await;
        let mut last = None;
        for i in 0..5 {
            let id = tracker
                .create_task(NewTask::new(format!("T{}", i), "", "A", "X"))
                .await
                .unwrap();
            if let Some(prev) = last {
                assert!(id > prev);
            }
            last = Some(id);
        }
        assert_eq!(last, Some(TaskId::new(5)));
    }

    #[tokio::test]
    async fn test_assignment_rules() {
        let tracker = tracker().await;

        tracker.create_task(NewTask::new("Self", "", "A", "A")).await.unwrap();

        let err = tracker.create_task(NewTask::new("Other", "", "B", "A")).await.unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));

        let err = tracker.create_task(NewTask::new("Peer", "", "Y", "X")).await.unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));

        let err = tracker.create_task(NewTask::new("Ghost", "", "Q", "X")).await.unwrap_err();
        assert!(matches!(err, WorkError::NotFound(_)));

        // Rejected creations do not consume ids
        let id = tracker.create_task(NewTask::new("Next", "", "B", "X")).await.unwrap();
        assert_eq!(id, TaskId::new(2));
    }

    #[tokio::test]
    async fn test_task_validation() {
        let tracker = tracker().await;

        let err = tracker.create_task(NewTask::new("  ", "", "A", "X")).await.unwrap_err();
        assert!(matches!(err, WorkError::Invalid(_)));

        let backwards = NewTask::new("Survey", "", "A", "X").with_dates(date(6, 12), date(6, 11));
        assert!(matches!(tracker.create_task(backwards).await, Err(WorkError::Invalid(_))));

        let bad_reporter = NewTask::new("Survey", "", "A", "X").with_reporters(vec!["Q".to_string()]);
        assert!(matches!(tracker.create_task(bad_reporter).await, Err(WorkError::NotFound(_))));

        let ok = NewTask::new("Survey", "Site", "A", "X")
            .with_dates(date(6, 11), date(6, 14))
            .with_reporters(vec!["B".to_string()]);
        let id = tracker.create_task(ok).await.unwrap();
        let task = tracker.get_task(id).await.unwrap();
        assert_eq!(task.status, TaskStatus::ToDo);
        assert_eq!(task.end_date, Some(date(6, 14)));
    }

    #[tokio::test]
    async fn test_status_edit_rights() {
        let tracker = tracker().await;
        let spec = NewTask::new("Cabling", "", "A", "X").with_reporters(vec!["B".to_string()]);
        let id = tracker.create_task(spec).await.unwrap();

        tracker.set_task_status(id, TaskStatus::Running, "A").await.unwrap();
        tracker.set_task_status(id, TaskStatus::Done, "B").await.unwrap();
        // Unconstrained transitions: back to ToDo is allowed
        tracker.set_task_status(id, TaskStatus::ToDo, "Y").await.unwrap();

        let err = tracker.set_task_status(id, TaskStatus::Closed, "C").await.unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));
        assert_eq!(tracker.get_task(id).await.unwrap().status, TaskStatus::ToDo);

        let err = tracker
            .set_task_status(TaskId::new(99), TaskStatus::Done, "X")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_visible_tasks() {
        let tracker = tracker().await;
        tracker.create_task(NewTask::new("T1", "", "A", "X")).await.unwrap();
        tracker.create_task(NewTask::new("T2", "", "B", "X")).await.unwrap();

        assert_eq!(tracker.visible_tasks("A").await.unwrap().len(), 1);
        assert_eq!(tracker.visible_tasks("C").await.unwrap().len(), 0);
        assert_eq!(tracker.visible_tasks("Z").await.unwrap().len(), 2);
        assert_eq!(tracker.list_tasks(&TaskFilter::assigned_to("B")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_after_task_done() {
        let tracker = tracker().await;
        let id = tracker.create_task(NewTask::new("T1", "", "A", "X")).await.unwrap();
        tracker.set_task_status(id, TaskStatus::Running, "A").await.unwrap();
        tracker.set_task_status(id, TaskStatus::Done, "A").await.unwrap();

        match tracker.dashboard("X").await.unwrap() {
            Dashboard::Team { tasks, pending, pending_by_user } => {
                assert_eq!(tasks.len(), 1);
                assert_eq!(tasks[0].title, "T1");
                assert_eq!(tasks[0].status, TaskStatus::Done);
                assert!(pending.is_empty());
                assert_eq!(pending_by_user.get("A"), Some(&0));
            }
            other => panic!("expected team dashboard, got {:?}", other),
        }

        match tracker.dashboard("A").await.unwrap() {
            Dashboard::Personal { summary, .. } => {
                assert_eq!(summary.total, 1);
                assert_eq!(summary.completed, 1);
                assert_eq!(summary.running, 0);
            }
            other => panic!("expected personal dashboard, got {:?}", other),
        }
    }

    // === Logs ===

    #[tokio::test]
    async fn test_work_log_with_task() {
        let tracker = tracker().await;
        let mine = tracker.create_task(NewTask::new("Mine", "", "A", "X")).await.unwrap();
        let theirs = tracker.create_task(NewTask::new("Theirs", "", "B", "X")).await.unwrap();

        tracker
            .add_work_log("A", today(), Some(mine), "Pulled cable", Some(UpdateType::Progress))
            .await
            .unwrap();

        let err = tracker
            .add_work_log("A", today(), Some(theirs), "Helped", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));

        let err = tracker
            .add_work_log("A", today(), Some(TaskId::new(42)), "Nothing", None)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::NotFound(_)));

        let err = tracker.add_work_log("A", today(), None, " ", None).await.unwrap_err();
        assert!(matches!(err, WorkError::Invalid(_)));

        let logs = tracker.logs_for_user("A").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].task(), Some(mine));
    }

    #[tokio::test]
    async fn test_editable_window() {
        let tracker = tracker().await;
        tracker.add_work_log("A", date(6, 4), None, "Backfill", None).await.unwrap();

        let err = tracker.add_work_log("A", date(6, 3), None, "Too old", None).await.unwrap_err();
        assert!(matches!(err, WorkError::OutsideEditableWindow { .. }));

        let err = tracker.add_work_log("A", date(6, 11), None, "Future", None).await.unwrap_err();
        assert!(matches!(err, WorkError::OutsideEditableWindow { .. }));

        assert!(!tracker.can_log_work("A", date(6, 3)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unbounded_window() {
        let tracker = tracker_with(WorkConfig {
            editable_window_days: None,
            ..config()
        })
        .await;
        tracker.add_work_log("A", date(1, 2), None, "Old entry", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_call_and_meeting_logs() {
        let tracker = tracker().await;

        tracker
            .add_call_log("A", today(), call("Ravi", StateRef::Known(IndianState::Kerala)))
            .await
            .unwrap();
        tracker.add_meeting_log("A", today(), meeting()).await.unwrap();

        let err = tracker
            .add_call_log("A", today(), call("", StateRef::Known(IndianState::Goa)))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::Invalid(_)));

        let err = tracker
            .add_call_log("A", today(), call("Ravi", StateRef::Other("  ".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::Invalid(_)));

        let mut no_outcome = meeting();
        no_outcome.outcome = String::new();
        assert!(matches!(
            tracker.add_meeting_log("A", today(), no_outcome).await,
            Err(WorkError::Invalid(_))
        ));

        let kinds: Vec<_> = tracker
            .logs_for_date(today())
            .await
            .unwrap()
            .iter()
            .map(LogEntry::kind)
            .collect();
        assert_eq!(kinds, vec![LogKind::Call, LogKind::Meeting]);
    }

    #[tokio::test]
    async fn test_append_policy_keeps_every_entry() {
        let tracker = tracker().await;
        tracker.add_work_log("A", today(), None, "Morning", None).await.unwrap();
        tracker.add_work_log("A", today(), None, "Evening", None).await.unwrap();
        assert_eq!(tracker.logs_for_user("A").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_policy_rewrites_day() {
        let tracker = tracker_with(WorkConfig {
            log_policy: LogPolicy::Upsert,
            ..config()
        })
        .await;
        let task = tracker.create_task(NewTask::new("T1", "", "A", "X")).await.unwrap();

        let first = tracker.add_work_log("A", today(), None, "Morning", None).await.unwrap();
        let second = tracker
            .add_work_log("A", today(), Some(task), "Evening", Some(UpdateType::Completion))
            .await
            .unwrap();
        assert_eq!(first, second);

        // Calls still append alongside the single work log
        tracker
            .add_call_log("A", today(), call("Ravi", StateRef::Known(IndianState::Assam)))
            .await
            .unwrap();

        let logs = tracker.logs_for_user("A").await.unwrap();
        assert_eq!(logs.len(), 2);
        match &logs[0].detail {
            LogDetail::Work(work) => {
                assert_eq!(work.description, "Evening");
                assert_eq!(work.task, Some(task));
            }
            other => panic!("expected work log, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_duplicate() {
        let tracker = tracker_with(WorkConfig {
            log_policy: LogPolicy::Strict,
            ..config()
        })
        .await;
        tracker.add_work_log("A", today(), None, "Morning", None).await.unwrap();
        let err = tracker.add_work_log("A", today(), None, "Again", None).await.unwrap_err();
        assert!(matches!(err, WorkError::DuplicateLog { .. }));
        // Another user on the same day is unaffected
        tracker.add_work_log("B", today(), None, "Morning", None).await.unwrap();
    }

    // === Leave ===

    #[tokio::test]
    async fn test_leave_blocks_logging_and_inserts_marker_once() {
        let tracker = tracker_with(WorkConfig {
            log_policy: LogPolicy::Upsert,
            ..config()
        })
        .await;
        let day = date(6, 7);
        let leave = tracker.apply_leave("A", LeaveType::Sick, day, "Fever").await.unwrap();
        tracker.approve_leave(leave, "X").await.unwrap();

        assert!(!tracker.can_log_work("A", day).await.unwrap());
        let err = tracker.add_work_log("A", day, None, "Worked anyway", None).await.unwrap_err();
        assert!(matches!(err, WorkError::OnLeave { .. }));
        let err = tracker.add_meeting_log("A", day, meeting()).await.unwrap_err();
        assert!(matches!(err, WorkError::OnLeave { .. }));

        let sheet = tracker.open_day("A", day).await.unwrap();
        assert!(sheet.on_leave);
        assert!(!sheet.can_log());
        let again = tracker.open_day("A", day).await.unwrap();
        assert_eq!(again.entries.len(), 1);

        let logs = tracker.logs_for_user("A").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_leave_marker());
        match &logs[0].detail {
            LogDetail::Work(work) => assert_eq!(work.description, ON_LEAVE_DESCRIPTION),
            other => panic!("expected work log, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_leave_after_logging_keeps_one_work_log_per_day() {
        for policy in [LogPolicy::Upsert, LogPolicy::Strict] {
            let tracker = tracker_with(WorkConfig {
                log_policy: policy,
                ..config()
            })
            .await;
            let day = date(6, 7);
            let logged = tracker.add_work_log("A", day, None, "Site survey", None).await.unwrap();
            tracker
                .add_call_log("A", day, call("Ravi", StateRef::Known(IndianState::Assam)))
                .await
                .unwrap();
            let leave = tracker.apply_leave("A", LeaveType::Sick, day, "Fever").await.unwrap();
            tracker.approve_leave(leave, "X").await.unwrap();

            tracker.open_day("A", day).await.unwrap();
            let sheet = tracker.open_day("A", day).await.unwrap();

            let work: Vec<_> = sheet.entries.iter().filter(|e| e.kind() == LogKind::Work).collect();
            assert_eq!(work.len(), 1, "{:?}", policy);
            assert_eq!(work[0].id, logged);
            assert!(work[0].is_leave_marker());
            assert_eq!(sheet.entries.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_leave_after_logging_appends_marker_under_append() {
        let tracker = tracker().await;
        let day = date(6, 7);
        tracker.add_work_log("A", day, None, "Site survey", None).await.unwrap();
        let leave = tracker.apply_leave("A", LeaveType::Sick, day, "Fever").await.unwrap();
        tracker.approve_leave(leave, "X").await.unwrap();

        let sheet = tracker.open_day("A", day).await.unwrap();
        assert_eq!(sheet.entries.len(), 2);
        assert_eq!(sheet.entries.iter().filter(|e| e.is_leave_marker()).count(), 1);
    }

    #[tokio::test]
    async fn test_open_day_outside_window_writes_nothing() {
        let tracker = tracker().await;
        let day = date(3, 4);
        let leave = tracker.apply_leave("A", LeaveType::Casual, day, "Wedding").await.unwrap();
        tracker.approve_leave(leave, "X").await.unwrap();

        let sheet = tracker.open_day("A", day).await.unwrap();
        assert!(sheet.on_leave);
        assert!(!sheet.in_window);
        assert!(sheet.entries.is_empty());
        assert!(tracker.logs_for_user("A").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_leave_does_not_block() {
        let tracker = tracker().await;
        tracker.apply_leave("A", LeaveType::Casual, today(), "Errand").await.unwrap();
        assert!(tracker.can_log_work("A", today()).await.unwrap());
        let sheet = tracker.open_day("A", today()).await.unwrap();
        assert!(sheet.entries.is_empty());
        assert!(sheet.can_log());
    }

    #[tokio::test]
    async fn test_fifteen_casual_leaves_exhaust_balance() {
        let tracker = tracker().await;
        let mut ids = Vec::new();
        for day in 1..=15 {
            ids.push(
                tracker
                    .apply_leave("X", LeaveType::Casual, date(7, day), "Personal")
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(tracker.pending_leaves().await.unwrap().len(), 15);

        for id in ids {
            tracker.approve_leave(id, "Y").await.unwrap();
        }
        let balance = tracker.leave_balance("X").await.unwrap();
        assert_eq!(balance[&LeaveType::Casual], 0);
        assert_eq!(balance[&LeaveType::Sick], 7);

        let err = tracker
            .apply_leave("X", LeaveType::Casual, date(7, 16), "One more")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::InsufficientBalance { .. }));
        assert_eq!(tracker.list_leaves(&LeaveFilter::default()).await.unwrap().len(), 15);
        assert_eq!(tracker.leave_balance("X").await.unwrap()[&LeaveType::Casual], 0);
    }

    #[tokio::test]
    async fn test_zero_balance_rejects_without_side_effects() {
        let tracker = tracker_with(WorkConfig {
            leave_allowance: LeaveAllowance { cl: 0, sl: 7, course: 7 },
            ..config()
        })
        .await;
        let err = tracker
            .apply_leave("A", LeaveType::Casual, today(), "Trip")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::InsufficientBalance { .. }));
        assert!(tracker.list_leaves(&LeaveFilter::default()).await.unwrap().is_empty());
        assert_eq!(tracker.leave_balance("A").await.unwrap()[&LeaveType::Casual], 0);
    }

    #[tokio::test]
    async fn test_approval_rechecks_balance() {
        let tracker = tracker_with(WorkConfig {
            leave_allowance: LeaveAllowance { cl: 1, sl: 0, course: 0 },
            ..config()
        })
        .await;
        // Both pass the apply-time check while the balance is still 1
        let first = tracker.apply_leave("A", LeaveType::Casual, date(6, 3), "a").await.unwrap();
        let second = tracker.apply_leave("A", LeaveType::Casual, date(6, 4), "b").await.unwrap();

        tracker.approve_leave(first, "X").await.unwrap();
        let err = tracker.approve_leave(second, "Y").await.unwrap_err();
        assert!(matches!(err, WorkError::InsufficientBalance { .. }));
        assert_eq!(tracker.leave_balance("A").await.unwrap()[&LeaveType::Casual], 0);
        assert_eq!(tracker.pending_leaves().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_leave_approval_rules() {
        let tracker = tracker().await;
        let leave = tracker.apply_leave("X", LeaveType::Course, today(), "Training").await.unwrap();

        let err = tracker.approve_leave(leave, "A").await.unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));
        let err = tracker.approve_leave(leave, "X").await.unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));
        let err = tracker.approve_leave(LeaveId::new(9), "Y").await.unwrap_err();
        assert!(matches!(err, WorkError::NotFound(_)));

        let approved = tracker.approve_leave(leave, "Y").await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("Y"));

        let err = tracker.approve_leave(leave, "Z").await.unwrap_err();
        assert!(matches!(err, WorkError::Invalid(_)));
        assert_eq!(tracker.leave_balance("X").await.unwrap()[&LeaveType::Course], 6);
    }

    #[tokio::test]
    async fn test_duplicate_leave_date_rejected() {
        let tracker = tracker().await;
        tracker.apply_leave("A", LeaveType::Casual, today(), "a").await.unwrap();
        let err = tracker.apply_leave("A", LeaveType::Sick, today(), "b").await.unwrap_err();
        assert!(matches!(err, WorkError::Invalid(_)));
    }

    // === Monthly approval ===

    #[tokio::test]
    async fn test_month_approval_is_idempotent() {
        let tracker = tracker().await;
        assert_eq!(tracker.approve_month("X", "A", 6, 2024).await.unwrap(), MonthApproval::Approved);
        assert_eq!(
            tracker.approve_month("Y", "A", 6, 2024).await.unwrap(),
            MonthApproval::AlreadyApproved
        );
        assert!(tracker.is_month_approved("A", 6, 2024).await.unwrap());

        let sheet = tracker.timesheet("X", "A", 6, 2024).await.unwrap();
        assert_eq!(sheet.approval.unwrap().approved_by, "X");
    }

    #[tokio::test]
    async fn test_month_lock_blocks_logs() {
        let tracker = tracker().await;
        tracker.add_work_log("A", date(6, 5), None, "Before lock", None).await.unwrap();
        tracker.approve_month("X", "A", 6, 2024).await.unwrap();

        let err = tracker.add_work_log("A", today(), None, "After lock", None).await.unwrap_err();
        assert!(matches!(err, WorkError::MonthLocked(_)));
        let err = tracker
            .add_call_log("A", today(), call("Ravi", StateRef::Known(IndianState::Bihar)))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkError::MonthLocked(_)));

        // Other users and other months are unaffected
        tracker.add_work_log("B", today(), None, "Still open", None).await.unwrap();
        assert!(tracker.can_log_work("B", today()).await.unwrap());
    }

    #[tokio::test]
    async fn test_month_approval_rules() {
        let tracker = tracker().await;
        let err = tracker.approve_month("A", "A", 6, 2024).await.unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));
        let err = tracker.approve_month("X", "A", 13, 2024).await.unwrap_err();
        assert!(matches!(err, WorkError::Invalid(_)));
        let err = tracker.approve_month("X", "Q", 6, 2024).await.unwrap_err();
        assert!(matches!(err, WorkError::NotFound(_)));
        assert!(!tracker.is_month_approved("A", 6, 2024).await.unwrap());
    }

    // === Views ===

    #[tokio::test]
    async fn test_timesheet_access_and_content() {
        let tracker = tracker().await;
        tracker.add_work_log("A", date(6, 9), None, "Day one", None).await.unwrap();
        tracker.add_work_log("A", date(6, 4), None, "Earlier", None).await.unwrap();
        tracker.add_work_log("B", date(6, 9), None, "Other user", None).await.unwrap();

        let sheet = tracker.timesheet("A", "A", 6, 2024).await.unwrap();
        assert_eq!(sheet.entries.len(), 2);
        assert_eq!(sheet.entries[0].date, date(6, 4));
        assert!(!sheet.is_approved());

        let err = tracker.timesheet("A", "B", 6, 2024).await.unwrap_err();
        assert!(matches!(err, WorkError::Unauthorized { .. }));
        assert_eq!(tracker.timesheet("X", "B", 6, 2024).await.unwrap().entries.len(), 1);

        assert_eq!(tracker.team_logs("X").await.unwrap().len(), 3);
        assert!(matches!(tracker.team_logs("A").await, Err(WorkError::Unauthorized { .. })));
    }

    #[tokio::test]
    async fn test_init_seeds_balances_and_teardown() {
        let tracker = tracker().await;
        for user in ["A", "X"] {
            let balance = tracker.leave_balance(user).await.unwrap();
            assert_eq!(balance[&LeaveType::Casual], 15);
            assert_eq!(balance[&LeaveType::Course], 7);
        }
        assert!(matches!(tracker.leave_balance("Q").await, Err(WorkError::NotFound(_))));

        tracker.create_task(NewTask::new("T1", "", "A", "X")).await.unwrap();
        let storage = tracker.teardown();
        assert_eq!(storage.count_tasks().await.unwrap(), 1);
    }
}
