//! Access policy.
//!
//! Pure role and ownership rules. Checks that need stored state (month
//! locks, approved leave) live in the tracker and reuse [`LogBlock`].

use chrono::{Duration, NaiveDate};
use ncwork_core::{MonthKey, Role, Task, User};
use crate::error::WorkError;

/// Role/ownership rules plus the editable log window.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    editable_window_days: Option<u32>,
}

impl AccessPolicy {
    /// Create a policy. `editable_window_days` counts today.
    pub fn new(editable_window_days: Option<u32>) -> Self {
        Self { editable_window_days }
    }

    /// Management sees everything; field staff see tasks they are assigned
    /// to or report on.
    pub fn can_view(&self, user: &User, task: &Task) -> bool {
        match user.role {
            Role::Management => true,
            Role::Field => task.involves(&user.name),
        }
    }

    /// Same rule as viewing: whoever may see a task may change its status.
    pub fn can_edit(&self, user: &User, task: &Task) -> bool {
        self.can_view(user, task)
    }

    /// Whether `creator` may create a task assigned to `assignee`.
    pub fn can_assign(&self, creator: &User, assignee: &User) -> bool {
        match creator.role {
            Role::Management => assignee.role == Role::Field,
            Role::Field => creator.name == assignee.name,
        }
    }

    /// Inclusive range of dates open for logging, if bounded.
    pub fn editable_window(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        self.editable_window_days.map(|days| {
            let back = i64::from(days.saturating_sub(1));
            (today - Duration::days(back), today)
        })
    }

    /// Whether `date` is open for logging given `today`.
    pub fn in_window(&self, today: NaiveDate, date: NaiveDate) -> bool {
        match self.editable_window(today) {
            Some((from, to)) => date >= from && date <= to,
            None => true,
        }
    }
}

/// Reason a (user, date) pair refuses log writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBlock {
    /// Date lies outside the editable window
    OutsideWindow { from: NaiveDate, to: NaiveDate },
    /// The month has been approved
    MonthLocked,
    /// Approved leave covers the date
    OnLeave,
}

impl LogBlock {
    /// Turn the block into the error reported to the caller.
    pub fn into_error(self, user: &str, date: NaiveDate) -> WorkError {
        match self {
            LogBlock::OutsideWindow { from, to } => WorkError::OutsideEditableWindow { date, from, to },
            LogBlock::MonthLocked => WorkError::MonthLocked(MonthKey::of(user, date)),
            LogBlock::OnLeave => WorkError::OnLeave {
                user: user.to_string(),
                date,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ncwork_core::{TaskId, TaskStatus};

    fn task(assignee: &str, reporters: &[&str]) -> Task {
        Task {
            id: TaskId::new(1),
            title: "Install".to_string(),
            description: String::new(),
            assigned_to: assignee.to_string(),
            created_by: "X".to_string(),
            start_date: None,
            end_date: None,
            status: TaskStatus::ToDo,
            reporters: reporters.iter().map(|r| r.to_string()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_management_sees_all() {
        let policy = AccessPolicy::new(None);
        let x = User::new("X", Role::Management);
        assert!(policy.can_view(&x, &task("A", &[])));
        assert!(policy.can_edit(&x, &task("B", &[])));
    }

    #[test]
    fn test_field_sees_own_and_reported() {
        let policy = AccessPolicy::new(None);
        let a = User::new("A", Role::Field);
        assert!(policy.can_edit(&a, &task("A", &[])));
        assert!(policy.can_view(&a, &task("B", &["A"])));
        assert!(!policy.can_view(&a, &task("B", &[])));
        assert!(!policy.can_edit(&a, &task("B", &["C"])));
    }

    #[test]
    fn test_assignment_rules() {
        let policy = AccessPolicy::new(None);
        let a = User::new("A", Role::Field);
        let b = User::new("B", Role::Field);
        let x = User::new("X", Role::Management);
        let y = User::new("Y", Role::Management);
        assert!(policy.can_assign(&x, &a));
        assert!(!policy.can_assign(&x, &y));
        assert!(policy.can_assign(&a, &a));
        assert!(!policy.can_assign(&a, &b));
        assert!(!policy.can_assign(&a, &x));
    }

    #[test]
    fn test_seven_day_window() {
        let policy = AccessPolicy::new(Some(7));
        let today = date(10);
        assert_eq!(policy.editable_window(today), Some((date(4), date(10))));
        assert!(policy.in_window(today, date(10)));
        assert!(policy.in_window(today, date(4)));
        assert!(!policy.in_window(today, date(3)));
        assert!(!policy.in_window(today, date(11)));
    }

    #[test]
    fn test_unbounded_window() {
        let policy = AccessPolicy::new(None);
        assert!(policy.editable_window(date(10)).is_none());
        assert!(policy.in_window(date(10), date(1)));
    }

    #[test]
    fn test_block_errors() {
        let err = LogBlock::MonthLocked.into_error("A", date(5));
        assert_eq!(err.code(), "month_locked");
        let err = LogBlock::OnLeave.into_error("A", date(5));
        assert_eq!(err.code(), "on_leave");
    }
}
