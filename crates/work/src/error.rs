//! Errors returned by the work tracker.

use chrono::NaiveDate;
use ncwork_core::{LeaveType, MonthKey};
use ncwork_storage::StorageError;

/// Result alias for tracker operations.
pub type Result<T> = std::result::Result<T, WorkError>;

/// Why a tracker operation was rejected.
///
/// None of these are fatal: the caller can correct the input and resubmit.
#[derive(Debug, thiserror::Error)]
pub enum WorkError {
    /// Leave applied for (or approved) with nothing left of that type
    #[error("{user} has no {leave_type} leave left")]
    InsufficientBalance {
        user: String,
        leave_type: LeaveType,
    },

    /// Actor lacks the role or ownership for the mutation
    #[error("{actor} is not allowed to {action}")]
    Unauthorized { actor: String, action: String },

    /// Log write against an approved month
    #[error("month {0} is approved and locked")]
    MonthLocked(MonthKey),

    /// Unknown user, task or leave id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Second work log for a day under the strict log policy
    #[error("{user} already has a work log for {date}")]
    DuplicateLog { user: String, date: NaiveDate },

    /// Log write on a day covered by approved leave
    #[error("{user} is on approved leave on {date}")]
    OnLeave { user: String, date: NaiveDate },

    /// Log write outside the trailing editable window
    #[error("{date} is outside the editable window ({from} to {to})")]
    OutsideEditableWindow {
        date: NaiveDate,
        from: NaiveDate,
        to: NaiveDate,
    },

    /// Malformed input
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Backend failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WorkError {
    pub(crate) fn unauthorized(actor: &str, action: impl Into<String>) -> Self {
        Self::Unauthorized {
            actor: actor.to_string(),
            action: action.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkError::InsufficientBalance { .. } => "insufficient_balance",
            WorkError::Unauthorized { .. } => "unauthorized",
            WorkError::MonthLocked(_) => "month_locked",
            WorkError::NotFound(_) => "not_found",
            WorkError::DuplicateLog { .. } => "duplicate_log",
            WorkError::OnLeave { .. } => "on_leave",
            WorkError::OutsideEditableWindow { .. } => "outside_editable_window",
            WorkError::Invalid(_) => "invalid",
            WorkError::Storage(_) => "storage",
        }
    }
}
