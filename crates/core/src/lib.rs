//! ncwork core data models.
//!
//! This crate defines the records kept by the NC work tracker: the fixed
//! roster, tasks, daily logs, leave and monthly approval locks.

#![warn(missing_docs)]

// Identities
mod id;
mod user;
mod error;

// Work
mod task;
mod work_log;

// Leave & approvals
mod leave;
mod approval;

// Re-exports
pub use id::*;
pub use error::ParseError;
pub use user::{Role, User, Roster};

pub use task::{Task, TaskStatus, TaskFilter};
pub use work_log::{
    LogEntry, LogDetail, LogKind, LogFilter, WorkLog, UpdateType,
    CallLog, CallType, StateRef, IndianState,
    MeetingLog, MeetingScope, MeetingMode,
    ON_LEAVE_DESCRIPTION,
};

pub use leave::{
    LeaveRequest, LeaveType, LeaveStatus, LeaveFilter, LeaveAllowance, LeaveBalance,
};
pub use approval::{MonthKey, MonthLock, MonthApproval};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
