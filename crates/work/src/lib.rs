//! Work Tracking
//!
//! Access policy, task/log/leave workflows, monthly approval and the
//! dashboard and timesheet views built on top of them.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod policy;
pub mod views;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, LogPolicy, WorkConfig};
pub use error::{Result, WorkError};
pub use manager::{NewCallLog, NewMeetingLog, NewTask, WorkTracker};
pub use policy::{AccessPolicy, LogBlock};
pub use views::{Dashboard, DaySheet, TaskSummary, Timesheet};
