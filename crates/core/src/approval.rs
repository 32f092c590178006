//! Monthly timesheet approval locks.

use serde::{Deserialize, Serialize};
use chrono::{Datelike, NaiveDate};
use crate::Time;

/// A (user, month, year) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    /// User name
    pub user: String,
    /// Month, 1-12
    pub month: u32,
    /// Calendar year
    pub year: i32,
}

impl MonthKey {
    /// Key for an explicit month.
    pub fn new(user: impl Into<String>, month: u32, year: i32) -> Self {
        Self {
            user: user.into(),
            month,
            year,
        }
    }

    /// Key for the month containing `date`.
    pub fn of(user: impl Into<String>, date: NaiveDate) -> Self {
        Self::new(user, date.month(), date.year())
    }

    /// First and last day of the month, or `None` for an invalid month.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)?
        };
        Some((first, next.pred_opt()?))
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:04}-{:02}", self.user, self.year, self.month)
    }
}

/// A permanent approval of one user's month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthLock {
    /// Locked month
    pub key: MonthKey,
    /// Approving manager
    pub approved_by: String,
    /// When approved
    pub approved_at: Time,
}

/// Outcome of a month approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthApproval {
    /// The month was locked by this call
    Approved,
    /// The month was already locked; nothing changed
    AlreadyApproved,
}
