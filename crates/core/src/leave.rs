//! Leave requests and balances.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use crate::error::ParseError;
use crate::id::LeaveId;
use crate::Time;

/// Leave category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LeaveType {
    /// Casual leave
    #[serde(rename = "CL")]
    Casual,
    /// Sick leave
    #[serde(rename = "SL")]
    Sick,
    /// Course / training leave
    #[serde(rename = "COURSE")]
    Course,
}

impl LeaveType {
    /// All leave types.
    pub const ALL: [LeaveType; 3] = [LeaveType::Casual, LeaveType::Sick, LeaveType::Course];

    /// Short code.
    pub fn code(&self) -> &'static str {
        match self {
            LeaveType::Casual => "CL",
            LeaveType::Sick => "SL",
            LeaveType::Course => "COURSE",
        }
    }
}

impl std::fmt::Display for LeaveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for LeaveType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CL" | "CASUAL" => Ok(LeaveType::Casual),
            "SL" | "SICK" => Ok(LeaveType::Sick),
            "COURSE" => Ok(LeaveType::Course),
            _ => Err(ParseError::new("leave type", s)),
        }
    }
}

/// Leave request status. Approval is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a management decision
    Pending,
    /// Approved and debited from the balance
    Approved,
}

/// A single-day leave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier
    pub id: LeaveId,

    /// Requesting user
    pub user: String,

    /// Leave category
    pub leave_type: LeaveType,

    /// Day of leave
    pub date: NaiveDate,

    /// Reason given
    pub reason: String,

    /// Current status
    pub status: LeaveStatus,

    /// When applied
    pub applied_at: Time,

    /// Approver, once approved
    pub approved_by: Option<String>,

    /// When approved
    pub approved_at: Option<Time>,
}

impl LeaveRequest {
    /// Whether the request has been approved.
    pub fn is_approved(&self) -> bool {
        self.status == LeaveStatus::Approved
    }
}

/// Filter for querying leave requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveFilter {
    /// Only requests of this user
    pub user: Option<String>,

    /// Only requests in this status
    pub status: Option<LeaveStatus>,

    /// Only requests for this date
    pub date: Option<NaiveDate>,
}

impl LeaveFilter {
    /// All pending requests.
    pub fn pending() -> Self {
        Self {
            status: Some(LeaveStatus::Pending),
            ..Default::default()
        }
    }

    /// Whether a request passes this filter.
    pub fn matches(&self, leave: &LeaveRequest) -> bool {
        self.user.as_ref().map_or(true, |u| &leave.user == u)
            && self.status.map_or(true, |s| leave.status == s)
            && self.date.map_or(true, |d| leave.date == d)
    }
}

/// Yearly allowance each user starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveAllowance {
    /// Casual leave days
    pub cl: u32,
    /// Sick leave days
    pub sl: u32,
    /// Course leave days
    pub course: u32,
}

impl Default for LeaveAllowance {
    fn default() -> Self {
        Self {
            cl: 15,
            sl: 7,
            course: 7,
        }
    }
}

/// Remaining leave per type for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaveBalance(BTreeMap<LeaveType, u32>);

impl LeaveBalance {
    /// Remaining days of `leave_type`.
    pub fn remaining(&self, leave_type: LeaveType) -> u32 {
        self.0.get(&leave_type).copied().unwrap_or(0)
    }

    /// Take one day of `leave_type`. Returns false, leaving the balance
    /// untouched, when nothing remains.
    pub fn debit(&mut self, leave_type: LeaveType) -> bool {
        match self.0.get_mut(&leave_type) {
            Some(days) if *days > 0 => {
                *days -= 1;
                true
            }
            _ => false,
        }
    }

    /// Per-type view.
    pub fn as_map(&self) -> &BTreeMap<LeaveType, u32> {
        &self.0
    }
}

impl From<LeaveAllowance> for LeaveBalance {
    fn from(allowance: LeaveAllowance) -> Self {
        Self(BTreeMap::from([
            (LeaveType::Casual, allowance.cl),
            (LeaveType::Sick, allowance.sl),
            (LeaveType::Course, allowance.course),
        ]))
    }
}
