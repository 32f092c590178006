//! Daily log model - work, call and meeting entries.

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use crate::id::{LogId, TaskId};
use crate::Time;

/// Description written into the entry inserted for a day on approved leave.
pub const ON_LEAVE_DESCRIPTION: &str = "No work done – On Leave";

/// One recorded log entry for a user on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier
    pub id: LogId,

    /// Who the entry belongs to
    pub user: String,

    /// Business date the entry covers
    pub date: NaiveDate,

    /// When it was written (or last updated)
    pub recorded_at: Time,

    /// Kind-specific payload
    #[serde(flatten)]
    pub detail: LogDetail,
}

impl LogEntry {
    /// Kind of this entry.
    pub fn kind(&self) -> LogKind {
        match self.detail {
            LogDetail::Work(_) => LogKind::Work,
            LogDetail::Call(_) => LogKind::Call,
            LogDetail::Meeting(_) => LogKind::Meeting,
        }
    }

    /// Task this entry refers to, if any.
    pub fn task(&self) -> Option<TaskId> {
        match &self.detail {
            LogDetail::Work(w) => w.task,
            LogDetail::Call(c) => c.task,
            LogDetail::Meeting(m) => m.task,
        }
    }

    /// Whether this is the automatic on-leave marker.
    pub fn is_leave_marker(&self) -> bool {
        matches!(
            &self.detail,
            LogDetail::Work(WorkLog { update_type: Some(UpdateType::Leave), .. })
        )
    }
}

/// Payload of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogDetail {
    /// Work done on a task
    Work(WorkLog),
    /// Phone call
    Call(CallLog),
    /// Meeting
    Meeting(MeetingLog),
}

/// Discriminant of [`LogDetail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Task work
    Work,
    /// Phone call
    Call,
    /// Meeting
    Meeting,
}

/// Task work entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLog {
    /// Referenced task
    pub task: Option<TaskId>,

    /// What was done
    pub description: String,

    /// Kind of update
    pub update_type: Option<UpdateType>,
}

impl WorkLog {
    /// The marker entry for a day on approved leave.
    pub fn on_leave() -> Self {
        Self {
            task: None,
            description: ON_LEAVE_DESCRIPTION.to_string(),
            update_type: Some(UpdateType::Leave),
        }
    }
}

/// Kind of update a work entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// Work moved forward
    Progress,
    /// Work finished
    Completion,
    /// Work is stuck
    Blocker,
    /// Preparing upcoming work
    Planning,
    /// Written by the system for approved leave days
    Leave,
}

/// Call entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLog {
    /// Person called
    pub person: String,

    /// Call type
    pub call_type: CallType,

    /// State the call concerned
    pub state: StateRef,

    /// Notes
    pub description: String,

    /// Related task
    pub task: Option<TaskId>,
}

/// Type of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    /// Government or regulatory contact
    Official,
    /// Customer
    Client,
    /// Supplier
    Vendor,
    /// Colleague
    Internal,
}

/// A state picked from the list, or a free-text one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateRef {
    /// A listed state or union territory
    Known(IndianState),
    /// Free-text location outside the list
    Other(String),
}

impl StateRef {
    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            StateRef::Known(state) => state.name(),
            StateRef::Other(text) => text,
        }
    }
}

/// Indian states and union territories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndianState {
    /// State
    AndhraPradesh,
    /// State
    ArunachalPradesh,
    /// State
    Assam,
    /// State
    Bihar,
    /// State
    Chhattisgarh,
    /// State
    Goa,
    /// State
    Gujarat,
    /// State
    Haryana,
    /// State
    HimachalPradesh,
    /// State
    Jharkhand,
    /// State
    Karnataka,
    /// State
    Kerala,
    /// State
    MadhyaPradesh,
    /// State
    Maharashtra,
    /// State
    Manipur,
    /// State
    Meghalaya,
    /// State
    Mizoram,
    /// State
    Nagaland,
    /// State
    Odisha,
    /// State
    Punjab,
    /// State
    Rajasthan,
    /// State
    Sikkim,
    /// State
    TamilNadu,
    /// State
    Telangana,
    /// State
    Tripura,
    /// State
    UttarPradesh,
    /// State
    Uttarakhand,
    /// State
    WestBengal,
    /// Union territory
    AndamanAndNicobarIslands,
    /// Union territory
    Chandigarh,
    /// Union territory
    DadraAndNagarHaveliAndDamanAndDiu,
    /// Union territory
    Delhi,
    /// Union territory
    JammuAndKashmir,
    /// Union territory
    Ladakh,
    /// Union territory
    Lakshadweep,
    /// Union territory
    Puducherry,
}

impl IndianState {
    /// Official name.
    pub fn name(&self) -> &'static str {
        use IndianState::*;
        match self {
            AndhraPradesh => "Andhra Pradesh",
            ArunachalPradesh => "Arunachal Pradesh",
            Assam => "Assam",
            Bihar => "Bihar",
            Chhattisgarh => "Chhattisgarh",
            Goa => "Goa",
            Gujarat => "Gujarat",
            Haryana => "Haryana",
            HimachalPradesh => "Himachal Pradesh",
            Jharkhand => "Jharkhand",
            Karnataka => "Karnataka",
            Kerala => "Kerala",
            MadhyaPradesh => "Madhya Pradesh",
            Maharashtra => "Maharashtra",
            Manipur => "Manipur",
            Meghalaya => "Meghalaya",
            Mizoram => "Mizoram",
            Nagaland => "Nagaland",
            Odisha => "Odisha",
            Punjab => "Punjab",
            Rajasthan => "Rajasthan",
            Sikkim => "Sikkim",
            TamilNadu => "Tamil Nadu",
            Telangana => "Telangana",
            Tripura => "Tripura",
            UttarPradesh => "Uttar Pradesh",
            Uttarakhand => "Uttarakhand",
            WestBengal => "West Bengal",
            AndamanAndNicobarIslands => "Andaman and Nicobar Islands",
            Chandigarh => "Chandigarh",
            DadraAndNagarHaveliAndDamanAndDiu => "Dadra and Nagar Haveli and Daman and Diu",
            Delhi => "Delhi",
            JammuAndKashmir => "Jammu and Kashmir",
            Ladakh => "Ladakh",
            Lakshadweep => "Lakshadweep",
            Puducherry => "Puducherry",
        }
    }
}

/// Meeting entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingLog {
    /// Who the meeting was with
    pub scope: MeetingScope,

    /// Online or in person
    pub mode: MeetingMode,

    /// Participants
    pub participants: String,

    /// Outcome
    pub outcome: String,

    /// Related task
    pub task: Option<TaskId>,
}

/// Audience of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingScope {
    /// Within the team
    Internal,
    /// With a customer
    Client,
    /// With a government office
    Government,
    /// With a supplier
    Vendor,
}

/// How a meeting was held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingMode {
    /// Remote
    Online,
    /// In person
    Offline,
}

/// Filter for querying log entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogFilter {
    /// Only entries of this user
    pub user: Option<String>,

    /// Only entries on this date
    pub date: Option<NaiveDate>,

    /// Only entries in this inclusive date range
    pub between: Option<(NaiveDate, NaiveDate)>,

    /// Only entries of this kind
    pub kind: Option<LogKind>,
}

impl LogFilter {
    /// Entries of `user`.
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Default::default()
        }
    }

    /// Entries on `date`.
    pub fn on_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Default::default()
        }
    }

    /// Narrow to one date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Whether an entry passes this filter.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(user) = &self.user {
            if &entry.user != user {
                return false;
            }
        }
        if let Some(date) = self.date {
            if entry.date != date {
                return false;
            }
        }
        if let Some((from, to)) = self.between {
            if entry.date < from || entry.date > to {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if entry.kind() != kind {
                return false;
            }
        }
        true
    }
}
