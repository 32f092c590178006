//! JSON-lines session over one in-memory tracker.
//!
//! Each input line is a request object tagged by `method`; each output line
//! is the matching response. The tracker lives for the whole session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};
use ncwork_core::{LeaveFilter, LeaveId, LeaveType, TaskFilter, TaskId, TaskStatus, UpdateType};
use ncwork_storage::MemoryStorage;
use ncwork_work::{NewCallLog, NewMeetingLog, NewTask, WorkError, WorkTracker};

/// Session request message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    Roster,
    ListTasks {
        #[serde(default)]
        filter: TaskFilter,
    },
    VisibleTasks {
        user: String,
    },
    GetTask {
        task_id: TaskId,
    },
    CreateTask(NewTask),
    SetTaskStatus {
        task_id: TaskId,
        status: TaskStatus,
        actor: String,
    },
    CanLogWork {
        user: String,
        date: NaiveDate,
    },
    AddWorkLog {
        user: String,
        date: NaiveDate,
        #[serde(default)]
        task: Option<TaskId>,
        description: String,
        #[serde(default)]
        update_type: Option<UpdateType>,
    },
    AddCallLog {
        user: String,
        date: NaiveDate,
        #[serde(flatten)]
        call: NewCallLog,
    },
    AddMeetingLog {
        user: String,
        date: NaiveDate,
        #[serde(flatten)]
        meeting: NewMeetingLog,
    },
    OpenDay {
        user: String,
        date: NaiveDate,
    },
    LogsForDate {
        date: NaiveDate,
    },
    LogsForUser {
        user: String,
    },
    ApplyLeave {
        user: String,
        leave_type: LeaveType,
        date: NaiveDate,
        #[serde(default)]
        reason: String,
    },
    ApproveLeave {
        leave_id: LeaveId,
        approver: String,
    },
    ListLeaves {
        #[serde(default)]
        filter: LeaveFilter,
    },
    LeaveBalance {
        user: String,
    },
    ApproveMonth {
        approver: String,
        user: String,
        month: u32,
        year: i32,
    },
    IsMonthApproved {
        user: String,
        month: u32,
        year: i32,
    },
    Dashboard {
        user: String,
    },
    Timesheet {
        viewer: String,
        user: String,
        month: u32,
        year: i32,
    },
    TeamLogs {
        viewer: String,
    },
    Ping,
}

/// A request line: optional correlation id plus the request itself.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Option<Value>,
    #[serde(flatten)]
    request: Request,
}

/// Session response message.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl Response {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Option<Value>, kind: &str, message: String) -> Self {
        Self {
            id,
            result: None,
            error: Some(ErrorBody {
                kind: kind.to_string(),
                message,
            }),
        }
    }
}

/// Why a request produced no result.
enum Failure {
    Work(WorkError),
    Encode(serde_json::Error),
}

impl From<WorkError> for Failure {
    fn from(e: WorkError) -> Self {
        Failure::Work(e)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(e: serde_json::Error) -> Self {
        Failure::Encode(e)
    }
}

/// Dispatches requests to a tracker.
pub struct Session {
    tracker: WorkTracker<MemoryStorage>,
}

impl Session {
    /// Create a session over `tracker`.
    pub fn new(tracker: WorkTracker<MemoryStorage>) -> Self {
        Self { tracker }
    }

    /// Handle one raw request line.
    pub async fn handle_line(&self, line: &str) -> Response {
        let envelope: Envelope = match serde_json::from_str(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                return Response::err(None, "parse", format!("Parse error: {}", e));
            }
        };

        debug!(request = ?envelope.request, "session request");
        match self.dispatch(envelope.request).await {
            Ok(result) => Response::ok(envelope.id, result),
            Err(Failure::Work(e)) => Response::err(envelope.id, e.code(), e.to_string()),
            Err(Failure::Encode(e)) => Response::err(envelope.id, "internal", e.to_string()),
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Value, Failure> {
        let t = &self.tracker;
        let value = match request {
            Request::Roster => serde_json::to_value(t.roster())?,
            Request::ListTasks { filter } => serde_json::to_value(t.list_tasks(&filter).await?)?,
            Request::VisibleTasks { user } => serde_json::to_value(t.visible_tasks(&user).await?)?,
            Request::GetTask { task_id } => serde_json::to_value(t.get_task(task_id).await?)?,
            Request::CreateTask(spec) => json!({ "task_id": t.create_task(spec).await? }),
            Request::SetTaskStatus { task_id, status, actor } => {
                serde_json::to_value(t.set_task_status(task_id, status, &actor).await?)?
            }
            Request::CanLogWork { user, date } => json!({ "allowed": t.can_log_work(&user, date).await? }),
            Request::AddWorkLog { user, date, task, description, update_type } => {
                let id = t.add_work_log(&user, date, task, &description, update_type).await?;
                json!({ "log_id": id })
            }
            Request::AddCallLog { user, date, call } => {
                json!({ "log_id": t.add_call_log(&user, date, call).await? })
            }
            Request::AddMeetingLog { user, date, meeting } => {
                json!({ "log_id": t.add_meeting_log(&user, date, meeting).await? })
            }
            Request::OpenDay { user, date } => {
                let sheet = t.open_day(&user, date).await?;
                let can_log = sheet.can_log();
                let mut value = serde_json::to_value(sheet)?;
                value["can_log"] = json!(can_log);
                value
            }
            Request::LogsForDate { date } => serde_json::to_value(t.logs_for_date(date).await?)?,
            Request::LogsForUser { user } => serde_json::to_value(t.logs_for_user(&user).await?)?,
            Request::ApplyLeave { user, leave_type, date, reason } => {
                json!({ "leave_id": t.apply_leave(&user, leave_type, date, &reason).await? })
            }
            Request::ApproveLeave { leave_id, approver } => {
                serde_json::to_value(t.approve_leave(leave_id, &approver).await?)?
            }
            Request::ListLeaves { filter } => serde_json::to_value(t.list_leaves(&filter).await?)?,
            Request::LeaveBalance { user } => serde_json::to_value(t.leave_balance(&user).await?)?,
            Request::ApproveMonth { approver, user, month, year } => {
                json!({ "outcome": t.approve_month(&approver, &user, month, year).await? })
            }
            Request::IsMonthApproved { user, month, year } => {
                json!({ "approved": t.is_month_approved(&user, month, year).await? })
            }
            Request::Dashboard { user } => serde_json::to_value(t.dashboard(&user).await?)?,
            Request::Timesheet { viewer, user, month, year } => {
                serde_json::to_value(t.timesheet(&viewer, &user, month, year).await?)?
            }
            Request::TeamLogs { viewer } => serde_json::to_value(t.team_logs(&viewer).await?)?,
            Request::Ping => json!({ "status": "pong" }),
        };
        Ok(value)
    }

    /// Serve requests from `input` until it closes, writing one response
    /// line per non-empty request line.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("session started");
        let mut lines = input.lines();
        let mut handled = 0usize;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line).await;
            let json = serde_json::to_string(&response)?;
            output.write_all(json.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
            handled += 1;
        }

        info!(requests = handled, "session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ncwork_core::{Role, Roster, User};
    use ncwork_work::{FixedClock, WorkConfig};

    async fn session() -> Session {
        let config = WorkConfig {
            roster: Roster::new(vec![
                User::new("A", Role::Field),
                User::new("X", Role::Management),
                User::new("Y", Role::Management),
            ]),
            ..WorkConfig::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let tracker = WorkTracker::in_memory(config)
            .await
            .unwrap()
            .with_clock(Arc::new(FixedClock(today)));
        Session::new(tracker)
    }

    async fn call(session: &Session, line: &str) -> Value {
        serde_json::to_value(session.handle_line(line).await).unwrap()
    }

    #[tokio::test]
    async fn test_task_round() {
        let s = session().await;
        let created = call(
            &s,
            r#"{"id": 1, "method": "create_task", "title": "T1", "description": "",
                "assigned_to": "A", "created_by": "X"}"#,
        )
        .await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["result"]["task_id"], 1);

        let updated = call(
            &s,
            r#"{"method": "set_task_status", "task_id": 1, "status": "done", "actor": "A"}"#,
        )
        .await;
        assert_eq!(updated["result"]["status"], "done");

        let dashboard = call(&s, r#"{"method": "dashboard", "user": "X"}"#).await;
        assert_eq!(dashboard["result"]["view"], "team");
        assert_eq!(dashboard["result"]["pending_by_user"]["A"], 0);
    }

    #[tokio::test]
    async fn test_errors_carry_kind() {
        let s = session().await;
        let denied = call(
            &s,
            r#"{"method": "approve_month", "approver": "A", "user": "A", "month": 6, "year": 2024}"#,
        )
        .await;
        assert_eq!(denied["error"]["kind"], "unauthorized");
        assert!(denied.get("result").is_none());

        let bad = call(&s, "not json").await;
        assert_eq!(bad["error"]["kind"], "parse");

        let unknown = call(&s, r#"{"method": "delete_everything"}"#).await;
        assert_eq!(unknown["error"]["kind"], "parse");
    }

    #[tokio::test]
    async fn test_leave_and_logs() {
        let s = session().await;
        let applied = call(
            &s,
            r#"{"method": "apply_leave", "user": "A", "leave_type": "SL", "date": "2024-06-07"}"#,
        )
        .await;
        assert_eq!(applied["result"]["leave_id"], 1);

        call(&s, r#"{"method": "approve_leave", "leave_id": 1, "approver": "X"}"#).await;

        let balance = call(&s, r#"{"method": "leave_balance", "user": "A"}"#).await;
        assert_eq!(balance["result"]["SL"], 6);

        let rejected = call(
            &s,
            r#"{"method": "add_call_log", "user": "A", "date": "2024-06-07", "person": "Ravi",
                "call_type": "client", "state": {"known": "kerala"}}"#,
        )
        .await;
        assert_eq!(rejected["error"]["kind"], "on_leave");

        let day = call(&s, r#"{"method": "open_day", "user": "A", "date": "2024-06-07"}"#).await;
        assert_eq!(day["result"]["can_log"], false);
        assert_eq!(day["result"]["entries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_writes_one_line_per_request() {
        let s = session().await;
        let input = b"{\"method\": \"ping\"}\n\n{\"method\": \"roster\"}\n";
        let mut output = Vec::new();
        s.run(&input[..], &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let roster: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(roster["result"][0]["name"], "A");
    }
}
