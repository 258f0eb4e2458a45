//! Bulk-job submission and task tracking
//!
//! Jobs run server-side; the client submits a validated request and
//! then watches the task record until it reaches a terminal state.

mod poll;
mod retry;

pub use poll::{PollHandle, PollOutcome, poll_until_terminal, start_polling, POLL_INTERVAL};
pub use retry::{classify, FailureKind, RetryTracker, MAX_SUBMIT_ATTEMPTS};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::query::{JobRequest, OperationKind};
use log::info;
use serde::Deserialize;

const DELETE_PATH: &str = "/gmail/delete-by-query/";
const RECOVER_PATH: &str = "/gmail/recover-by-query/";

/// Lifecycle of a server-side task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TaskState {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "PROGRESS")]
    Progress,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILURE")]
    Failure,
    /// Any state the backend's task queue reports that we don't track
    /// explicitly; treated as still running
    #[serde(other)]
    Other,
}

impl TaskState {
    /// No further transitions happen after a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }
}

/// Progress metadata reported while the task runs
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskProgress {
    #[serde(default)]
    pub current: u64,
    #[serde(default)]
    pub total: u64,
    /// Percentage, when the backend bothers to compute it
    pub progress: Option<u8>,
    pub successful: Option<u64>,
    pub failed: Option<u64>,
    pub message: Option<String>,
}

impl TaskProgress {
    /// Completion percentage for display, clamped to 100. Prefers the
    /// backend's own figure; otherwise derived from current/total.
    pub fn percent(&self) -> u64 {
        if let Some(reported) = self.progress {
            return u64::from(reported).min(100);
        }
        if self.total == 0 {
            return 0;
        }
        (self.current.saturating_mul(100) / self.total).min(100)
    }
}

/// Final payload of a finished task
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskResult {
    pub status: Option<String>,
    pub total: Option<u64>,
    pub successful: Option<u64>,
    pub failed: Option<u64>,
    pub action: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// One snapshot of a task, overwritten on every poll
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub task_id: String,
    #[serde(rename = "status")]
    pub state: TaskState,
    pub progress: Option<TaskProgress>,
    pub result: Option<TaskResult>,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// How many emails the finished job touched: the explicit
    /// `successful` count when present, otherwise the total.
    pub fn processed_count(&self) -> Option<u64> {
        let result = self.result.as_ref()?;
        result.successful.or(result.total)
    }

    /// Message to show for a FAILURE result
    pub fn failure_message(&self) -> String {
        self.result
            .as_ref()
            .and_then(|r| r.message.clone())
            .unwrap_or_else(|| "The operation failed on the server".to_string())
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    task_id: String,
}

/// Submit a validated job and return the task identifier (PENDING)
pub fn submit(client: &ApiClient, request: &JobRequest) -> Result<String, ApiError> {
    let path = match request.kind() {
        OperationKind::Delete => DELETE_PATH,
        OperationKind::Recover => RECOVER_PATH,
    };
    let body = serde_json::json!({
        "q": request.query(),
        "max_emails": request.max_emails(),
    });
    let response: SubmitResponse = client.post(path, &body)?;
    info!(
        "Submitted {:?} job {} (q={:?}, max_emails={})",
        request.kind(),
        response.task_id,
        request.query(),
        request.max_emails()
    );
    Ok(response.task_id)
}

/// Fetch the current status of a task
pub fn fetch_status(client: &ApiClient, task_id: &str) -> Result<TaskStatus, ApiError> {
    let path = format!("/tasks/{}/", task_id);
    let mut status: TaskStatus = client.get(&path)?;
    if status.task_id.is_empty() {
        status.task_id = task_id.to_string();
    }
    Ok(status)
}
