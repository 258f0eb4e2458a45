//! Task polling with explicit cancellation
//!
//! Polling is a cancellable scheduled task: `start_polling` hands back
//! a [`PollHandle`] the caller must keep; dropping it cancels the loop.
//! The cancellation flag is checked before every tick, so a poller
//! never outlives its owner by more than one interval slice.

use super::{fetch_status, TaskStatus};
use crate::error::ApiError;
use crate::http::ApiClient;
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Fixed interval between status polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Granularity at which the sleep re-checks the cancellation flag
const CANCEL_CHECK_SLICE: Duration = Duration::from_millis(50);

/// How a polling loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The task reached SUCCESS or FAILURE; this is its final snapshot
    Completed(TaskStatus),
    /// The owner cancelled before a terminal state was seen
    Cancelled,
}

/// Poll the task until it reaches a terminal state, the flag is set,
/// or a request fails. `on_update` sees every snapshot, including the
/// terminal one; no further polls happen after it.
pub fn poll_until_terminal(
    client: &ApiClient,
    task_id: &str,
    interval: Duration,
    cancelled: &AtomicBool,
    on_update: &mut dyn FnMut(&TaskStatus),
) -> Result<PollOutcome, ApiError> {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            debug!("Polling of task {} cancelled", task_id);
            return Ok(PollOutcome::Cancelled);
        }

        let status = fetch_status(client, task_id)?;
        on_update(&status);

        if status.is_terminal() {
            debug!("Task {} reached {:?}", task_id, status.state);
            return Ok(PollOutcome::Completed(status));
        }

        sleep_unless_cancelled(interval, cancelled);
    }
}

fn sleep_unless_cancelled(interval: Duration, cancelled: &AtomicBool) {
    let mut remaining = interval;
    while !remaining.is_zero() {
        if cancelled.load(Ordering::SeqCst) {
            return;
        }
        let slice = remaining.min(CANCEL_CHECK_SLICE);
        std::thread::sleep(slice);
        remaining -= slice;
    }
}

/// Handle to a background polling loop
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<PollOutcome, ApiError>>>,
}

impl PollHandle {
    /// Stop the loop at its next tick
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait for the loop to finish and return its outcome
    pub fn join(mut self) -> Result<PollOutcome, ApiError> {
        let thread = self
            .thread
            .take()
            .expect("poll thread already joined");
        match thread.join() {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        // Teardown cancels the timer; the detached thread exits at the
        // next flag check
        self.cancel();
    }
}

/// Start polling on a background thread
pub fn start_polling<F>(
    client: Arc<ApiClient>,
    task_id: String,
    interval: Duration,
    mut on_update: F,
) -> PollHandle
where
    F: FnMut(&TaskStatus) + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let thread = std::thread::spawn(move || {
        poll_until_terminal(&client, &task_id, interval, &flag, &mut on_update)
    });
    PollHandle {
        cancelled,
        thread: Some(thread),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenPair, TokenStore};
    use crate::http::MockTransport;
    use crate::tasks::TaskState;
    use serde_json::json;

    fn client_with(transport: Arc<MockTransport>) -> Arc<ApiClient> {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens
            .store(TokenPair {
                access_token: "a".into(),
                refresh_token: "r".into(),
            })
            .unwrap();
        Arc::new(ApiClient::with_transport("http://test/api", tokens, transport))
    }

    fn scripted_states(states: &'static [&'static str]) -> Arc<MockTransport> {
        let mut call = 0usize;
        Arc::new(MockTransport::new(move |_req| {
            let state = states[call.min(states.len() - 1)];
            call += 1;
            let body = if state == "SUCCESS" {
                json!({"status": state,
                       "result": {"status": "completed", "total": 10, "successful": 9}})
            } else {
                json!({"status": state,
                       "progress": {"current": call, "total": 10}})
            };
            Ok(MockTransport::ok(body))
        }))
    }

    #[test]
    fn test_polling_stops_at_terminal_state() {
        let transport = scripted_states(&["PENDING", "PROGRESS", "SUCCESS"]);
        let client = client_with(Arc::clone(&transport));

        let cancelled = AtomicBool::new(false);
        let mut seen = Vec::new();
        let outcome = poll_until_terminal(
            &client,
            "t-1",
            Duration::ZERO,
            &cancelled,
            &mut |status| seen.push(status.state),
        )
        .unwrap();

        assert_eq!(
            seen,
            [TaskState::Pending, TaskState::Progress, TaskState::Success]
        );
        match outcome {
            PollOutcome::Completed(status) => {
                assert_eq!(status.processed_count(), Some(9));
            }
            other => panic!("expected completion, got {:?}", other),
        }
        // Exactly one poll per state, none after the terminal one
        assert_eq!(transport.count_path("/api/tasks/t-1/"), 3);
    }

    #[test]
    fn test_cancellation_before_first_tick() {
        let transport = scripted_states(&["PENDING"]);
        let client = client_with(Arc::clone(&transport));

        let cancelled = AtomicBool::new(true);
        let outcome = poll_until_terminal(
            &client,
            "t-1",
            Duration::ZERO,
            &cancelled,
            &mut |_| panic!("no update expected"),
        )
        .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(transport.requests().len(), 0);
    }

    #[test]
    fn test_poll_error_propagates() {
        let transport = Arc::new(MockTransport::new(|_req| {
            Ok(MockTransport::json_response(503, json!({"detail": "down"})))
        }));
        let client = client_with(transport);

        let cancelled = AtomicBool::new(false);
        let result =
            poll_until_terminal(&client, "t-1", Duration::ZERO, &cancelled, &mut |_| {});
        assert!(matches!(result, Err(ApiError::Server(503))));
    }

    #[test]
    fn test_background_handle_completes() {
        let transport = scripted_states(&["PENDING", "SUCCESS"]);
        let client = client_with(transport);

        let handle = start_polling(client, "t-7".into(), Duration::from_millis(10), |_| {});
        match handle.join().unwrap() {
            PollOutcome::Completed(status) => assert!(status.is_terminal()),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_background_handle_cancel() {
        // Task never finishes; cancellation must end the loop
        let transport = scripted_states(&["PENDING"]);
        let client = client_with(transport);

        let handle = start_polling(client, "t-8".into(), Duration::from_secs(60), |_| {});
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(handle.join().unwrap(), PollOutcome::Cancelled);
    }
}
