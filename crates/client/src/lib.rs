//! Client crate - core logic for the Gmail Purge backend
//!
//! This crate provides everything the CLI needs, with no UI
//! dependencies:
//! - HTTP client with bearer attachment and coordinated token refresh
//! - Durable credential-pair storage and the session state machine
//! - Google account link tracking and OAuth callback handling
//! - Gmail search-query construction and job validation
//! - Bulk-job submission, cancellable status polling, retry policy

pub mod auth;
pub mod error;
pub mod google;
pub mod http;
pub mod query;
pub mod tasks;

pub use auth::{Profile, Registration, SessionState, SessionStore, TokenPair, TokenStore};
pub use error::{ApiError, ValidationErrors};
pub use google::{
    AuthorizationUrl, ConnectionStatus, ConnectionStore, Connectivity, MailboxProfile,
    STATUS_SETTLE_DELAY,
    callback::{CallbackDisposition, CallbackParams, classify as classify_callback},
};
pub use http::{ApiClient, MockTransport, Transport, DEFAULT_BASE_URL};
pub use query::{
    AgeBucket, Category, JobRequest, JobSelection, OperationKind, build_query, MAX_EMAILS,
    MIN_EMAILS,
};
pub use tasks::{
    FailureKind, PollHandle, PollOutcome, RetryTracker, TaskProgress, TaskResult, TaskState,
    TaskStatus, classify as classify_failure, fetch_status, poll_until_terminal, start_polling,
    submit, MAX_SUBMIT_ATTEMPTS, POLL_INTERVAL,
};
