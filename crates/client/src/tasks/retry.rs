//! Submission-failure classification and bounded manual retry

use crate::error::ApiError;

/// Maximum number of submission attempts for one job configuration
pub const MAX_SUBMIT_ATTEMPTS: u32 = 3;

/// User-facing classification of a failed submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No network path to the backend
    Offline,
    /// 401 after the refresh attempt; retrying cannot help until the
    /// user signs in or relinks the account
    AuthRequired,
    /// 429 from the backend or the Gmail API
    RateLimited,
    /// 5xx from the backend
    ServerError,
    Other,
}

impl FailureKind {
    /// Whether a manual retry of the same submission makes sense
    pub fn retryable(self) -> bool {
        !matches!(self, FailureKind::AuthRequired)
    }

    /// Message shown next to the retry control
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::Offline => {
                "Could not reach the server. Check your connection and retry."
            }
            FailureKind::AuthRequired => {
                "Your session has expired. Sign in again before retrying."
            }
            FailureKind::RateLimited => "The server is rate limiting requests. Retry in a moment.",
            FailureKind::ServerError => "The server hit an internal error. Retry in a moment.",
            FailureKind::Other => "The request was rejected. Check the filters and retry.",
        }
    }
}

/// Map an API error to its user-facing failure kind
pub fn classify(error: &ApiError) -> FailureKind {
    match error {
        ApiError::Network(_) => FailureKind::Offline,
        ApiError::Unauthorized => FailureKind::AuthRequired,
        ApiError::RateLimited => FailureKind::RateLimited,
        ApiError::Server(_) => FailureKind::ServerError,
        _ => FailureKind::Other,
    }
}

/// Counts submission attempts for one job configuration.
///
/// Reset whenever any input to the derived query changes.
#[derive(Debug, Clone)]
pub struct RetryTracker {
    attempts: u32,
    max_attempts: u32,
}

impl RetryTracker {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    /// Record an attempt; returns false when the budget was already
    /// exhausted and the attempt must not happen.
    pub fn record_attempt(&mut self) -> bool {
        if self.attempts >= self.max_attempts {
            return false;
        }
        self.attempts += 1;
        true
    }

    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The selection changed; the budget starts over
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for RetryTracker {
    fn default() -> Self {
        Self::new(MAX_SUBMIT_ATTEMPTS)
    }
}
