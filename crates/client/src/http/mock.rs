//! Scripted transport for tests
//!
//! Public (not cfg(test)) so integration tests and downstream crates can
//! exercise the full request path without a live backend.

use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::error::ApiError;
use std::sync::Mutex;

type Handler = dyn FnMut(&HttpRequest) -> Result<HttpResponse, ApiError> + Send;

/// A transport that answers requests from a caller-supplied handler and
/// records everything it sees.
pub struct MockTransport {
    handler: Mutex<Box<Handler>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: FnMut(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + 'static,
    {
        Self {
            handler: Mutex::new(Box::new(handler)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests executed so far, in arrival order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path matches exactly
    pub fn count_path(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path() == path)
            .count()
    }

    /// Build a JSON response with the given status
    pub fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Shorthand for a 200 JSON response
    pub fn ok(body: serde_json::Value) -> HttpResponse {
        Self::json_response(200, body)
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut handler = self.handler.lock().unwrap();
        handler(request)
    }
}
