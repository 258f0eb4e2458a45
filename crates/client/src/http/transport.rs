//! Transport trait and the production ureq implementation

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP methods used against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// A request as seen by the transport: fully-resolved URL, optional
/// bearer credential, optional JSON body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The path component of the URL (for logging and test assertions)
    pub fn path(&self) -> &str {
        let after_scheme = match self.url.find("://") {
            Some(i) => &self.url[i + 3..],
            None => self.url.as_str(),
        };
        match after_scheme.find('/') {
            Some(i) => {
                let path = &after_scheme[i..];
                path.split('?').next().unwrap_or(path)
            }
            None => "/",
        }
    }
}

/// A raw response: status code plus body bytes. Status-to-error mapping
/// happens in the client, not here, so error bodies stay readable.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON into a typed value
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Decode the body as an untyped JSON value, if it is JSON at all
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Best-effort human-readable message from an error body
    pub fn message(&self) -> String {
        if let Some(value) = self.json_value() {
            for key in ["detail", "message", "error"] {
                if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                    return msg.to_string();
                }
            }
        }
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

/// Trait for executing HTTP requests
///
/// The production implementation is [`UreqTransport`]; tests use
/// [`MockTransport`](super::MockTransport). Transport errors are
/// connection-level failures only; any status code is a successful
/// execution from the transport's point of view.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Production transport backed by a shared ureq agent
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Request timeout applied to every call
    const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            // Keep non-2xx responses as responses so their bodies
            // (validation maps, error details) can be inspected
            .http_status_as_error(false)
            .timeout_global(Some(Self::TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let bearer = request
            .bearer
            .as_ref()
            .map(|token| format!("Bearer {}", token));

        let result = match (request.method, &request.body) {
            (Method::Get, _) => {
                let mut req = self.agent.get(&request.url);
                if let Some(value) = &bearer {
                    req = req.header("Authorization", value);
                }
                req.call()
            }
            (Method::Delete, _) => {
                let mut req = self.agent.delete(&request.url);
                if let Some(value) = &bearer {
                    req = req.header("Authorization", value);
                }
                req.call()
            }
            (Method::Post, Some(body)) => {
                let mut req = self.agent.post(&request.url);
                if let Some(value) = &bearer {
                    req = req.header("Authorization", value);
                }
                req.send_json(body)
            }
            (Method::Post, None) => {
                let mut req = self.agent.post(&request.url);
                if let Some(value) = &bearer {
                    req = req.header("Authorization", value);
                }
                req.send_empty()
            }
        };

        let mut response = result.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path_extraction() {
        let req = HttpRequest::new(Method::Get, "http://localhost:8000/api/profile/");
        assert_eq!(req.path(), "/api/profile/");

        let req = HttpRequest::new(
            Method::Get,
            "http://localhost:8000/api/auth/google/callback/?code=x&state=y",
        );
        assert_eq!(req.path(), "/api/auth/google/callback/");
    }

    #[test]
    fn test_response_json_decode() {
        let resp = HttpResponse {
            status: 200,
            body: br#"{"access": "a", "refresh": "r"}"#.to_vec(),
        };
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["access"], "a");
        assert!(resp.is_success());
    }

    #[test]
    fn test_response_message_prefers_detail() {
        let resp = HttpResponse {
            status: 400,
            body: br#"{"detail": "Invalid Credentials"}"#.to_vec(),
        };
        assert_eq!(resp.message(), "Invalid Credentials");

        let resp = HttpResponse {
            status: 500,
            body: b"Internal Server Error".to_vec(),
        };
        assert_eq!(resp.message(), "Internal Server Error");
    }
}
