//! HTTP plumbing for the Gmail Purge backend
//!
//! This module provides:
//! - A [`Transport`] trait so the request path can be exercised in tests
//! - The production [`UreqTransport`] (synchronous ureq agent)
//! - A scripted [`MockTransport`] test double
//! - The [`ApiClient`] with bearer attachment and the 401
//!   refresh-and-retry coordination
//! - The single-flight [`RefreshCoordinator`]

mod client;
mod mock;
mod refresh;
mod transport;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use mock::MockTransport;
pub use refresh::RefreshCoordinator;
pub use transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
