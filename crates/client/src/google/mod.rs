//! Google account link tracking
//!
//! Mirrors the backend's view of the linked Gmail account and exposes
//! the connect/disconnect operations. `authenticated` is always derived
//! from the stored fields, never persisted, so it cannot drift.

pub mod callback;

use crate::error::ApiError;
use crate::http::ApiClient;
use log::{info, warn};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const AUTH_URL_PATH: &str = "/auth/google/url/";
const CALLBACK_PATH: &str = "/auth/google/callback/";
const STATUS_PATH: &str = "/auth/google/status/";
const REVOKE_PATH: &str = "/auth/google/revoke/";
const CONNECTIVITY_PATH: &str = "/gmail/connectivity/";

/// Delay before the first status refresh after authentication, so
/// freshly-stored tokens settle server-side before we read them back
pub const STATUS_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Lightweight mailbox summary returned alongside the connection status
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MailboxProfile {
    pub email_address: Option<String>,
    #[serde(default)]
    pub messages_total: u64,
    #[serde(default)]
    pub threads_total: u64,
}

/// The backend's report on the linked Gmail account
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub has_token: bool,
    #[serde(default)]
    pub is_expired: bool,
    #[serde(default)]
    pub is_connected: bool,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub profile: Option<MailboxProfile>,
}

impl ConnectionStatus {
    /// Derived, never stored: linked, working, and not expired
    pub fn authenticated(&self) -> bool {
        self.has_token && self.is_connected && !self.is_expired
    }

    /// The synthetic status recorded when the fetch fails or the
    /// account is unlinked
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Authorization URL handed out by the backend
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationUrl {
    pub auth_url: String,
    #[serde(default)]
    pub state: String,
}

/// Result of the Gmail API liveness probe
#[derive(Debug, Clone, Deserialize)]
pub struct Connectivity {
    #[serde(default)]
    pub connected: bool,
    pub error: Option<String>,
    pub profile: Option<MailboxProfile>,
}

/// Tracks the linked-mailbox state and exposes connect/disconnect
pub struct ConnectionStore {
    client: Arc<ApiClient>,
    status: Mutex<ConnectionStatus>,
    last_error: Mutex<Option<String>>,
}

impl ConnectionStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            status: Mutex::new(ConnectionStatus::disconnected()),
            last_error: Mutex::new(None),
        }
    }

    /// Snapshot of the last known status
    pub fn status(&self) -> ConnectionStatus {
        self.status.lock().unwrap().clone()
    }

    /// Message from the last failed status fetch, if any
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }

    /// Fetch and store the connection status.
    ///
    /// A no-op when the session is not authenticated. Fetch failures
    /// never propagate: the store records a synthetic disconnected
    /// status plus the error message for display.
    pub fn refresh_status(&self, session_authenticated: bool) {
        if !session_authenticated {
            return;
        }
        match self.client.get::<ConnectionStatus>(STATUS_PATH) {
            Ok(status) => {
                *self.status.lock().unwrap() = status;
                *self.last_error.lock().unwrap() = None;
            }
            Err(e) => {
                warn!("Connection status fetch failed: {}", e);
                *self.status.lock().unwrap() = ConnectionStatus::disconnected();
                *self.last_error.lock().unwrap() = Some(e.to_string());
            }
        }
    }

    /// Ask the backend for the Google authorization URL. The caller is
    /// responsible for navigating the browser to it.
    pub fn authorization_url(&self) -> Result<AuthorizationUrl, ApiError> {
        self.client.get(AUTH_URL_PATH)
    }

    /// Exchange the callback code and state nonce for a stored link,
    /// then refresh the local status.
    pub fn finalize(&self, code: &str, state: &str) -> Result<(), ApiError> {
        let path = format!(
            "{}?code={}&state={}",
            CALLBACK_PATH,
            urlencoding::encode(code),
            urlencoding::encode(state)
        );
        let _: serde_json::Value = self.client.get(&path)?;
        info!("Google account linked");
        self.refresh_status(true);
        Ok(())
    }

    /// Revoke the link server-side, then reset the local status.
    ///
    /// On failure the error propagates and the local status is left
    /// unchanged.
    pub fn revoke(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.client.delete(REVOKE_PATH)?;
        *self.status.lock().unwrap() = ConnectionStatus::disconnected();
        *self.last_error.lock().unwrap() = None;
        info!("Google account unlinked");
        Ok(())
    }

    /// Liveness probe of the Gmail API behind the backend
    pub fn connectivity(&self) -> Result<Connectivity, ApiError> {
        self.client.get(CONNECTIVITY_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenStore;
    use crate::http::MockTransport;
    use serde_json::json;

    fn store_with(transport: Arc<MockTransport>) -> ConnectionStore {
        let tokens = Arc::new(TokenStore::in_memory());
        tokens
            .store(crate::auth::TokenPair {
                access_token: "a".into(),
                refresh_token: "r".into(),
            })
            .unwrap();
        let client = Arc::new(ApiClient::with_transport(
            "http://test/api",
            tokens,
            transport,
        ));
        ConnectionStore::new(client)
    }

    fn linked_status() -> serde_json::Value {
        json!({
            "has_token": true,
            "is_expired": false,
            "is_connected": true,
            "scopes": ["https://www.googleapis.com/auth/gmail.modify"],
            "profile": {"email_address": "alice@gmail.com", "messages_total": 1200}
        })
    }

    #[test]
    fn test_authenticated_is_derived_conjunction() {
        let mut status = ConnectionStatus {
            has_token: true,
            is_expired: false,
            is_connected: true,
            ..Default::default()
        };
        assert!(status.authenticated());

        status.is_expired = true;
        assert!(!status.authenticated());

        status.is_expired = false;
        status.is_connected = false;
        assert!(!status.authenticated());

        status.is_connected = true;
        status.has_token = false;
        assert!(!status.authenticated());
    }

    #[test]
    fn test_refresh_status_noop_when_anonymous() {
        let transport = Arc::new(MockTransport::new(|_req| {
            panic!("no request expected");
        }));
        let store = store_with(Arc::clone(&transport));

        store.refresh_status(false);
        assert_eq!(store.status(), ConnectionStatus::disconnected());
    }

    #[test]
    fn test_refresh_status_stores_fetched_state() {
        let transport = Arc::new(MockTransport::new(|_req| {
            Ok(MockTransport::ok(linked_status()))
        }));
        let store = store_with(transport);

        store.refresh_status(true);
        let status = store.status();
        assert!(status.authenticated());
        assert_eq!(
            status.profile.unwrap().email_address.as_deref(),
            Some("alice@gmail.com")
        );
        assert!(store.last_error().is_none());
    }

    #[test]
    fn test_refresh_status_failure_records_disconnected() {
        let transport = Arc::new(MockTransport::new(|_req| {
            Err(ApiError::Network("connection refused".into()))
        }));
        let store = store_with(transport);

        // Must not panic or propagate
        store.refresh_status(true);
        assert_eq!(store.status(), ConnectionStatus::disconnected());
        assert!(store.last_error().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_revoke_resets_status_only_on_success() {
        let transport = Arc::new(MockTransport::new(|req| match req.path() {
            "/api/auth/google/status/" => Ok(MockTransport::ok(linked_status())),
            "/api/auth/google/revoke/" => Ok(MockTransport::ok(json!({"status": "revoked"}))),
            other => panic!("unexpected request to {}", other),
        }));
        let store = store_with(transport);
        store.refresh_status(true);
        assert!(store.status().authenticated());

        store.revoke().unwrap();
        assert_eq!(store.status(), ConnectionStatus::disconnected());
    }

    #[test]
    fn test_failed_revoke_leaves_status_unchanged() {
        let transport = Arc::new(MockTransport::new(|req| match req.path() {
            "/api/auth/google/status/" => Ok(MockTransport::ok(linked_status())),
            "/api/auth/google/revoke/" => {
                Ok(MockTransport::json_response(500, json!({"detail": "boom"})))
            }
            other => panic!("unexpected request to {}", other),
        }));
        let store = store_with(transport);
        store.refresh_status(true);

        let result = store.revoke();
        assert!(matches!(result, Err(ApiError::Server(500))));
        assert!(store.status().authenticated());
    }

    #[test]
    fn test_finalize_encodes_code_and_state() {
        let transport = Arc::new(MockTransport::new(|req| match req.path() {
            "/api/auth/google/callback/" => {
                assert!(req.url.contains("code=4%2F0abc"));
                assert!(req.url.contains("state=xyz"));
                Ok(MockTransport::ok(json!({"status": "connected"})))
            }
            "/api/auth/google/status/" => Ok(MockTransport::ok(linked_status())),
            other => panic!("unexpected request to {}", other),
        }));
        let store = store_with(transport);

        store.finalize("4/0abc", "xyz").unwrap();
        assert!(store.status().authenticated());
    }
}
