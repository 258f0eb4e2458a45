//! Session lifecycle
//!
//! States: Unknown → Hydrating → {Authenticated, Anonymous};
//! Authenticated → Anonymous on logout or profile-fetch failure.
//! The session is always populated from the server's `/profile/`
//! response, never from locally-guessed fields.

use crate::error::ApiError;
use crate::http::ApiClient;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const LOGIN_PATH: &str = "/auth/login/";
const REGISTER_PATH: &str = "/auth/register/";
const LOGOUT_PATH: &str = "/auth/logout/";
const PROFILE_PATH: &str = "/profile/";

/// The authenticated user's identity, as confirmed by the backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub date_joined: Option<String>,
}

/// Fields accepted by the registration endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup state, before hydration has been attempted
    Unknown,
    /// A stored token exists and the profile fetch is in flight
    Hydrating,
    Authenticated(Profile),
    Anonymous,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

/// Owns the session state and the auth operations that drive it
pub struct SessionStore {
    client: Arc<ApiClient>,
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            state: Mutex::new(SessionState::Unknown),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// The current profile, if authenticated
    pub fn profile(&self) -> Option<Profile> {
        match self.state() {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap() = state;
    }

    /// Rebuild the session from stored credentials at startup.
    ///
    /// No stored token means Anonymous; a token that can't fetch the
    /// profile (even after the client's refresh attempt) is cleared.
    pub fn hydrate(&self) -> SessionState {
        if !self.client.tokens().is_present() {
            self.set_state(SessionState::Anonymous);
            return self.state();
        }

        self.set_state(SessionState::Hydrating);
        match self.client.get::<Profile>(PROFILE_PATH) {
            Ok(profile) => {
                info!("Session rehydrated for {}", profile.username);
                self.set_state(SessionState::Authenticated(profile));
            }
            Err(e) => {
                warn!("Session rehydration failed: {}", e);
                if let Err(e) = self.client.tokens().clear() {
                    warn!("Failed to clear credentials: {}", e);
                }
                self.set_state(SessionState::Anonymous);
            }
        }
        self.state()
    }

    /// Exchange credentials for a token pair, then fetch the profile so
    /// the session reflects server-confirmed identity.
    pub fn login(&self, username: &str, password: &str) -> Result<Profile, ApiError> {
        let response: LoginResponse = self.client.post_unauthenticated(
            LOGIN_PATH,
            &serde_json::json!({ "username": username, "password": password }),
        )?;

        self.client.tokens().store(crate::auth::TokenPair {
            access_token: response.access,
            refresh_token: response.refresh,
        })?;

        match self.client.get::<Profile>(PROFILE_PATH) {
            Ok(profile) => {
                info!("Logged in as {}", profile.username);
                self.set_state(SessionState::Authenticated(profile.clone()));
                Ok(profile)
            }
            Err(e) => {
                self.set_state(SessionState::Anonymous);
                Err(e)
            }
        }
    }

    /// Create an account, then log straight in with the same
    /// credentials. Field-level problems surface as
    /// [`ApiError::Validation`].
    pub fn register(&self, form: &Registration) -> Result<Profile, ApiError> {
        let _: serde_json::Value = self.client.post_unauthenticated(REGISTER_PATH, form)?;
        self.login(&form.username, &form.password)
    }

    /// Terminate the session. The server call is best-effort; local
    /// credentials and state are cleared unconditionally.
    pub fn logout(&self) {
        let body = match self.client.tokens().refresh_token() {
            Some(refresh) => serde_json::json!({ "refresh": refresh }),
            None => serde_json::json!({}),
        };
        if let Err(e) = self.client.post_and_ignore(LOGOUT_PATH, &body) {
            warn!("Server-side logout failed (ignored): {}", e);
        }
        if let Err(e) = self.client.tokens().clear() {
            warn!("Failed to clear credentials: {}", e);
        }
        self.set_state(SessionState::Anonymous);
        info!("Logged out");
    }
}
