//! API client for the Gmail Purge backend
//!
//! Resolves paths against the configured base URL, attaches the bearer
//! credential to every request except the auth endpoints, and owns the
//! 401 handling: one coordinated refresh, then exactly one retry of the
//! original request.

use super::refresh::RefreshCoordinator;
use super::transport::{HttpRequest, HttpResponse, Method, Transport, UreqTransport};
use crate::auth::{TokenPair, TokenStore};
use crate::error::{ApiError, ValidationErrors};
use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Default backend base URL (a local development server)
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Environment variable overriding the base URL
const BASE_URL_ENV: &str = "GPURGE_API_URL";

/// Optional settings file in the config directory
const SETTINGS_FILE: &str = "settings.json";

const REFRESH_PATH: &str = "/auth/refresh/";

#[derive(Deserialize)]
struct Settings {
    api_base_url: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    // Absent when the backend doesn't rotate refresh tokens
    refresh: Option<String>,
}

/// Whether a request carries the stored access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

/// HTTP client for the backend REST surface
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a client with the production transport
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Self {
        Self::with_transport(base_url, tokens, Arc::new(UreqTransport::new()))
    }

    /// Create a client over an arbitrary transport (tests)
    pub fn with_transport(
        base_url: impl Into<String>,
        tokens: Arc<TokenStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            transport,
            tokens,
            refresh: RefreshCoordinator::new(),
        }
    }

    /// Create a client using the resolved base URL:
    /// 1. `GPURGE_API_URL` environment variable
    /// 2. `api_base_url` in ~/.config/gpurge/settings.json
    /// 3. the built-in default
    pub fn from_env(tokens: Arc<TokenStore>) -> Self {
        Self::new(Self::resolve_base_url(), tokens)
    }

    fn resolve_base_url() -> String {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                return url;
            }
        }
        if config::config_exists(SETTINGS_FILE) {
            match config::load_json::<Settings>(SETTINGS_FILE) {
                Ok(settings) => return settings.api_base_url,
                Err(e) => warn!("Ignoring unreadable {}: {}", SETTINGS_FILE, e),
            }
        }
        DEFAULT_BASE_URL.to_string()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // === Typed helpers ===

    /// GET with bearer credential
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::Get, path, None, Auth::Bearer)?.json()
    }

    /// POST with bearer credential
    pub fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::Post, path, Some(body), Auth::Bearer)?
            .json()
    }

    /// POST without credentials (login, registration, refresh)
    pub fn post_unauthenticated<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::Post, path, Some(body), Auth::None)?
            .json()
    }

    /// DELETE with bearer credential
    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::Delete, path, None, Auth::Bearer)?
            .json()
    }

    /// POST with bearer credential, ignoring the response body
    pub fn post_and_ignore(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::Post, path, Some(body), Auth::Bearer)?;
        Ok(())
    }

    // === Request path ===

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        auth: Auth,
    ) -> Result<HttpResponse, ApiError> {
        let bearer_used = match auth {
            Auth::Bearer => self.tokens.access_token(),
            Auth::None => None,
        };

        let mut request = HttpRequest::new(method, self.url(path)).with_bearer(bearer_used.clone());
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let response = self.transport.execute(&request)?;
        if response.status != 401 || auth == Auth::None {
            return Self::map_response(response);
        }

        // Authorization failure: one coordinated refresh, one retry.
        debug!("401 on {}, attempting token refresh", path);
        self.ensure_fresh_token(bearer_used.as_deref())?;

        let retry = request.with_bearer(self.tokens.access_token());
        let response = self.transport.execute(&retry)?;
        if response.status == 401 {
            // The retry marker is set; surface the failure unchanged
            return Err(ApiError::Unauthorized);
        }
        Self::map_response(response)
    }

    /// Make sure the stored access token is newer than the one the
    /// failing request used, refreshing through the coordinator if not.
    fn ensure_fresh_token(&self, used: Option<&str>) -> Result<(), ApiError> {
        if self.tokens.refresh_token().is_none() {
            return Err(ApiError::Unauthorized);
        }

        // Someone else may have already rotated the pair while this
        // request was in flight; if so, retrying with the stored token
        // is enough.
        if self.tokens.access_token().as_deref() != used {
            return Ok(());
        }

        let refreshed = self.refresh.run(|| self.perform_refresh());
        if refreshed {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    /// Execute the refresh call itself. Runs at most once at a time,
    /// under the coordinator. Returns whether a new pair was stored.
    fn perform_refresh(&self) -> bool {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            return false;
        };

        let request = HttpRequest::new(Method::Post, self.url(REFRESH_PATH))
            .with_body(serde_json::json!({ "refresh": refresh_token }));

        let outcome = self
            .transport
            .execute(&request)
            .and_then(|response| {
                if response.is_success() {
                    response.json::<RefreshResponse>()
                } else {
                    Err(ApiError::Unauthorized)
                }
            })
            .and_then(|rotated| {
                let pair = TokenPair {
                    access_token: rotated.access,
                    // Keep the old refresh token when rotation is off
                    refresh_token: rotated.refresh.unwrap_or(refresh_token),
                };
                self.tokens.store(pair)
            });

        match outcome {
            Ok(()) => {
                debug!("Token refresh succeeded");
                true
            }
            Err(e) => {
                // Terminal refresh failure: hard reset of the stored
                // credentials, every waiter gets the original 401
                warn!("Token refresh failed, clearing credentials: {}", e);
                if let Err(e) = self.tokens.clear() {
                    warn!("Failed to clear credentials: {}", e);
                }
                false
            }
        }
    }

    fn map_response(response: HttpResponse) -> Result<HttpResponse, ApiError> {
        if response.is_success() {
            return Ok(response);
        }
        match response.status {
            401 => Err(ApiError::Unauthorized),
            429 => Err(ApiError::RateLimited),
            status if status >= 500 => Err(ApiError::Server(status)),
            400 => {
                if let Some(errors) = response.json_value().as_ref().and_then(ValidationErrors::from_json)
                {
                    Err(ApiError::Validation(errors))
                } else {
                    Err(ApiError::Http {
                        status: 400,
                        message: response.message(),
                    })
                }
            }
            status => Err(ApiError::Http {
                status,
                message: response.message(),
            }),
        }
    }
}
