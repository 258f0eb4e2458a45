//! Durable storage for the credential pair
//!
//! The access and refresh tokens live together in a single JSON file in
//! the config directory and are written and cleared as a unit: there is
//! no state in which one is present without the other.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// Filename of the persisted pair in the config directory
pub const TOKENS_FILE: &str = "tokens.json";

/// The two opaque bearer strings issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Thread-safe store for the credential pair, backed by a JSON file.
///
/// The in-memory cache and the file are kept in step: the file write
/// happens first, so a failed write never leaves the process believing
/// in credentials that won't survive a restart.
pub struct TokenStore {
    path: Option<PathBuf>,
    cached: Mutex<Option<TokenPair>>,
}

impl TokenStore {
    /// Open the store at the default config location, hydrating the
    /// cache from disk if a pair was persisted by an earlier run.
    pub fn open() -> Self {
        match config::config_path(TOKENS_FILE) {
            Some(path) => Self::at_path(path),
            None => Self::in_memory(),
        }
    }

    /// Open the store at an explicit path (tests)
    pub fn at_path(path: PathBuf) -> Self {
        let cached = config::load_json_file(&path).ok();
        Self {
            path: Some(path),
            cached: Mutex::new(cached),
        }
    }

    /// A store with no backing file; the pair lives for this process only
    pub fn in_memory() -> Self {
        Self {
            path: None,
            cached: Mutex::new(None),
        }
    }

    /// Current access token, if a pair is stored
    pub fn access_token(&self) -> Option<String> {
        self.cached
            .lock()
            .unwrap()
            .as_ref()
            .map(|p| p.access_token.clone())
    }

    /// Current refresh token, if a pair is stored
    pub fn refresh_token(&self) -> Option<String> {
        self.cached
            .lock()
            .unwrap()
            .as_ref()
            .map(|p| p.refresh_token.clone())
    }

    /// The whole pair, if stored
    pub fn pair(&self) -> Option<TokenPair> {
        self.cached.lock().unwrap().clone()
    }

    pub fn is_present(&self) -> bool {
        self.cached.lock().unwrap().is_some()
    }

    /// Persist a new pair, replacing any previous one
    pub fn store(&self, pair: TokenPair) -> Result<(), ApiError> {
        if let Some(path) = &self.path {
            config::save_json_file(path, &pair)
                .map_err(|e| ApiError::Storage(e.to_string()))?;
        }
        *self.cached.lock().unwrap() = Some(pair);
        Ok(())
    }

    /// Remove the pair from disk and memory
    pub fn clear(&self) -> Result<(), ApiError> {
        if let Some(path) = &self.path {
            config::remove_file(path).map_err(|e| ApiError::Storage(e.to_string()))?;
        }
        *self.cached.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> TokenPair {
        TokenPair {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
        }
    }

    #[test]
    fn test_store_and_reload_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TOKENS_FILE);

        let store = TokenStore::at_path(path.clone());
        assert!(!store.is_present());
        store.store(sample()).unwrap();

        // A fresh store at the same path hydrates the persisted pair
        let reopened = TokenStore::at_path(path);
        assert_eq!(reopened.pair().unwrap(), sample());
        assert_eq!(reopened.access_token().as_deref(), Some("access"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh"));
    }

    #[test]
    fn test_clear_removes_both_tokens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TOKENS_FILE);

        let store = TokenStore::at_path(path.clone());
        store.store(sample()).unwrap();
        store.clear().unwrap();

        assert!(store.pair().is_none());
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_in_memory_store_has_no_file() {
        let store = TokenStore::in_memory();
        store.store(sample()).unwrap();
        assert!(store.is_present());
        store.clear().unwrap();
        assert!(!store.is_present());
    }
}
