//! Command implementations

pub mod auth;
pub mod connect;
pub mod jobs;

use anyhow::{Context, Result, bail};
use client::auth::Profile;
use client::http::ApiClient;
use client::{ConnectionStore, SessionStore, TokenStore};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Shared handles for one command invocation
pub struct App {
    pub client: Arc<ApiClient>,
    pub session: SessionStore,
    pub connection: ConnectionStore,
}

impl App {
    /// Wire the client to the persisted credentials and the configured
    /// base URL
    pub fn bootstrap() -> Self {
        let tokens = Arc::new(TokenStore::open());
        let client = Arc::new(ApiClient::from_env(tokens));
        let session = SessionStore::new(Arc::clone(&client));
        let connection = ConnectionStore::new(Arc::clone(&client));
        Self {
            client,
            session,
            connection,
        }
    }

    /// Rebuild the session from stored credentials, failing the command
    /// when nobody is signed in
    pub fn require_session(&self) -> Result<Profile> {
        self.session.hydrate();
        self.session
            .profile()
            .context("Not signed in. Run `gpurge login` first")
    }
}

/// Read one line from stdin after printing a prompt
pub fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Ask a yes/no question; anything but y/yes declines
pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N]", question))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Abort the command unless the user confirms or passed --yes
pub fn confirm_or_bail(question: &str, assume_yes: bool) -> Result<()> {
    if assume_yes || confirm(question)? {
        Ok(())
    } else {
        bail!("Cancelled")
    }
}
