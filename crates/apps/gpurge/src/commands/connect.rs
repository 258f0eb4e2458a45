//! Google account link commands: connect, disconnect, status

use super::App;
use anyhow::{Context, Result, bail};
use client::google::callback::{self, CallbackDisposition, CallbackParams};
use client::{ConnectionStatus, STATUS_SETTLE_DELAY};
use log::warn;

pub fn connect(app: &App, finish: Option<&str>, no_browser: bool) -> Result<()> {
    app.require_session()?;

    let params = match finish {
        // The user already authorized in a browser and pasted the
        // redirect URL back to us
        Some(redirect_url) => CallbackParams::from_url(redirect_url)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Could not parse the redirect URL")?,
        None => authorize_interactively(app, no_browser)?,
    };

    match callback::classify(&params) {
        CallbackDisposition::Exchange { code, state } => {
            app.connection
                .finalize(&code, &state)
                .context("The authorization exchange failed")?;
            // Give the backend a moment to validate the freshly stored
            // grant before reading the status back
            std::thread::sleep(STATUS_SETTLE_DELAY);
            app.connection.refresh_status(true);
            println!("Google account linked");
            print_connection(&app.connection.status());
            Ok(())
        }
        CallbackDisposition::Reject { message } => bail!(message),
    }
}

/// Hand the browser to Google and catch the redirect on the loopback
/// receiver
fn authorize_interactively(app: &App, no_browser: bool) -> Result<CallbackParams> {
    let authorization = app
        .connection
        .authorization_url()
        .context("Could not get the authorization URL")?;

    let (listener, port) = callback::bind_receiver()
        .context("Could not bind a local port for the authorization redirect")?;

    if no_browser {
        println!("Open this URL in a browser to authorize:");
        println!("  {}", authorization.auth_url);
    } else {
        println!("Opening the authorization page in your browser...");
        if let Err(e) = open::that(&authorization.auth_url) {
            warn!("Could not open a browser: {}", e);
            println!("Open this URL manually:");
            println!("  {}", authorization.auth_url);
        }
    }
    println!("Waiting for the redirect on http://127.0.0.1:{}/ ...", port);

    callback::wait_for_callback(listener).context("The authorization redirect never arrived")
}

pub fn disconnect(app: &App) -> Result<()> {
    app.require_session()?;
    app.connection
        .revoke()
        .context("Could not unlink the Google account")?;
    println!("Google account unlinked");
    Ok(())
}

pub fn status(app: &App) -> Result<()> {
    app.session.hydrate();
    let Some(profile) = app.session.profile() else {
        println!("session: not signed in");
        return Ok(());
    };
    println!("session: {} <{}>", profile.username, profile.email);

    app.connection.refresh_status(true);
    if let Some(error) = app.connection.last_error() {
        println!("google:  status unavailable ({})", error);
        return Ok(());
    }
    print_connection(&app.connection.status());

    // Live probe of the Gmail API behind the backend
    match app.connection.connectivity() {
        Ok(probe) if probe.connected => {
            let mailbox = probe
                .profile
                .and_then(|p| p.email_address)
                .unwrap_or_else(|| "unknown mailbox".to_string());
            println!("gmail:   reachable ({})", mailbox);
        }
        Ok(probe) => {
            println!(
                "gmail:   unreachable ({})",
                probe.error.unwrap_or_else(|| "no detail".to_string())
            );
        }
        Err(e) => println!("gmail:   probe failed ({})", e),
    }
    Ok(())
}

fn print_connection(status: &ConnectionStatus) {
    if status.authenticated() {
        let mailbox = status
            .profile
            .as_ref()
            .and_then(|p| p.email_address.as_deref())
            .unwrap_or("unknown mailbox");
        println!("google:  linked ({})", mailbox);
        if let Some(profile) = &status.profile {
            println!(
                "mailbox: {} messages, {} threads",
                profile.messages_total, profile.threads_total
            );
        }
        if !status.scopes.is_empty() {
            println!("scopes:  {}", status.scopes.join(", "));
        }
    } else if status.has_token && status.is_expired {
        println!("google:  linked, but the grant has expired; run `gpurge connect` again");
    } else {
        println!("google:  not linked; run `gpurge connect`");
    }
}
