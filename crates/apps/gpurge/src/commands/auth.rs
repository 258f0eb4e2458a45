//! Account session commands: register, login, logout, whoami

use super::{App, prompt};
use anyhow::{Result, bail};
use client::auth::Registration;
use client::error::ApiError;

pub fn register(app: &App, username: &str, email: &str) -> Result<()> {
    let password = prompt("Password")?;
    let password_confirm = prompt("Confirm password")?;

    let form = Registration {
        username: username.to_string(),
        email: email.to_string(),
        password,
        password_confirm,
    };

    match app.session.register(&form) {
        Ok(profile) => {
            println!("Account created; signed in as {}", profile.username);
            Ok(())
        }
        Err(ApiError::Validation(errors)) => {
            eprintln!("Registration was rejected:");
            for (field, messages) in errors.iter() {
                for message in messages {
                    eprintln!("  {}: {}", field, message);
                }
            }
            bail!("Fix the fields above and try again")
        }
        Err(e) => Err(e.into()),
    }
}

pub fn login(app: &App, username: &str) -> Result<()> {
    let password = prompt("Password")?;
    let profile = app.session.login(username, &password)?;
    println!("Signed in as {} <{}>", profile.username, profile.email);
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.session.logout();
    println!("Signed out");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    let profile = app.require_session()?;
    println!("{} <{}>", profile.username, profile.email);
    if let Some(joined) = &profile.date_joined {
        println!("member since {}", joined);
    }
    Ok(())
}
