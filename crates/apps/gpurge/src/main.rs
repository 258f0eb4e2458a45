//! gpurge - bulk Gmail cleanup from the command line
//!
//! Talks to the Gmail Purge backend: account session, Google link,
//! and the bulk delete/recover jobs with live progress.

use clap::Parser;
use log::error;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::App;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let app = App::bootstrap();
    match cli.command {
        Commands::Register { username, email } => commands::auth::register(&app, &username, &email),
        Commands::Login { username } => commands::auth::login(&app, &username),
        Commands::Logout => commands::auth::logout(&app),
        Commands::Whoami => commands::auth::whoami(&app),
        Commands::Connect { finish, no_browser } => {
            commands::connect::connect(&app, finish.as_deref(), no_browser)
        }
        Commands::Disconnect => commands::connect::disconnect(&app),
        Commands::Status => commands::connect::status(&app),
        Commands::Delete {
            category,
            older_than,
            max,
            yes,
        } => commands::jobs::delete(&app, category, older_than, max, yes),
        Commands::Recover { max, yes } => commands::jobs::recover(&app, max, yes),
        Commands::Task { task_id } => commands::jobs::watch_task(&app, &task_id),
    }
}
