//! Command-line interface

use clap::{Parser, Subcommand};
use client::query::{AgeBucket, Category};

#[derive(Parser, Debug)]
#[command(name = "gpurge")]
#[command(version)]
#[command(about = "Bulk Gmail cleanup through the Gmail Purge backend", long_about = None)]
pub struct Cli {
    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and sign in
    Register {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account email address
        #[arg(short, long)]
        email: String,
    },

    /// Sign in with an existing account
    Login {
        #[arg(short, long)]
        username: String,
    },

    /// Sign out and discard the stored credentials
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Link a Google account for mailbox access
    Connect {
        /// Finish with a pasted redirect URL instead of the local receiver
        #[arg(long, value_name = "REDIRECT_URL")]
        finish: Option<String>,

        /// Print the authorization URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Unlink the Google account
    Disconnect,

    /// Show session, Google link, and mailbox status
    Status,

    /// Move matching emails to the trash
    Delete {
        /// Mailbox category: promotions, social, updates, forums, spam
        #[arg(short, long)]
        category: Category,

        /// Minimum age: 30d, 90d, 6m, 1y, 2y
        #[arg(short = 'o', long = "older-than", value_name = "AGE")]
        older_than: AgeBucket,

        /// Maximum number of emails to touch (1-10000)
        #[arg(short, long, default_value_t = 500)]
        max: u32,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Move emails out of the trash
    Recover {
        /// Maximum number of emails to touch (1-10000)
        #[arg(short, long, default_value_t = 500)]
        max: u32,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Watch an already-submitted task until it finishes
    Task {
        /// Task identifier returned at submission
        task_id: String,
    },
}
