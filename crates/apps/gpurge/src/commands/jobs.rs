//! Bulk-job commands: delete, recover, task

use super::{App, confirm, confirm_or_bail};
use anyhow::{Context, Result, bail};
use client::query::{AgeBucket, Category, JobRequest, JobSelection, OperationKind};
use client::tasks::{self, PollOutcome, RetryTracker, TaskState, TaskStatus, POLL_INTERVAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

pub fn delete(
    app: &App,
    category: Category,
    older_than: AgeBucket,
    max: u32,
    yes: bool,
) -> Result<()> {
    let selection = JobSelection {
        kind: OperationKind::Delete,
        category: Some(category),
        age: Some(older_than),
        max_emails: max,
    };
    let request = validate(&selection)?;

    println!(
        "This moves up to {} emails matching \"{}\" to the trash.",
        request.max_emails(),
        request.query()
    );
    confirm_or_bail("Proceed?", yes)?;

    run_job(app, &request, "Deleting")
}

pub fn recover(app: &App, max: u32, yes: bool) -> Result<()> {
    let selection = JobSelection {
        kind: OperationKind::Recover,
        category: None,
        age: None,
        max_emails: max,
    };
    let request = validate(&selection)?;

    println!(
        "This moves up to {} emails out of the trash, back to where they came from.",
        request.max_emails()
    );
    confirm_or_bail("Proceed?", yes)?;

    run_job(app, &request, "Recovering")
}

pub fn watch_task(app: &App, task_id: &str) -> Result<()> {
    app.require_session()?;
    watch(app, task_id, "Working")
}

fn validate(selection: &JobSelection) -> Result<JobRequest> {
    match selection.validate() {
        Ok(request) => Ok(request),
        Err(errors) => {
            for (field, messages) in errors.iter() {
                for message in messages {
                    eprintln!("  {}: {}", field, message);
                }
            }
            bail!("Invalid selection")
        }
    }
}

/// Submit with a bounded manual-retry loop, then watch until terminal
fn run_job(app: &App, request: &JobRequest, verb: &str) -> Result<()> {
    app.require_session()?;

    let mut tracker = RetryTracker::default();
    let task_id = loop {
        if !tracker.record_attempt() {
            bail!("Giving up after {} attempts", tracker.attempts());
        }
        match tasks::submit(&app.client, request) {
            Ok(task_id) => break task_id,
            Err(e) => {
                let kind = tasks::classify(&e);
                eprintln!("{}", kind.user_message());
                if !kind.retryable() || !tracker.can_retry() {
                    return Err(e.into());
                }
                if !confirm("Retry the submission?")? {
                    bail!("Cancelled")
                }
            }
        }
    };

    println!("Submitted as task {}", task_id);
    watch(app, &task_id, verb)
}

/// Poll the task with a live progress display until it finishes
fn watch(app: &App, task_id: &str, verb: &str) -> Result<()> {
    let bar = progress_bar(verb)?;
    let display = bar.clone();
    let cancelled = AtomicBool::new(false);

    let outcome = tasks::poll_until_terminal(
        &app.client,
        task_id,
        POLL_INTERVAL,
        &cancelled,
        &mut move |status| update_bar(&display, status),
    );

    bar.finish_and_clear();
    let status = match outcome.context("Lost track of the task")? {
        PollOutcome::Completed(status) => status,
        PollOutcome::Cancelled => bail!("Cancelled"),
    };

    match status.state {
        TaskState::Success => {
            let processed = status.processed_count().unwrap_or(0);
            let failed = status
                .result
                .as_ref()
                .and_then(|r| r.failed)
                .unwrap_or(0);
            println!("Done: {} emails processed, {} failed", processed, failed);
            Ok(())
        }
        _ => bail!(status.failure_message()),
    }
}

fn progress_bar(verb: &str) -> Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed:>4}] {msg}")?,
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_message(format!("{}... waiting for the task to start", verb));
    Ok(bar)
}

fn update_bar(bar: &ProgressBar, status: &TaskStatus) {
    let Some(progress) = &status.progress else {
        return;
    };
    if progress.total > 0 {
        bar.set_message(format!(
            "{} / {} emails ({}%)",
            progress.current,
            progress.total,
            progress.percent()
        ));
    } else if let Some(message) = &progress.message {
        bar.set_message(message.clone());
    }
}
