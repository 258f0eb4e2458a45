//! Single-flight coordination for token refresh
//!
//! Arbitrarily many requests can hit a 401 at the same time, but only
//! one refresh call may be in flight process-wide. The first caller to
//! arrive runs the refresh; everyone who arrives while it is in flight
//! blocks and shares its outcome instead of issuing a duplicate call.

use std::sync::{Condvar, Mutex};

#[derive(Default)]
struct State {
    in_flight: bool,
    last_outcome: bool,
}

/// Coordinator guaranteeing at most one refresh execution at a time
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<State>,
    settled: Condvar,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `refresh` unless one is already in flight, in which case wait
    /// for it and return its outcome. `true` means the refresh succeeded
    /// and retrying the original request is worthwhile.
    pub fn run<F>(&self, refresh: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let mut state = self.state.lock().unwrap();
        if state.in_flight {
            while state.in_flight {
                state = self.settled.wait(state).unwrap();
            }
            return state.last_outcome;
        }

        state.in_flight = true;
        drop(state);

        // The guard settles the flight even if `refresh` unwinds;
        // otherwise every later caller would wait forever
        let mut guard = SettleGuard {
            coordinator: self,
            outcome: false,
        };
        guard.outcome = refresh();
        guard.outcome
    }

    fn settle(&self, outcome: bool) {
        let mut state = self.state.lock().unwrap();
        state.in_flight = false;
        state.last_outcome = outcome;
        self.settled.notify_all();
    }
}

struct SettleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    outcome: bool,
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.settle(self.outcome);
    }
}
