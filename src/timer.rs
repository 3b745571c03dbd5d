// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Repeating interval timers for the shared event loop.
//!
//! Timers do not own a thread or a task. The event loop calls
//! [`IntervalTimer::advance`] with the time that passed and the owner runs its
//! callback when it reports a fire. A timer fires at most once per call, so a
//! late or jittery event loop never makes a poller sample twice in a row.
//! Stopping is the only cancellation primitive and is idempotent.

use std::time::Duration;

/// Cadence shared by every poller.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduling state of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not scheduled; never fires
    Stopped,
    /// Scheduled; `elapsed` is the time since the last fire
    Running { elapsed: Duration },
}

/// A named, restartable repeating timer.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    name: &'static str,
    period: Duration,
    state: TimerState,
}

impl IntervalTimer {
    /// Create a stopped timer with the given period.
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            state: TimerState::Stopped,
        }
    }

    /// Create a stopped timer firing every [`POLL_INTERVAL`].
    pub fn poller(name: &'static str) -> Self {
        Self::new(name, POLL_INTERVAL)
    }

    /// Start the timer. Returns false if it was already running, in which
    /// case its schedule is left untouched.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        tracing::debug!(timer = self.name, "timer started");
        self.state = TimerState::Running {
            elapsed: Duration::ZERO,
        };
        true
    }

    /// Stop the timer. Returns false if it was already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        tracing::debug!(timer = self.name, "timer stopped");
        self.state = TimerState::Stopped;
        true
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Let `dt` pass and return whether the timer fired.
    ///
    /// Backlog past a fire is capped at half a period. A driver ticking at
    /// roughly the timer's own period therefore settles half a period out of
    /// phase and fires exactly once per tick despite jitter.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let TimerState::Running { elapsed } = self.state else {
            return false;
        };
        if self.period.is_zero() {
            return false;
        }

        let elapsed = elapsed + dt;
        if elapsed < self.period {
            self.state = TimerState::Running { elapsed };
            return false;
        }
        self.state = TimerState::Running {
            elapsed: (elapsed - self.period).min(self.period / 2),
        };
        true
    }
}
