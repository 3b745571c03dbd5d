// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Close guard for the last window.
//!
//! Closing the last window while downloads are running would drop them, so the
//! quit commands ask the guard first. The `!` variants skip the check.

use crate::window::WindowContext;

/// How a close was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloseRequest {
    /// Persist the session before closing (`writequit`)
    pub save: bool,
    /// Close even with running downloads (`quit!`)
    pub force: bool,
}

impl CloseRequest {
    pub fn quit() -> Self {
        Self::default()
    }

    pub fn writequit() -> Self {
        Self { save: true, force: false }
    }

    pub fn forced(self) -> Self {
        Self { force: true, ..self }
    }

    /// Command that would close this window regardless of downloads.
    pub fn override_command(&self) -> &'static str {
        if self.save {
            "writequit!"
        } else {
            "quit!"
        }
    }
}

/// Result of a close attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// Running downloads would be lost; the advisory was shown
    Blocked,
    /// The session could not be saved; the window stays open
    SaveFailed,
}

/// Decides whether a window may close.
#[derive(Debug, Clone, Default)]
pub struct CloseGuard {
    blocked: usize,
}

impl CloseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if another window stays open or nothing is running.
    pub fn can_close(window_count: usize, running: usize) -> bool {
        window_count > 1 || running == 0
    }

    /// Text shown when a close is refused.
    pub fn advisory(running: usize, request: CloseRequest) -> String {
        let noun = if running == 1 { "download is" } else { "downloads are" };
        format!(
            "{} {} still running (add ! to override: :{})",
            running,
            noun,
            request.override_command()
        )
    }

    /// Close `window` if allowed, saving the session first when requested.
    pub fn try_close(
        &mut self,
        window: &mut dyn WindowContext,
        window_count: usize,
        running: usize,
        request: CloseRequest,
    ) -> CloseOutcome {
        if !request.force && !Self::can_close(window_count, running) {
            self.blocked += 1;
            tracing::info!(
                running,
                windows = window_count,
                blocked = self.blocked,
                "close blocked by running downloads"
            );
            window.error(&Self::advisory(running, request));
            return CloseOutcome::Blocked;
        }

        if request.save {
            if let Err(e) = window.save_session() {
                tracing::warn!("session save failed: {:#}", e);
                window.error(&format!("Could not save session: {:#}", e));
                return CloseOutcome::SaveFailed;
            }
        }

        tracing::debug!(force = request.force, save = request.save, "closing window");
        window.close_win();
        CloseOutcome::Closed
    }

    /// How many closes were refused so far.
    #[cfg(test)]
    pub fn blocked_count(&self) -> usize {
        self.blocked
    }
}
