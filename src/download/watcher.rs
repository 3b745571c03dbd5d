// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! One-shot watcher that opens a download once it finishes.
//!
//! ```text
//!            finished            open hook
//! Watching ───────────▶ Done ─────────────▶ (file opened or error shown)
//!     │
//!     │ cancelled / aborted / error
//!     ▼
//!  Failed(status) ──▶ window notified, nothing opened
//! ```

use std::time::Duration;

use super::engine::FileOpener;
use super::types::{DownloadHandle, DownloadStatus};
use crate::error::DownloadError;
use crate::timer::IntervalTimer;
use crate::window::{WindowId, WindowSet};

/// Watcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Polling once per tick
    Watching,
    /// The download finished and the open hook ran
    Done,
    /// The download ended without finishing
    Failed(DownloadStatus),
}

/// Polls one download until it reaches a terminal status.
#[derive(Debug)]
pub struct CompletionWatcher {
    download: DownloadHandle,
    window: WindowId,
    timer: IntervalTimer,
    state: WatchState,
}

impl CompletionWatcher {
    /// Start watching `download` on behalf of `window`.
    pub fn new(download: DownloadHandle, window: WindowId) -> Self {
        let mut timer = IntervalTimer::poller("completion");
        timer.start();
        tracing::debug!(id = download.id().0, window = window.0, "watching for completion");
        Self {
            download,
            window,
            timer,
            state: WatchState::Watching,
        }
    }

    pub fn download(&self) -> &DownloadHandle {
        &self.download
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_watching(&self) -> bool {
        self.state == WatchState::Watching
    }

    /// Let `dt` pass, polling if the timer fired.
    pub fn tick(&mut self, dt: Duration, windows: &mut WindowSet, opener: &mut dyn FileOpener) {
        if self.timer.advance(dt) && self.is_watching() {
            self.poll(windows, opener);
        }
    }

    fn poll(&mut self, windows: &mut WindowSet, opener: &mut dyn FileOpener) {
        let status = self.download.status();
        if status.is_running() {
            return;
        }

        self.timer.stop();
        let id = self.download.id().0;

        if status != DownloadStatus::Finished {
            self.state = WatchState::Failed(status);
            tracing::info!(id, %status, "download ended before finishing, not opening");
            if let Some(window) = windows.get_or_first(self.window) {
                window.notify(&format!(
                    "Not opening {}: download {}",
                    self.download.display_name(),
                    status
                ));
            }
            return;
        }

        self.state = WatchState::Done;
        let Some(window) = windows.get_or_first(self.window) else {
            tracing::warn!(id, "download finished but no window is left to open it in");
            return;
        };

        let Some(path) = self.download.destination() else {
            tracing::warn!(id, "finished download has no destination");
            window.error(&DownloadError::OpenFailure { path: Default::default() }.to_string());
            return;
        };

        let mime = self.download.mime_type();
        if opener.open(&path, mime.as_deref(), window) {
            tracing::info!(id, path = %path.display(), "opened finished download");
        } else {
            let err = DownloadError::OpenFailure { path };
            tracing::warn!(id, "{}", err);
            window.error(&err.to_string());
        }
    }
}
