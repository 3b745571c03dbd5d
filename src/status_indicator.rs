// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Status Indicator Module
//!
//! Keeps the downloads label in every window's status bar current. Once per
//! tick it counts the running downloads and pushes `"<n>↓"` (or nothing when
//! no download is running) to all live windows.
//!
//! ## Example
//!
//! ```
//! use dlman::status_indicator::{StatusConfig, StatusIndicator};
//!
//! let indicator = StatusIndicator::new(StatusConfig::default());
//! assert_eq!(indicator.format_label(0), "");
//! assert_eq!(indicator.format_label(3), "3↓");
//! ```

use serde::{Deserialize, Serialize};

use crate::download::DownloadHandle;
use crate::timer::IntervalTimer;
use crate::window::WindowSet;

/// Marker appended to the running count.
pub const DOWNLOAD_GLYPH: &str = "↓";

/// Configuration for the status indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Whether to push the label at all.
    pub show_label: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { show_label: true }
    }
}

/// Aggregates the running count across the registry for display.
#[derive(Debug, Clone)]
pub struct StatusIndicator {
    /// Configuration for display.
    pub config: StatusConfig,
    timer: IntervalTimer,
    /// Label pushed on the last refresh.
    label: String,
}

impl StatusIndicator {
    /// Create a stopped status indicator with the given configuration.
    pub fn new(config: StatusConfig) -> Self {
        Self {
            config,
            timer: IntervalTimer::poller("status"),
            label: String::new(),
        }
    }

    pub fn timer_mut(&mut self) -> &mut IntervalTimer {
        &mut self.timer
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// The label pushed on the last refresh.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of downloads still running.
    pub fn running_count(tracked: &[DownloadHandle]) -> usize {
        tracked.iter().filter(|d| d.is_running()).count()
    }

    /// Format the label for a running count.
    pub fn format_label(&self, running: usize) -> String {
        if running == 0 {
            String::new()
        } else {
            format!("{}{}", running, DOWNLOAD_GLYPH)
        }
    }

    /// Recompute the label and push it to every window.
    pub fn refresh(&mut self, tracked: &[DownloadHandle], windows: &mut WindowSet) {
        let label = self.format_label(Self::running_count(tracked));
        self.push(label, windows);
    }

    /// Blank the label once when the indicator goes idle.
    pub fn clear(&mut self, windows: &mut WindowSet) {
        self.push(String::new(), windows);
    }

    fn push(&mut self, label: String, windows: &mut WindowSet) {
        self.label = label;
        if !self.config.show_label {
            return;
        }
        for (_, window) in windows.iter_mut() {
            window.set_status_label(&self.label);
        }
    }
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new(StatusConfig::default())
    }
}
