// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! dlman - download manager core for a keyboard-driven browser
//!
//! Tracks the downloads a browser session starts, samples their speed, keeps
//! a running count in every window's status bar, opens files once they
//! finish and offers an interactive list to manage them. Everything runs on
//! one cooperative 1-second tick; nothing here performs network I/O.
//!
//! # Core Modules
//!
//! - [`download`] - Registry, speed sampler, completion watcher, engine traits
//! - [`status_indicator`] - Running-downloads label for the status bar
//! - [`list`] - Interactive downloads list
//! - [`close_guard`] - Keeps the last window open while downloads run
//! - [`context`] - Application root wiring it all together
//! - [`timer`] - Interval timers driving the pollers
//! - [`cli`] - `:` commands, key bindings and prompt input
//! - [`config`] - `~/.dlman/config.json`
//! - [`error`] - Error taxonomy and user-facing formatting

pub mod cli;
pub mod close_guard;
pub mod config;
pub mod context;
pub mod download;
pub mod error;
pub mod list;
pub mod status_indicator;
pub mod terminal;
pub mod timer;
pub mod window;

pub use close_guard::{CloseGuard, CloseOutcome, CloseRequest};
pub use config::DownloadsConfig;
pub use context::DownloadContext;
pub use download::{
    CompletionWatcher, Download, DownloadHandle, DownloadId, DownloadRegistry, DownloadStatus,
    SpeedSampler, Target,
};
pub use error::{format_user_error, DownloadError};
pub use list::{ListKey, ListModel, ListRow};
pub use status_indicator::StatusIndicator;
pub use timer::{IntervalTimer, POLL_INTERVAL};
pub use window::{ListView, WindowContext, WindowId, WindowSet};
