// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error taxonomy for download commands.
//!
//! Every error here is scoped to the single command or tick that raised it.
//! None of them is fatal to the process: commands surface them through the
//! window, pollers log them and keep running.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by registry operations, watchers and list mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DownloadError {
    /// 1-based index outside the current registry bounds
    #[error("Invalid download index: {index} (there are {len} downloads)")]
    InvalidIndex { index: usize, len: usize },

    /// Argument is neither an index nor a tracked download
    #[error("Invalid download reference")]
    InvalidReference,

    /// The location hook returned something other than nothing or a path
    #[error("Download location hook returned an empty path")]
    InvalidLocation,

    /// The open-file hook did not report success
    #[error("Could not open {}", path.display())]
    OpenFailure { path: PathBuf },

    /// Cancel requested on a download that already reached a terminal status
    #[error("Download is not running")]
    NotRunning,

    /// The download engine rejected an operation
    #[error("Download engine error: {0}")]
    Engine(String),

    /// The interactive list widget failed to render
    #[error("List view error: {0}")]
    View(String),

    /// Command name not in the command table
    #[error("Not a command: {0}")]
    UnknownCommand(String),

    /// Command requires an argument that was not given
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
}

impl DownloadError {
    /// Suggested next step for the user, if there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            DownloadError::InvalidIndex { .. } | DownloadError::InvalidReference => {
                Some("Use :downloads to see the current numbering")
            }
            DownloadError::UnknownCommand(_) => Some("Use :help to list commands"),
            DownloadError::MissingArgument(_) => Some("Use :help to see command arguments"),
            _ => None,
        }
    }
}

/// Format an error for display in a window, with its hint if it has one.
pub fn format_user_error(err: &DownloadError) -> String {
    match err.hint() {
        Some(hint) => format!("{} ({})", err, hint),
        None => err.to_string(),
    }
}
