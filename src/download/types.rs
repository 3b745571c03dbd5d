// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Download types shared by the registry, pollers and list mode.

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::DownloadError;

/// Stable identity token of a download, unique for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DownloadId(pub u64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Status of a download as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    /// Created but not started yet
    Created,
    /// Transferring
    Started,
    /// Transfer completed
    Finished,
    /// Cancelled by the user
    Cancelled,
    /// Aborted by the engine
    Aborted,
    /// Failed with an error
    Error,
}

impl DownloadStatus {
    /// Returns true while the download still counts as running.
    pub fn is_running(&self) -> bool {
        matches!(self, DownloadStatus::Created | DownloadStatus::Started)
    }

    /// Returns true once the download can no longer change status.
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStatus::Created => write!(f, "created"),
            DownloadStatus::Started => write!(f, "started"),
            DownloadStatus::Finished => write!(f, "finished"),
            DownloadStatus::Cancelled => write!(f, "cancelled"),
            DownloadStatus::Aborted => write!(f, "aborted"),
            DownloadStatus::Error => write!(f, "error"),
        }
    }
}

/// A single file transfer owned by the download engine.
///
/// The registry only holds a [`DownloadHandle`] to it. Implementations keep
/// their state behind interior mutability, since every call comes from the
/// single event loop thread.
pub trait Download {
    fn id(&self) -> DownloadId;
    fn uri(&self) -> &str;
    /// Destination path, `None` until set before start
    fn destination(&self) -> Option<PathBuf>;
    fn set_destination(&self, path: PathBuf);
    fn start(&self) -> Result<(), DownloadError>;
    fn cancel(&self) -> Result<(), DownloadError>;
    fn status(&self) -> DownloadStatus;
    fn current_size(&self) -> u64;
    /// Total size in bytes, `None` when the server did not report one
    fn total_size(&self) -> Option<u64>;
    /// Fraction completed in [0, 1]
    fn progress(&self) -> f64;
    fn suggested_filename(&self) -> String;
    fn mime_type(&self) -> Option<String>;

    fn is_running(&self) -> bool {
        self.status().is_running()
    }
}

/// Shared handle to an engine-owned download. Compares by identity.
#[derive(Clone)]
pub struct DownloadHandle(Rc<dyn Download>);

impl DownloadHandle {
    pub fn new(download: Rc<dyn Download>) -> Self {
        Self(download)
    }

    /// Name shown to the user: destination file name, then the engine's
    /// suggestion, then the URI.
    pub fn display_name(&self) -> String {
        if let Some(name) = self
            .destination()
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
        {
            return name;
        }
        let suggested = self.suggested_filename();
        if suggested.is_empty() {
            self.uri().to_string()
        } else {
            suggested
        }
    }
}

impl Deref for DownloadHandle {
    type Target = dyn Download;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for DownloadHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for DownloadHandle {}

impl fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadHandle")
            .field("id", &self.id())
            .field("uri", &self.uri())
            .field("status", &self.status())
            .finish()
    }
}

/// Format a byte count with binary units.
pub fn size_string(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.1}GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.1}MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

/// Format a throughput in bytes per second.
pub fn speed_string(bps: u64) -> String {
    format!("{}/s", size_string(bps))
}

/// Format an estimated time remaining.
pub fn eta_string(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Seconds left at the given speed, if both the total and a speed are known.
pub fn eta_seconds(current: u64, total: Option<u64>, bps: u64) -> Option<u64> {
    let total = total?;
    if bps == 0 {
        return None;
    }
    Some(total.saturating_sub(current) / bps)
}
