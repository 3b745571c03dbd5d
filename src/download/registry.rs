// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ordered registry of tracked downloads.
//!
//! Insertion order is the addressing order: commands refer to downloads by
//! their 1-based position, which shifts when an earlier entry is deleted.
//! The registry is the only place that splices the sequence. It also owns the
//! two pollers that only make sense while it is non-empty: the speed sampler
//! and the status indicator.

use std::path::PathBuf;
use std::time::Duration;

use super::engine::{DownloadEngine, LocationHook, SaveDialog};
use super::speed::SpeedSampler;
use super::types::{DownloadHandle, DownloadId};
use crate::error::DownloadError;
use crate::status_indicator::{StatusConfig, StatusIndicator};
use crate::window::{WindowContext, WindowSet};

/// Title passed to the save dialog.
const SAVE_DIALOG_TITLE: &str = "Save file";

/// A download named either by position or by handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// 1-based position in the registry
    ByIndex(usize),
    /// A specific download
    ByRef(DownloadHandle),
}

impl Target {
    /// Parse a command argument. Anything that is not a number cannot name a
    /// tracked download.
    pub fn parse(arg: &str) -> Result<Self, DownloadError> {
        arg.trim()
            .parse::<usize>()
            .map(Target::ByIndex)
            .map_err(|_| DownloadError::InvalidReference)
    }
}

impl From<usize> for Target {
    fn from(index: usize) -> Self {
        Target::ByIndex(index)
    }
}

impl From<DownloadHandle> for Target {
    fn from(download: DownloadHandle) -> Self {
        Target::ByRef(download)
    }
}

impl From<&DownloadHandle> for Target {
    fn from(download: &DownloadHandle) -> Self {
        Target::ByRef(download.clone())
    }
}

/// The set of downloads a browser session is tracking.
pub struct DownloadRegistry {
    entries: Vec<DownloadHandle>,
    sampler: SpeedSampler,
    indicator: StatusIndicator,
    engine: Box<dyn DownloadEngine>,
    location: Box<dyn LocationHook>,
    dialog: Box<dyn SaveDialog>,
    default_dir: PathBuf,
}

impl DownloadRegistry {
    /// Create an empty registry with idle pollers.
    pub fn new(
        engine: Box<dyn DownloadEngine>,
        location: Box<dyn LocationHook>,
        dialog: Box<dyn SaveDialog>,
        default_dir: PathBuf,
    ) -> Self {
        Self {
            entries: Vec::new(),
            sampler: SpeedSampler::new(),
            indicator: StatusIndicator::default(),
            engine,
            location,
            dialog,
            default_dir,
        }
    }

    pub fn with_status_config(mut self, config: StatusConfig) -> Self {
        self.indicator.config = config;
        self
    }

    /// Create, place and start a download for `uri`.
    ///
    /// Returns `Ok(None)` when no destination could be found; the download is
    /// then handed back to the engine and nothing is tracked.
    pub fn add(
        &mut self,
        uri: &str,
        window: &mut dyn WindowContext,
    ) -> Result<Option<DownloadHandle>, DownloadError> {
        let download = self.engine.create(uri)?;
        let suggested = download.suggested_filename();

        let path = match self.location.resolve(uri, &suggested) {
            Some(path) if path.is_empty() => {
                tracing::warn!(uri, "location hook returned an empty path");
                self.engine.discard(&download);
                return Err(DownloadError::InvalidLocation);
            }
            Some(path) => Some(PathBuf::from(path)),
            None => self
                .dialog
                .choose(SAVE_DIALOG_TITLE, window, &self.default_dir, &suggested),
        };

        let Some(path) = path else {
            tracing::info!(uri, "no destination chosen, download abandoned");
            self.engine.discard(&download);
            return Ok(None);
        };

        download.set_destination(path);
        if let Err(e) = download.start() {
            tracing::warn!(uri, "engine refused to start download: {}", e);
            self.engine.discard(&download);
            return Err(e);
        }

        if !self.entries.contains(&download) {
            self.entries.push(download.clone());
        }
        self.sampler.timer_mut().start();
        self.indicator.timer_mut().start();

        tracing::info!(id = download.id().0, uri, index = self.entries.len(), "download added");
        Ok(Some(download))
    }

    /// Look up a download by position or handle.
    pub fn resolve(&self, target: &Target) -> Result<DownloadHandle, DownloadError> {
        match target {
            Target::ByIndex(index) => {
                if *index == 0 || *index > self.entries.len() {
                    return Err(DownloadError::InvalidIndex {
                        index: *index,
                        len: self.entries.len(),
                    });
                }
                Ok(self.entries[index - 1].clone())
            }
            Target::ByRef(download) => {
                if self.entries.contains(download) {
                    Ok(download.clone())
                } else {
                    Err(DownloadError::InvalidReference)
                }
            }
        }
    }

    /// Stop tracking a download, cancelling it first if it is still running.
    pub fn delete(&mut self, target: &Target) -> Result<DownloadHandle, DownloadError> {
        let download = self.resolve(target)?;
        if download.is_running() {
            if let Err(e) = download.cancel() {
                tracing::warn!(id = download.id().0, "cancel before delete failed: {}", e);
            }
        }

        if let Some(pos) = self.entries.iter().position(|d| *d == download) {
            self.entries.remove(pos);
        }
        self.sampler.forget(download.id());

        tracing::info!(id = download.id().0, uri = download.uri(), "download deleted");
        Ok(download)
    }

    /// Cancel a running download. Terminal downloads yield `NotRunning`.
    pub fn cancel(&mut self, target: &Target) -> Result<DownloadHandle, DownloadError> {
        let download = self.resolve(target)?;
        if !download.is_running() {
            return Err(DownloadError::NotRunning);
        }
        download.cancel()?;
        tracing::info!(id = download.id().0, "download cancelled");
        Ok(download)
    }

    /// Add the same URI again and drop the original only if that worked.
    pub fn restart(
        &mut self,
        target: &Target,
        window: &mut dyn WindowContext,
    ) -> Result<Option<DownloadHandle>, DownloadError> {
        let original = self.resolve(target)?;
        let uri = original.uri().to_string();

        let Some(replacement) = self.add(&uri, window)? else {
            tracing::info!(id = original.id().0, "restart abandoned, original kept");
            return Ok(None);
        };
        self.delete(&Target::ByRef(original))?;
        Ok(Some(replacement))
    }

    /// Drop every download that is no longer running. Returns how many went.
    pub fn clear(&mut self) -> usize {
        let (kept, removed): (Vec<_>, Vec<_>) =
            self.entries.iter().cloned().partition(|d| d.is_running());
        self.entries = kept;
        for download in &removed {
            self.sampler.forget(download.id());
        }
        tracing::info!(removed = removed.len(), kept = self.entries.len(), "downloads cleared");
        removed.len()
    }

    /// Run the sampler and indicator for `dt` of elapsed time.
    ///
    /// Each poller runs at most once per call and stops itself on a tick that
    /// finds the registry empty.
    pub fn tick(&mut self, dt: Duration, windows: &mut WindowSet) {
        if self.sampler.timer_mut().advance(dt) {
            if self.entries.is_empty() {
                self.sampler.timer_mut().stop();
            } else {
                self.sampler.sample(&self.entries);
            }
        }

        if self.indicator.timer_mut().advance(dt) {
            if self.entries.is_empty() {
                self.indicator.timer_mut().stop();
                self.indicator.clear(windows);
            } else {
                self.indicator.refresh(&self.entries, windows);
            }
        }
    }

    pub fn entries(&self) -> &[DownloadHandle] {
        &self.entries
    }

    /// 1-based position of a download.
    pub fn index_of(&self, download: &DownloadHandle) -> Option<usize> {
        self.entries.iter().position(|d| d == download).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn running_count(&self) -> usize {
        StatusIndicator::running_count(&self.entries)
    }

    pub fn get_speed(&self, id: DownloadId) -> u64 {
        self.sampler.get_speed(id)
    }

    pub fn sampler(&self) -> &SpeedSampler {
        &self.sampler
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }

    /// True while the speed sampler and status indicator are scheduled.
    pub fn is_polling(&self) -> bool {
        self.sampler.is_running() && self.indicator.is_running()
    }
}
