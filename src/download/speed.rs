// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-download throughput sampling.
//!
//! Every tick shifts the previous size into `last_size` and reads the live
//! size from the engine. Speed is the difference, in bytes per second at the
//! 1 Hz cadence, without smoothing.

use std::collections::HashMap;

use super::types::{DownloadHandle, DownloadId};
use crate::timer::IntervalTimer;

/// The two most recent size samples of one download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpeedState {
    pub last_size: u64,
    pub current_size: u64,
}

impl SpeedState {
    pub fn speed(&self) -> u64 {
        self.current_size.saturating_sub(self.last_size)
    }
}

/// Samples sizes of tracked downloads once per tick.
#[derive(Debug)]
pub struct SpeedSampler {
    timer: IntervalTimer,
    samples: HashMap<DownloadId, SpeedState>,
}

impl SpeedSampler {
    pub fn new() -> Self {
        Self {
            timer: IntervalTimer::poller("speed"),
            samples: HashMap::new(),
        }
    }

    pub fn timer(&self) -> &IntervalTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut IntervalTimer {
        &mut self.timer
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// Take one sample of every tracked download.
    ///
    /// Samples of downloads no longer in `tracked` are dropped.
    pub fn sample(&mut self, tracked: &[DownloadHandle]) {
        self.samples
            .retain(|id, _| tracked.iter().any(|d| d.id() == *id));

        for download in tracked {
            let observed = download.current_size();
            self.samples
                .entry(download.id())
                .and_modify(|s| {
                    s.last_size = s.current_size;
                    s.current_size = observed;
                })
                .or_insert(SpeedState {
                    last_size: observed,
                    current_size: observed,
                });
        }
    }

    /// Bytes per second between the two latest samples, 0 before any sample.
    pub fn get_speed(&self, id: DownloadId) -> u64 {
        self.samples.get(&id).map(SpeedState::speed).unwrap_or(0)
    }

    pub fn state(&self, id: DownloadId) -> Option<SpeedState> {
        self.samples.get(&id).copied()
    }

    /// Drop the samples of a download that left the registry.
    pub fn forget(&mut self, id: DownloadId) {
        self.samples.remove(&id);
    }

    #[cfg(test)]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Default for SpeedSampler {
    fn default() -> Self {
        Self::new()
    }
}
