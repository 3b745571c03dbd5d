// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-process download engine that fakes transfers.
//!
//! Used by the demo binary and by tests. Transfers only make progress when
//! [`SimulatedEngine::step`] is called, so tests stay deterministic.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use rand::Rng;

use super::engine::DownloadEngine;
use super::types::{Download, DownloadHandle, DownloadId, DownloadStatus};
use crate::error::DownloadError;

/// How fast simulated transfers progress.
#[derive(Debug, Clone, Copy)]
pub enum Throughput {
    /// Same rate for every download
    Fixed(u64),
    /// Rate picked per download from the inclusive range
    Random { min: u64, max: u64 },
}

/// A fake transfer.
#[derive(Debug)]
pub struct SimDownload {
    id: DownloadId,
    uri: String,
    destination: RefCell<Option<PathBuf>>,
    status: Cell<DownloadStatus>,
    current: Cell<u64>,
    total: Option<u64>,
    bytes_per_sec: u64,
}

impl SimDownload {
    fn new(id: DownloadId, uri: &str, total: Option<u64>, bytes_per_sec: u64) -> Self {
        Self {
            id,
            uri: uri.to_string(),
            destination: RefCell::new(None),
            status: Cell::new(DownloadStatus::Created),
            current: Cell::new(0),
            total,
            bytes_per_sec,
        }
    }

    /// Force a status, as the engine would on network events.
    pub fn set_status(&self, status: DownloadStatus) {
        self.status.set(status);
    }

    pub fn set_current_size(&self, bytes: u64) {
        self.current.set(bytes);
    }

    /// Mark the transfer complete with all bytes received.
    pub fn finish(&self) {
        if let Some(total) = self.total {
            self.current.set(total);
        }
        self.status.set(DownloadStatus::Finished);
    }

    fn step(&self, dt: Duration) {
        if self.status.get() != DownloadStatus::Started {
            return;
        }
        let delta = (self.bytes_per_sec as f64 * dt.as_secs_f64()) as u64;
        let next = self.current.get().saturating_add(delta);
        match self.total {
            Some(total) if next >= total => self.finish(),
            _ => self.current.set(next),
        }
    }
}

impl Download for SimDownload {
    fn id(&self) -> DownloadId {
        self.id
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn destination(&self) -> Option<PathBuf> {
        self.destination.borrow().clone()
    }

    fn set_destination(&self, path: PathBuf) {
        *self.destination.borrow_mut() = Some(path);
    }

    fn start(&self) -> Result<(), DownloadError> {
        if self.status.get() != DownloadStatus::Created {
            return Err(DownloadError::Engine(format!(
                "cannot start download in state {}",
                self.status.get()
            )));
        }
        if self.destination.borrow().is_none() {
            return Err(DownloadError::Engine("no destination set".to_string()));
        }
        self.status.set(DownloadStatus::Started);
        Ok(())
    }

    fn cancel(&self) -> Result<(), DownloadError> {
        if !self.status.get().is_running() {
            return Err(DownloadError::NotRunning);
        }
        self.status.set(DownloadStatus::Cancelled);
        Ok(())
    }

    fn status(&self) -> DownloadStatus {
        self.status.get()
    }

    fn current_size(&self) -> u64 {
        self.current.get()
    }

    fn total_size(&self) -> Option<u64> {
        self.total
    }

    fn progress(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => (self.current.get() as f64 / total as f64).min(1.0),
            _ if self.status.get() == DownloadStatus::Finished => 1.0,
            _ => 0.0,
        }
    }

    fn suggested_filename(&self) -> String {
        suggested_name(&self.uri)
    }

    fn mime_type(&self) -> Option<String> {
        guess_mime(&self.suggested_filename()).map(str::to_string)
    }
}

#[derive(Debug)]
struct EngineState {
    next_id: u64,
    downloads: Vec<Rc<SimDownload>>,
    discarded: Vec<DownloadId>,
    total_size: Option<u64>,
    throughput: Throughput,
}

/// Engine handle. Clones share the same set of downloads.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    state: Rc<RefCell<EngineState>>,
}

impl SimulatedEngine {
    /// Engine whose downloads have `total_size` bytes and a fixed rate.
    pub fn new(total_size: Option<u64>, bytes_per_sec: u64) -> Self {
        Self::with_throughput(total_size, Throughput::Fixed(bytes_per_sec))
    }

    pub fn with_throughput(total_size: Option<u64>, throughput: Throughput) -> Self {
        Self {
            state: Rc::new(RefCell::new(EngineState {
                next_id: 1,
                downloads: Vec::new(),
                discarded: Vec::new(),
                total_size,
                throughput,
            })),
        }
    }

    /// Advance every started transfer by `dt`.
    pub fn step(&self, dt: Duration) {
        for download in &self.state.borrow().downloads {
            download.step(dt);
        }
    }

    pub fn get(&self, id: DownloadId) -> Option<Rc<SimDownload>> {
        self.state
            .borrow()
            .downloads
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Number of downloads the engine currently owns.
    pub fn len(&self) -> usize {
        self.state.borrow().downloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downloads dropped through [`DownloadEngine::discard`].
    pub fn discarded(&self) -> Vec<DownloadId> {
        self.state.borrow().discarded.clone()
    }
}

impl DownloadEngine for SimulatedEngine {
    fn create(&mut self, uri: &str) -> Result<DownloadHandle, DownloadError> {
        if uri.trim().is_empty() {
            return Err(DownloadError::Engine("empty URI".to_string()));
        }
        let mut state = self.state.borrow_mut();
        let id = DownloadId(state.next_id);
        state.next_id += 1;

        let rate = match state.throughput {
            Throughput::Fixed(rate) => rate,
            Throughput::Random { min, max } => rand::thread_rng().gen_range(min..=max.max(min)),
        };
        let download = Rc::new(SimDownload::new(id, uri, state.total_size, rate));
        state.downloads.push(download.clone());
        Ok(DownloadHandle::new(download))
    }

    fn discard(&mut self, download: &DownloadHandle) {
        let mut state = self.state.borrow_mut();
        let id = download.id();
        if let Some(pos) = state.downloads.iter().position(|d| d.id == id) {
            let removed = state.downloads.remove(pos);
            removed.set_status(DownloadStatus::Cancelled);
        }
        state.discarded.push(id);
    }
}

/// Last path segment of a URI without query or fragment.
pub fn suggested_name(uri: &str) -> String {
    let without_query = uri.split(['?', '#']).next().unwrap_or(uri);
    let path = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    match path.split_once('/') {
        Some((_, tail)) => tail.rsplit('/').next().unwrap_or("").to_string(),
        None => String::new(),
    }
}

fn guess_mime(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    };
    Some(mime)
}
