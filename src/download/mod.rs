// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Download tracking for dlman
//!
//! This module tracks the downloads a browser session has started:
//! - An ordered registry addressed by 1-based position
//! - Per-download speed sampling at 1 Hz
//! - One-shot watchers that open a file once it finishes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────┐
//! │ DownloadRegistry │────▶│ DownloadEngine  │
//! │  (ordered refs)  │     │ (owns transfers)│
//! └───┬─────────┬────┘     └─────────────────┘
//!     │         │
//!     ▼         ▼
//! ┌─────────┐ ┌─────────────────┐   ┌───────────────────┐
//! │ Speed   │ │ StatusIndicator │   │ CompletionWatcher │
//! │ Sampler │ │ (status label)  │   │ (open on finish)  │
//! └─────────┘ └─────────────────┘   └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::path::PathBuf;
//! use dlman::download::engine::{DefaultPathDialog, DirectoryLocation};
//! use dlman::download::sim::SimulatedEngine;
//! use dlman::download::{DownloadRegistry, DownloadStatus, Target};
//!
//! let engine = SimulatedEngine::new(Some(1024), 256);
//! let mut registry = DownloadRegistry::new(
//!     Box::new(engine.clone()),
//!     Box::new(DirectoryLocation { dir: PathBuf::from("/tmp"), enabled: true }),
//!     Box::new(DefaultPathDialog),
//!     PathBuf::from("/tmp"),
//! );
//! # struct Quiet;
//! # impl dlman::window::ListView for Quiet {
//! #     fn build(&mut self, _: &[dlman::list::ListRow]) {}
//! #     fn update(&mut self, _: &[dlman::list::ListRow]) -> Result<(), dlman::DownloadError> { Ok(()) }
//! #     fn selected(&self) -> Option<usize> { None }
//! #     fn select(&mut self, _: usize) {}
//! #     fn remove(&mut self, _: usize) {}
//! #     fn hide(&mut self) {}
//! # }
//! # impl dlman::window::WindowContext for Quiet {
//! #     fn notify(&mut self, _: &str) {}
//! #     fn error(&mut self, _: &str) {}
//! #     fn set_status_label(&mut self, _: &str) {}
//! #     fn list_view(&mut self) -> &mut dyn dlman::window::ListView { self }
//! #     fn save_session(&mut self) -> anyhow::Result<()> { Ok(()) }
//! #     fn close_win(&mut self) {}
//! # }
//! # let mut window = Quiet;
//!
//! let download = registry.add("http://example.com/file.iso", &mut window)?.unwrap();
//! assert_eq!(download.status(), DownloadStatus::Started);
//! assert_eq!(registry.resolve(&Target::ByIndex(1))?, download);
//! # Ok::<(), dlman::DownloadError>(())
//! ```

pub mod engine;
pub mod registry;
pub mod sim;
pub mod speed;
pub mod types;
pub mod watcher;

pub use engine::{DownloadEngine, FileOpener, LocationHook, SaveDialog};
pub use registry::{DownloadRegistry, Target};
pub use speed::{SpeedSampler, SpeedState};
pub use types::{
    eta_seconds, eta_string, size_string, speed_string, Download, DownloadHandle, DownloadId,
    DownloadStatus,
};
pub use watcher::{CompletionWatcher, WatchState};
