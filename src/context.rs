// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Application root for downloads.
//!
//! `DownloadContext` owns the registry, the live windows, the completion
//! watchers and one list model per window in list mode. Frontends feed it
//! commands and call [`DownloadContext::advance`] once per tick:
//!
//! ```text
//!  advance(dt)
//!    ├─ registry.tick     speed sampler, then status indicator
//!    ├─ watchers          poll, open finished files, drop settled watchers
//!    └─ list models       refresh rows of every window in list mode
//! ```

use std::collections::HashMap;
use std::time::Duration;

use crate::cli::{help_text, Command};
use crate::close_guard::{CloseGuard, CloseOutcome, CloseRequest};
use crate::config::DownloadsConfig;
use crate::download::engine::{CommandOpener, DefaultPathDialog, DirectoryLocation, DownloadEngine, FileOpener};
use crate::download::{CompletionWatcher, DownloadHandle, DownloadRegistry, Target};
use crate::error::{format_user_error, DownloadError};
use crate::list::{ListKey, ListModel};
use crate::status_indicator::StatusConfig;
use crate::window::{WindowContext, WindowId, WindowSet};

/// Creates a new frontend window for `:winopen`.
pub type WindowFactory = Box<dyn FnMut() -> Box<dyn WindowContext>>;

/// Everything the download commands operate on.
pub struct DownloadContext {
    registry: DownloadRegistry,
    windows: WindowSet,
    watchers: Vec<CompletionWatcher>,
    lists: HashMap<WindowId, ListModel>,
    opener: Box<dyn FileOpener>,
    guard: CloseGuard,
    window_factory: Option<WindowFactory>,
}

impl DownloadContext {
    pub fn new(registry: DownloadRegistry, opener: Box<dyn FileOpener>) -> Self {
        Self {
            registry,
            windows: WindowSet::new(),
            watchers: Vec::new(),
            lists: HashMap::new(),
            opener,
            guard: CloseGuard::new(),
            window_factory: None,
        }
    }

    /// Wire a context from user configuration.
    pub fn from_config(engine: Box<dyn DownloadEngine>, config: &DownloadsConfig) -> Self {
        let location = DirectoryLocation {
            dir: config.download_dir.clone(),
            enabled: config.auto_save,
        };
        let registry = DownloadRegistry::new(
            engine,
            Box::new(location),
            Box::new(DefaultPathDialog),
            config.download_dir.clone(),
        )
        .with_status_config(StatusConfig {
            show_label: config.show_status_label,
        });
        let opener = CommandOpener {
            command: config.open_command.clone(),
        };
        Self::new(registry, Box::new(opener))
    }

    pub fn with_window_factory(mut self, factory: WindowFactory) -> Self {
        self.window_factory = Some(factory);
        self
    }

    /// Register a window.
    pub fn open_window(&mut self, window: Box<dyn WindowContext>) -> WindowId {
        self.windows.open(window)
    }

    pub fn registry(&self) -> &DownloadRegistry {
        &self.registry
    }

    pub fn windows(&self) -> &WindowSet {
        &self.windows
    }

    pub fn watchers(&self) -> &[CompletionWatcher] {
        &self.watchers
    }

    pub fn list(&self, win: WindowId) -> Option<&ListModel> {
        self.lists.get(&win)
    }

    pub fn in_list_mode(&self, win: WindowId) -> bool {
        self.lists.contains_key(&win)
    }

    /// Run every poller for `dt` of elapsed time.
    pub fn advance(&mut self, dt: Duration) {
        self.registry.tick(dt, &mut self.windows);

        for watcher in &mut self.watchers {
            watcher.tick(dt, &mut self.windows, self.opener.as_mut());
        }
        self.watchers.retain(CompletionWatcher::is_watching);

        for model in self.lists.values_mut() {
            model.tick(dt, &self.registry, &mut self.windows);
        }

        if self.registry.is_empty() && !self.lists.is_empty() {
            let ids: Vec<WindowId> = self.lists.keys().copied().collect();
            for id in ids {
                self.leave_list(id);
            }
        }
    }

    /// Start a download requested from `win`.
    pub fn add(&mut self, win: WindowId, uri: &str) -> Result<Option<DownloadHandle>, DownloadError> {
        let window = window_in(&mut self.windows, win)?;
        let added = self.registry.add(uri, window)?;
        match &added {
            Some(download) => window.notify(&format!("Downloading {}", download.display_name())),
            None => window.notify("Download abandoned: no destination"),
        }
        Ok(added)
    }

    pub fn delete(&mut self, target: &Target) -> Result<DownloadHandle, DownloadError> {
        self.registry.delete(target)
    }

    pub fn cancel(&mut self, target: &Target) -> Result<DownloadHandle, DownloadError> {
        self.registry.cancel(target)
    }

    pub fn restart(&mut self, win: WindowId, target: &Target) -> Result<Option<DownloadHandle>, DownloadError> {
        let window = window_in(&mut self.windows, win)?;
        self.registry.restart(target, window)
    }

    /// Drop every download that is no longer running.
    pub fn clear(&mut self) -> usize {
        self.registry.clear()
    }

    /// Open a download in `win` once it finishes.
    ///
    /// A download that already has a watcher keeps that one.
    pub fn open(&mut self, win: WindowId, target: &Target) -> Result<DownloadHandle, DownloadError> {
        let download = self.registry.resolve(target)?;
        if self
            .watchers
            .iter()
            .any(|w| w.is_watching() && *w.download() == download)
        {
            tracing::debug!(id = download.id().0, "download already watched");
            return Ok(download);
        }
        self.watchers.push(CompletionWatcher::new(download.clone(), win));
        Ok(download)
    }

    /// Show the downloads list in `win`.
    pub fn enter_list(&mut self, win: WindowId) -> Result<(), DownloadError> {
        let window = window_in(&mut self.windows, win)?;
        if let Some(model) = self.lists.get_mut(&win) {
            model.rebuild(&self.registry, window.list_view());
            return Ok(());
        }
        if let Some(model) = ListModel::enter(win, &self.registry, window) {
            self.lists.insert(win, model);
        }
        Ok(())
    }

    pub fn leave_list(&mut self, win: WindowId) {
        let Some(mut model) = self.lists.remove(&win) else {
            return;
        };
        if let Some(window) = self.windows.get_mut(win) {
            model.leave(window);
        }
    }

    /// Handle a key pressed in list mode.
    pub fn list_key(&mut self, win: WindowId, key: ListKey) -> Result<(), DownloadError> {
        if key == ListKey::Exit {
            self.leave_list(win);
            return Ok(());
        }
        let Some(model) = self.lists.get_mut(&win) else {
            return Ok(());
        };
        let window = window_in(&mut self.windows, win)?;

        let step = match key {
            ListKey::Next => 1,
            ListKey::Prev => -1,
            _ => 0,
        };
        if step != 0 {
            model.move_selection(step, window.list_view());
            return Ok(());
        }

        let Some((row, download)) = model.selected(window.list_view()) else {
            return Ok(());
        };
        let target = Target::ByRef(download);

        match key {
            ListKey::Delete => {
                self.registry.delete(&target)?;
                model.remove_row(row, window.list_view());
                if self.registry.is_empty() {
                    model.leave(window);
                    self.lists.remove(&win);
                }
            }
            ListKey::Cancel => {
                self.registry.cancel(&target)?;
                model.refresh(&self.registry, window.list_view())?;
            }
            ListKey::Restart => {
                self.registry.restart(&target, window)?;
                model.rebuild(&self.registry, window.list_view());
            }
            ListKey::Open => {
                self.open(win, &target)?;
            }
            ListKey::Exit | ListKey::Next | ListKey::Prev => {}
        }
        Ok(())
    }

    /// True if closing one window would not lose running downloads.
    pub fn can_close(&self) -> bool {
        CloseGuard::can_close(self.windows.len(), self.registry.running_count())
    }

    /// Close `win` through the close guard.
    pub fn try_close(&mut self, win: WindowId, request: CloseRequest) -> Result<CloseOutcome, DownloadError> {
        let window_count = self.windows.len();
        let running = self.registry.running_count();
        let window = window_in(&mut self.windows, win)?;

        let outcome = self.guard.try_close(window, window_count, running, request);
        if outcome == CloseOutcome::Closed {
            self.lists.remove(&win);
            self.windows.remove(win);
            tracing::info!(window = win.0, remaining = self.windows.len(), "window closed");
        }
        Ok(outcome)
    }

    /// Run one command. Errors are returned to the caller.
    pub fn execute(&mut self, win: WindowId, command: Command) -> Result<(), DownloadError> {
        tracing::debug!(window = win.0, ?command, "executing command");
        match command {
            Command::Download(uri) => {
                self.add(win, &uri)?;
            }
            Command::Downloads => self.enter_list(win)?,
            Command::Delete(target) => {
                let download = self.delete(&target)?;
                window_in(&mut self.windows, win)?
                    .notify(&format!("Deleted {}", download.display_name()));
            }
            Command::Cancel(target) => {
                let download = self.cancel(&target)?;
                window_in(&mut self.windows, win)?
                    .notify(&format!("Cancelled {}", download.display_name()));
            }
            Command::Restart(target) => {
                if let Some(download) = self.restart(win, &target)? {
                    window_in(&mut self.windows, win)?
                        .notify(&format!("Restarted {}", download.display_name()));
                }
            }
            Command::Clear => {
                let removed = self.clear();
                window_in(&mut self.windows, win)?
                    .notify(&format!("Cleared {} download(s)", removed));
            }
            Command::Open(target) => {
                self.open(win, &target)?;
            }
            Command::Close(request) => {
                self.try_close(win, request)?;
            }
            Command::Help => window_in(&mut self.windows, win)?.notify(&help_text()),
            Command::WinOpen => {
                let factory = self
                    .window_factory
                    .as_mut()
                    .ok_or_else(|| DownloadError::UnknownCommand("winopen".to_string()))?;
                let id = self.windows.open(factory());
                tracing::info!(window = id.0, "window opened");
            }
        }
        Ok(())
    }

    /// Run one command and show any error in the window that issued it.
    pub fn dispatch(&mut self, win: WindowId, command: Command) {
        if let Err(e) = self.execute(win, command) {
            tracing::debug!(window = win.0, "command failed: {}", e);
            self.report(win, &e);
        }
    }

    /// Handle a list-mode key, showing any error in the window.
    pub fn dispatch_key(&mut self, win: WindowId, key: ListKey) {
        if let Err(e) = self.list_key(win, key) {
            tracing::debug!(window = win.0, "list key failed: {}", e);
            self.report(win, &e);
        }
    }

    /// Show an error in `win`.
    pub fn report(&mut self, win: WindowId, error: &DownloadError) {
        if let Some(window) = self.windows.get_mut(win) {
            window.error(&format_user_error(error));
        }
    }
}

fn window_in(windows: &mut WindowSet, win: WindowId) -> Result<&mut (dyn WindowContext + 'static), DownloadError> {
    windows
        .get_mut(win)
        .ok_or_else(|| DownloadError::View(format!("{} is not open", win)))
}
