// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Interactive downloads list.
//!
//! Entering list mode builds one row per tracked download below a header row
//! and starts a refresh timer. Each tick re-renders the row values in place.
//! When the registry's membership or order no longer matches the rows (for
//! example after `:ddelete` from another window) the rows are rebuilt instead.

use std::time::Duration;

use crate::download::{
    eta_seconds, eta_string, size_string, speed_string, DownloadHandle, DownloadRegistry,
};
use crate::error::DownloadError;
use crate::timer::IntervalTimer;
use crate::window::{ListView, WindowContext, WindowId, WindowSet};

/// Transient help shown when list mode opens.
pub const LIST_HELP: &str = "d delete  c cancel  o open  r restart  j/k move  q exit";

/// Message shown when there is nothing to list.
pub const NO_DOWNLOADS: &str = "No downloads";

/// One line of the list: label, status text and the download it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub label: String,
    pub status: String,
    /// `None` for the header row
    pub download: Option<DownloadHandle>,
}

impl ListRow {
    pub fn header() -> Self {
        Self {
            label: "Download".to_string(),
            status: "Status".to_string(),
            download: None,
        }
    }

    /// Row for the download at 1-based `position`.
    pub fn for_download(position: usize, download: &DownloadHandle, registry: &DownloadRegistry) -> Self {
        Self {
            label: format!("{} {}", position, download.display_name()),
            status: status_text(download, registry),
            download: Some(download.clone()),
        }
    }

    pub fn is_header(&self) -> bool {
        self.download.is_none()
    }
}

/// Live progress for running downloads, the bare status otherwise.
pub fn status_text(download: &DownloadHandle, registry: &DownloadRegistry) -> String {
    let status = download.status();
    if !status.is_running() {
        return status.to_string();
    }

    let current = download.current_size();
    let total = download.total_size();
    let speed = registry.get_speed(download.id());
    let total_text = total.map(size_string).unwrap_or_else(|| "?".to_string());

    let mut text = format!(
        "{:.0}% {}/{} {}",
        download.progress() * 100.0,
        size_string(current),
        total_text,
        speed_string(speed)
    );
    if let Some(eta) = eta_seconds(current, total, speed) {
        text.push_str(&format!(" {} left", eta_string(eta)));
    }
    text
}

/// Keys understood in list mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKey {
    Delete,
    Cancel,
    Open,
    Restart,
    Exit,
    Next,
    Prev,
}

impl ListKey {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(ListKey::Delete),
            'c' => Some(ListKey::Cancel),
            'o' => Some(ListKey::Open),
            'r' => Some(ListKey::Restart),
            'q' => Some(ListKey::Exit),
            'j' => Some(ListKey::Next),
            'k' => Some(ListKey::Prev),
            _ => None,
        }
    }
}

/// The list shown in one window.
#[derive(Debug)]
pub struct ListModel {
    window: WindowId,
    rows: Vec<ListRow>,
    timer: IntervalTimer,
}

impl ListModel {
    /// Open list mode in `window`. Returns `None`, after telling the user,
    /// when there is nothing to show.
    pub fn enter(
        id: WindowId,
        registry: &DownloadRegistry,
        window: &mut dyn WindowContext,
    ) -> Option<Self> {
        if registry.is_empty() {
            window.notify(NO_DOWNLOADS);
            return None;
        }

        let mut model = Self {
            window: id,
            rows: Vec::new(),
            timer: IntervalTimer::poller("list-refresh"),
        };
        model.rebuild(registry, window.list_view());
        if model.rows.len() > 1 {
            window.list_view().select(1);
        }
        model.timer.start();
        window.notify(LIST_HELP);
        tracing::debug!(window = id.0, rows = model.rows.len(), "list mode entered");
        Some(model)
    }

    /// Stop refreshing and hide the widget.
    pub fn leave(&mut self, window: &mut dyn WindowContext) {
        self.timer.stop();
        window.list_view().hide();
        tracing::debug!(window = self.window.0, "list mode left");
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn is_refreshing(&self) -> bool {
        self.timer.is_running()
    }

    /// Build the rows from scratch and hand them to the widget.
    pub fn rebuild(&mut self, registry: &DownloadRegistry, view: &mut dyn ListView) {
        let mut rows = Vec::with_capacity(registry.len() + 1);
        rows.push(ListRow::header());
        rows.extend(
            registry
                .entries()
                .iter()
                .enumerate()
                .map(|(i, d)| ListRow::for_download(i + 1, d, registry)),
        );
        self.rows = rows;
        view.build(&self.rows);
    }

    /// Bring the rows up to date with the registry.
    ///
    /// Values are re-rendered in place while the rows still match the
    /// registry entry for entry; otherwise the rows are rebuilt.
    pub fn refresh(&mut self, registry: &DownloadRegistry, view: &mut dyn ListView) -> Result<(), DownloadError> {
        if !self.matches(registry) {
            self.rebuild(registry, view);
            return Ok(());
        }
        for (i, row) in self.rows.iter_mut().enumerate().skip(1) {
            if let Some(download) = row.download.clone() {
                *row = ListRow::for_download(i, &download, registry);
            }
        }
        view.update(&self.rows)
    }

    /// Run the refresh timer for `dt`. A failing refresh is logged and the
    /// timer keeps going.
    pub fn tick(&mut self, dt: Duration, registry: &DownloadRegistry, windows: &mut WindowSet) {
        if !self.timer.advance(dt) {
            return;
        }
        let Some(window) = windows.get_mut(self.window) else {
            self.timer.stop();
            return;
        };
        if let Err(e) = self.refresh(registry, window.list_view()) {
            tracing::warn!(window = self.window.0, "list refresh failed: {}", e);
        }
    }

    /// Row index and download under the widget's selection.
    pub fn selected(&self, view: &dyn ListView) -> Option<(usize, DownloadHandle)> {
        let row = view.selected()?;
        let download = self.rows.get(row)?.download.clone()?;
        Some((row, download))
    }

    /// Drop one row, keeping the header, and show the renumbered labels.
    pub fn remove_row(&mut self, row: usize, view: &mut dyn ListView) {
        if row == 0 || row >= self.rows.len() {
            return;
        }
        self.rows.remove(row);
        view.remove(row);
        if row == self.rows.len() {
            return;
        }
        // Renumber the positional labels of the rows that moved up
        for (i, r) in self.rows.iter_mut().enumerate().skip(row) {
            if let Some(download) = &r.download {
                r.label = format!("{} {}", i, download.display_name());
            }
        }
        if let Err(e) = view.update(&self.rows) {
            tracing::warn!(window = self.window.0, "relabel after removal failed: {}", e);
        }
    }

    /// Move the selection by `delta` rows, never onto the header.
    pub fn move_selection(&self, delta: isize, view: &mut dyn ListView) {
        if self.rows.len() <= 1 {
            return;
        }
        let current = view.selected().unwrap_or(1) as isize;
        let last = (self.rows.len() - 1) as isize;
        let next = (current + delta).clamp(1, last);
        view.select(next as usize);
    }

    /// True if the rows are exactly the registry entries in order.
    fn matches(&self, registry: &DownloadRegistry) -> bool {
        let listed = self.rows.iter().filter_map(|r| r.download.as_ref());
        listed.clone().count() == registry.len()
            && listed.zip(registry.entries()).all(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::engine::{DirectoryLocation, DefaultPathDialog};
    use crate::download::sim::SimulatedEngine;
    use crate::download::Target;
    use crate::window::testing::RecordingWindow;
    use std::path::PathBuf;

    fn registry() -> (DownloadRegistry, SimulatedEngine) {
        let engine = SimulatedEngine::new(Some(2048), 1024);
        let registry = DownloadRegistry::new(
            Box::new(engine.clone()),
            Box::new(DirectoryLocation { dir: PathBuf::from("/dl"), enabled: true }),
            Box::new(DefaultPathDialog),
            PathBuf::from("/dl"),
        );
        (registry, engine)
    }

    #[test]
    fn test_enter_empty_registry_does_not_activate() {
        let (registry, _) = registry();
        let (mut window, log) = RecordingWindow::new();
        assert!(ListModel::enter(WindowId(1), &registry, &mut window).is_none());
        assert_eq!(log.borrow().notices, vec![NO_DOWNLOADS.to_string()]);
        assert!(log.borrow().built.is_empty());
    }

    #[test]
    fn test_enter_builds_header_and_rows() {
        let (mut registry, engine) = registry();
        let (mut window, log) = RecordingWindow::new();
        let a = registry.add("http://x/a.zip", &mut window).unwrap().unwrap();
        registry.add("http://x/b.txt", &mut window).unwrap();
        engine.get(a.id()).unwrap().finish();

        let model = ListModel::enter(WindowId(1), &registry, &mut window).unwrap();
        assert!(model.is_refreshing());

        let rows = model.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_header());
        assert_eq!(rows[1].label, "1 a.zip");
        assert_eq!(rows[1].status, "finished");
        assert_eq!(rows[2].label, "2 b.txt");
        assert!(rows[2].status.starts_with("0% 0B/2.0KB"));
        assert_eq!(log.borrow().built.len(), 1);
        assert_eq!(log.borrow().notices.last().map(String::as_str), Some(LIST_HELP));
        assert_eq!(*window.selected.borrow(), Some(1));
    }

    #[test]
    fn test_tick_updates_values_without_rebuild() {
        let (mut registry, engine) = registry();
        let mut windows = WindowSet::new();
        let (mut window, log) = RecordingWindow::new();
        let a = registry.add("http://x/a.zip", &mut window).unwrap().unwrap();
        let mut model = ListModel::enter(WindowId(1), &registry, &mut window).unwrap();
        let id = windows.open(Box::new(window));
        assert_eq!(id, WindowId(1));

        engine.get(a.id()).unwrap().finish();
        model.tick(Duration::from_secs(1), &registry, &mut windows);

        let log = log.borrow();
        assert_eq!(log.built.len(), 1);
        assert_eq!(log.updates.len(), 1);
        assert_eq!(log.updates[0][1].status, "finished");
    }

    #[test]
    fn test_membership_change_rebuilds() {
        let (mut registry, _) = registry();
        let mut windows = WindowSet::new();
        let (mut window, log) = RecordingWindow::new();
        registry.add("http://x/a", &mut window).unwrap();
        registry.add("http://x/b", &mut window).unwrap();
        let mut model = ListModel::enter(WindowId(1), &registry, &mut window).unwrap();
        windows.open(Box::new(window));

        registry.delete(&Target::ByIndex(1)).unwrap();
        model.tick(Duration::from_secs(1), &registry, &mut windows);

        assert_eq!(log.borrow().built.len(), 2);
        assert!(log.borrow().updates.is_empty());
        assert_eq!(model.rows().len(), 2);
        assert_eq!(model.rows()[1].label, "1 b");
    }

    #[test]
    fn test_failing_refresh_keeps_timer() {
        let (mut registry, _) = registry();
        let mut windows = WindowSet::new();
        let (mut window, _log) = RecordingWindow::new();
        window.fail_updates = true;
        registry.add("http://x/a", &mut window).unwrap();
        let mut model = ListModel::enter(WindowId(1), &registry, &mut window).unwrap();
        windows.open(Box::new(window));

        model.tick(Duration::from_secs(2), &registry, &mut windows);
        assert!(model.is_refreshing());
    }

    #[test]
    fn test_remove_row_renumbers() {
        let (mut registry, _) = registry();
        let (mut window, log) = RecordingWindow::new();
        for uri in ["http://x/a", "http://x/b", "http://x/c"] {
            registry.add(uri, &mut window).unwrap();
        }
        let mut model = ListModel::enter(WindowId(1), &registry, &mut window).unwrap();

        model.remove_row(1, &mut window);
        assert_eq!(log.borrow().removed_rows, vec![1]);
        let labels: Vec<_> = model.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Download", "1 b", "2 c"]);

        // The widget sees the new numbers right away
        let shown: Vec<_> = log.borrow().updates[0]
            .iter()
            .map(|r| r.label.clone())
            .collect();
        assert_eq!(shown, vec!["Download", "1 b", "2 c"]);

        // Nothing moves up when the last row goes
        model.remove_row(2, &mut window);
        assert_eq!(log.borrow().updates.len(), 1);

        // Header cannot be removed
        model.remove_row(0, &mut window);
        assert_eq!(model.rows().len(), 2);
    }

    #[test]
    fn test_selection_skips_header() {
        let (mut registry, _) = registry();
        let (mut window, _) = RecordingWindow::new();
        registry.add("http://x/a", &mut window).unwrap();
        registry.add("http://x/b", &mut window).unwrap();
        let model = ListModel::enter(WindowId(1), &registry, &mut window).unwrap();

        model.move_selection(-1, &mut window);
        assert_eq!(*window.selected.borrow(), Some(1));
        model.move_selection(5, &mut window);
        assert_eq!(*window.selected.borrow(), Some(2));

        let (row, download) = model.selected(&window).unwrap();
        assert_eq!(row, 2);
        assert_eq!(download.uri(), "http://x/b");
    }

    #[test]
    fn test_leave_stops_refresh_and_hides() {
        let (mut registry, _) = registry();
        let (mut window, log) = RecordingWindow::new();
        registry.add("http://x/a", &mut window).unwrap();
        let mut model = ListModel::enter(WindowId(1), &registry, &mut window).unwrap();

        model.leave(&mut window);
        assert!(!model.is_refreshing());
        assert_eq!(log.borrow().hidden, 1);
    }

    #[test]
    fn test_list_keys() {
        assert_eq!(ListKey::from_char('d'), Some(ListKey::Delete));
        assert_eq!(ListKey::from_char('q'), Some(ListKey::Exit));
        assert_eq!(ListKey::from_char('x'), None);
    }
}
