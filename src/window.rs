// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Window chrome seen by the download core.
//!
//! A window exposes a notification area, a status-bar label, an interactive
//! list widget and the session/close actions. The core never draws anything
//! itself; it only talks to these traits.

use std::fmt;

use indexmap::IndexMap;

use crate::error::DownloadError;
use crate::list::ListRow;

/// Identifier of a live window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window {}", self.0)
    }
}

/// The interactive list widget of a window.
pub trait ListView {
    /// Replace all rows and show the widget.
    fn build(&mut self, rows: &[ListRow]);
    /// Re-render the values of the existing rows.
    fn update(&mut self, rows: &[ListRow]) -> Result<(), DownloadError>;
    /// Index of the selected row, header included.
    fn selected(&self) -> Option<usize>;
    /// Move the selection to `row`.
    fn select(&mut self, row: usize);
    /// Remove one row.
    fn remove(&mut self, row: usize);
    fn hide(&mut self);
}

/// A browser window as far as downloads are concerned.
pub trait WindowContext {
    /// Show a transient informational message.
    fn notify(&mut self, text: &str);
    /// Show an error message.
    fn error(&mut self, text: &str);
    /// Set the downloads label in the status bar.
    fn set_status_label(&mut self, text: &str);
    fn list_view(&mut self) -> &mut dyn ListView;
    /// Persist session state before closing.
    fn save_session(&mut self) -> anyhow::Result<()>;
    fn close_win(&mut self);
}

/// The live windows, in opening order.
#[derive(Default)]
pub struct WindowSet {
    windows: IndexMap<WindowId, Box<dyn WindowContext>>,
    next_id: u32,
}

impl WindowSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window and return its id.
    pub fn open(&mut self, window: Box<dyn WindowContext>) -> WindowId {
        self.next_id += 1;
        let id = WindowId(self.next_id);
        self.windows.insert(id, window);
        tracing::debug!(window = id.0, "window registered");
        id
    }

    /// Forget a window. Does not call `close_win`.
    pub fn remove(&mut self, id: WindowId) -> Option<Box<dyn WindowContext>> {
        self.windows.shift_remove(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut (dyn WindowContext + 'static)> {
        self.windows.get_mut(&id).map(|w| w.as_mut())
    }

    /// The window itself, or the oldest live window if it has gone away.
    pub fn get_or_first(&mut self, id: WindowId) -> Option<&mut (dyn WindowContext + 'static)> {
        let key = if self.windows.contains_key(&id) {
            id
        } else {
            *self.windows.keys().next()?
        };
        self.get_mut(key)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (WindowId, &mut Box<dyn WindowContext>)> {
        self.windows.iter_mut().map(|(id, w)| (*id, w))
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Recording doubles for unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    pub struct WindowLog {
        pub notices: Vec<String>,
        pub errors: Vec<String>,
        pub labels: Vec<String>,
        pub built: Vec<Vec<ListRow>>,
        pub updates: Vec<Vec<ListRow>>,
        pub removed_rows: Vec<usize>,
        pub hidden: usize,
        pub saved: usize,
        pub closed: bool,
    }

    #[derive(Default)]
    pub struct RecordingWindow {
        pub log: Rc<RefCell<WindowLog>>,
        pub selected: Rc<RefCell<Option<usize>>>,
        pub fail_updates: bool,
        pub fail_save: bool,
    }

    impl RecordingWindow {
        pub fn new() -> (Self, Rc<RefCell<WindowLog>>) {
            let window = Self::default();
            let log = window.log.clone();
            (window, log)
        }
    }

    impl ListView for RecordingWindow {
        fn build(&mut self, rows: &[ListRow]) {
            self.log.borrow_mut().built.push(rows.to_vec());
        }

        fn update(&mut self, rows: &[ListRow]) -> Result<(), DownloadError> {
            if self.fail_updates {
                return Err(DownloadError::View("widget gone".to_string()));
            }
            self.log.borrow_mut().updates.push(rows.to_vec());
            Ok(())
        }

        fn selected(&self) -> Option<usize> {
            *self.selected.borrow()
        }

        fn select(&mut self, row: usize) {
            *self.selected.borrow_mut() = Some(row);
        }

        fn remove(&mut self, row: usize) {
            self.log.borrow_mut().removed_rows.push(row);
        }

        fn hide(&mut self) {
            self.log.borrow_mut().hidden += 1;
        }
    }

    impl WindowContext for RecordingWindow {
        fn notify(&mut self, text: &str) {
            self.log.borrow_mut().notices.push(text.to_string());
        }

        fn error(&mut self, text: &str) {
            self.log.borrow_mut().errors.push(text.to_string());
        }

        fn set_status_label(&mut self, text: &str) {
            self.log.borrow_mut().labels.push(text.to_string());
        }

        fn list_view(&mut self) -> &mut dyn ListView {
            self
        }

        fn save_session(&mut self) -> anyhow::Result<()> {
            if self.fail_save {
                anyhow::bail!("disk full");
            }
            self.log.borrow_mut().saved += 1;
            Ok(())
        }

        fn close_win(&mut self) {
            self.log.borrow_mut().closed = true;
        }
    }
}
