//! Shared doubles for the scenario tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dlman::download::engine::{DefaultPathDialog, FileOpener, LocationHook};
use dlman::download::sim::SimulatedEngine;
use dlman::{DownloadContext, DownloadError, DownloadRegistry, ListRow, ListView, WindowContext, WindowId};

/// Everything a mock window saw.
#[derive(Debug, Default)]
pub struct Seen {
    pub notices: Vec<String>,
    pub errors: Vec<String>,
    pub labels: Vec<String>,
    pub builds: usize,
    pub updates: usize,
    pub hidden: usize,
    pub saved: usize,
    pub closed: bool,
    pub selected: Option<usize>,
}

pub type Shared<T> = Rc<RefCell<T>>;

pub struct MockWindow {
    pub seen: Shared<Seen>,
}

impl MockWindow {
    pub fn new() -> (Self, Shared<Seen>) {
        let seen = Rc::new(RefCell::new(Seen::default()));
        (Self { seen: seen.clone() }, seen)
    }
}

impl ListView for MockWindow {
    fn build(&mut self, _rows: &[ListRow]) {
        self.seen.borrow_mut().builds += 1;
    }

    fn update(&mut self, _rows: &[ListRow]) -> Result<(), DownloadError> {
        self.seen.borrow_mut().updates += 1;
        Ok(())
    }

    fn selected(&self) -> Option<usize> {
        self.seen.borrow().selected
    }

    fn select(&mut self, row: usize) {
        self.seen.borrow_mut().selected = Some(row);
    }

    fn remove(&mut self, _row: usize) {}

    fn hide(&mut self) {
        self.seen.borrow_mut().hidden += 1;
    }
}

impl WindowContext for MockWindow {
    fn notify(&mut self, text: &str) {
        self.seen.borrow_mut().notices.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.seen.borrow_mut().errors.push(text.to_string());
    }

    fn set_status_label(&mut self, text: &str) {
        self.seen.borrow_mut().labels.push(text.to_string());
    }

    fn list_view(&mut self) -> &mut dyn ListView {
        self
    }

    fn save_session(&mut self) -> anyhow::Result<()> {
        self.seen.borrow_mut().saved += 1;
        Ok(())
    }

    fn close_win(&mut self) {
        self.seen.borrow_mut().closed = true;
    }
}

/// Location hook that always answers the same thing.
pub struct FixedLocation(pub Shared<Option<String>>);

impl LocationHook for FixedLocation {
    fn resolve(&mut self, _uri: &str, _suggested: &str) -> Option<String> {
        self.0.borrow().clone()
    }
}

/// Opener recording every call.
#[derive(Clone, Default)]
pub struct MockOpener {
    pub calls: Shared<Vec<(PathBuf, Option<String>)>>,
}

impl FileOpener for MockOpener {
    fn open(&mut self, path: &Path, mime: Option<&str>, _window: &mut dyn WindowContext) -> bool {
        self.calls
            .borrow_mut()
            .push((path.to_path_buf(), mime.map(str::to_string)));
        true
    }
}

pub struct Harness {
    pub ctx: DownloadContext,
    pub engine: SimulatedEngine,
    pub location: Shared<Option<String>>,
    pub opener: MockOpener,
}

impl Harness {
    /// Context whose location hook answers `/tmp/f`.
    pub fn new() -> Self {
        let engine = SimulatedEngine::new(Some(10 * 1024), 1024);
        let location = Rc::new(RefCell::new(Some("/tmp/f".to_string())));
        let registry = DownloadRegistry::new(
            Box::new(engine.clone()),
            Box::new(FixedLocation(location.clone())),
            Box::new(DefaultPathDialog),
            PathBuf::from("/tmp"),
        );
        let opener = MockOpener::default();
        let ctx = DownloadContext::new(registry, Box::new(opener.clone()));
        Self {
            ctx,
            engine,
            location,
            opener,
        }
    }

    pub fn window(&mut self) -> (WindowId, Shared<Seen>) {
        let (window, seen) = MockWindow::new();
        (self.ctx.open_window(Box::new(window)), seen)
    }
}
