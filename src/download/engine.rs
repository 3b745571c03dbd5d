// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Collaborators consumed by the download core.
//!
//! The engine performs the actual transfers; the hooks decide where files go
//! and how finished files are opened. None of them is implemented here apart
//! from the simple config-driven variants at the bottom of this file.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use super::types::DownloadHandle;
use crate::error::DownloadError;
use crate::window::WindowContext;

/// Creates downloads and owns them.
pub trait DownloadEngine {
    /// Create a download for `uri` in the `Created` state.
    fn create(&mut self, uri: &str) -> Result<DownloadHandle, DownloadError>;

    /// Drop a download that was created but never started.
    fn discard(&mut self, download: &DownloadHandle);
}

/// Supplies a destination before the user is asked.
pub trait LocationHook {
    /// Return a destination path, or `None` to fall back to the save dialog.
    /// An empty string is a contract violation.
    fn resolve(&mut self, uri: &str, suggested_filename: &str) -> Option<String>;
}

/// Asks the user where to save a file.
pub trait SaveDialog {
    fn choose(
        &mut self,
        title: &str,
        window: &mut dyn WindowContext,
        default_dir: &Path,
        suggested_name: &str,
    ) -> Option<PathBuf>;
}

/// Opens a finished file. Returns true on success.
pub trait FileOpener {
    fn open(&mut self, path: &Path, mime_type: Option<&str>, window: &mut dyn WindowContext) -> bool;
}

/// Location hook that saves straight into a directory when enabled.
#[derive(Debug, Clone)]
pub struct DirectoryLocation {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl LocationHook for DirectoryLocation {
    fn resolve(&mut self, _uri: &str, suggested_filename: &str) -> Option<String> {
        if !self.enabled || suggested_filename.is_empty() {
            return None;
        }
        Some(self.dir.join(suggested_filename).to_string_lossy().into_owned())
    }
}

/// Save dialog that accepts the default directory and name without asking.
#[derive(Debug, Clone, Default)]
pub struct DefaultPathDialog;

impl SaveDialog for DefaultPathDialog {
    fn choose(
        &mut self,
        title: &str,
        window: &mut dyn WindowContext,
        default_dir: &Path,
        suggested_name: &str,
    ) -> Option<PathBuf> {
        if suggested_name.is_empty() {
            return None;
        }
        let path = default_dir.join(suggested_name);
        window.notify(&format!("{}: {}", title, path.display()));
        Some(path)
    }
}

/// Opens files with an external command such as `xdg-open`.
#[derive(Debug, Clone)]
pub struct CommandOpener {
    pub command: String,
}

impl CommandOpener {
    /// Launch the command on `path` and reap it on a background thread.
    fn launch(&self, path: &Path) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
        let mut child = Command::new(&self.command)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let command = self.command.clone();
        std::thread::Builder::new()
            .name("dlman-opener".to_string())
            .spawn(move || {
                let status = child.wait();
                match &status {
                    Ok(status) if !status.success() => {
                        tracing::warn!(%command, %status, "opener exited with failure");
                    }
                    Err(e) => tracing::warn!(%command, "failed to wait for opener: {}", e),
                    Ok(_) => {}
                }
                status
            })
    }
}

impl FileOpener for CommandOpener {
    fn open(&mut self, path: &Path, mime_type: Option<&str>, _window: &mut dyn WindowContext) -> bool {
        tracing::debug!(command = %self.command, path = %path.display(), mime = ?mime_type, "opening file");
        match self.launch(path) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(command = %self.command, "failed to spawn opener: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_location_disabled() {
        let mut hook = DirectoryLocation {
            dir: PathBuf::from("/tmp"),
            enabled: false,
        };
        assert_eq!(hook.resolve("http://x/f", "f"), None);
    }

    #[test]
    fn test_directory_location_joins_name() {
        let mut hook = DirectoryLocation {
            dir: PathBuf::from("/tmp/dl"),
            enabled: true,
        };
        assert_eq!(
            hook.resolve("http://x/file.zip", "file.zip"),
            Some("/tmp/dl/file.zip".to_string())
        );
        assert_eq!(hook.resolve("http://x/", ""), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_opener_reaps_child() {
        let opener = CommandOpener {
            command: "true".to_string(),
        };
        let reaper = opener.launch(Path::new("/tmp/f")).unwrap();
        let status = reaper.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_command_opener_reports_missing_command() {
        let mut opener = CommandOpener {
            command: "dlman-no-such-opener".to_string(),
        };
        let mut window = crate::window::testing::RecordingWindow::default();
        assert!(!opener.open(Path::new("/tmp/f"), None, &mut window));
    }
}
