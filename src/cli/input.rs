// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Interactive input handling for the dlman prompt.
//!
//! Provides command-line input with:
//! - Tab completion for `:` commands and download indices
//! - Command history in `~/.dlman/history.txt`
//! - Inline hints
//! - Pre-filled prompts for key bindings

use anyhow::{Context, Result};
use rustyline::history::DefaultHistory;
use rustyline::{ColorMode, CompletionType, Config, EditMode, Editor};
use std::path::PathBuf;

use super::completer::DlmanCompleter;

/// History file name in config directory.
const HISTORY_FILE: &str = "history.txt";

/// Maximum history entries to keep.
const MAX_HISTORY_ENTRIES: usize = 1000;

/// Interactive input handler with tab completion and history.
pub struct InteractiveInput {
    editor: Editor<DlmanCompleter, DefaultHistory>,
    history_path: Option<PathBuf>,
}

impl InteractiveInput {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .history_ignore_dups(true)?
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .color_mode(ColorMode::Enabled)
            .auto_add_history(true)
            .max_history_size(MAX_HISTORY_ENTRIES)?
            .build();

        let mut editor = Editor::with_config(config).context("Failed to create input editor")?;
        editor.set_helper(Some(DlmanCompleter::new()));

        let history_path = Self::get_history_path();
        if let Some(ref path) = history_path {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    tracing::debug!("could not load history: {}", e);
                }
            }
        }

        Ok(Self {
            editor,
            history_path,
        })
    }

    fn get_history_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dlman").join(HISTORY_FILE))
    }

    /// Keep index completion in step with the registry.
    pub fn set_download_count(&mut self, count: usize) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.set_download_count(count);
        }
    }

    /// Read a line of input with the given prompt.
    ///
    /// Returns `Ok(Some(line))` on input, `Ok(None)` on EOF (Ctrl+D).
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.read_line_with_initial(prompt, "")
    }

    /// Read a line with `initial` already typed after the prompt.
    pub fn read_line_with_initial(&mut self, prompt: &str, initial: &str) -> Result<Option<String>> {
        match self.editor.readline_with_initial(prompt, (initial, "")) {
            Ok(line) => {
                self.save_history();
                Ok(Some(line))
            }
            Err(rustyline::error::ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(rustyline::error::ReadlineError::Eof) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Input error: {}", e)),
        }
    }

    fn save_history(&mut self) {
        let Some(ref path) = self.history_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = self.editor.save_history(path) {
            tracing::debug!("could not save history: {}", e);
        }
    }
}
