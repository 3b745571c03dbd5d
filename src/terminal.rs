// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal frontend window.
//!
//! Renders notifications, the status label and the downloads list to stdout.
//! Several windows can share one terminal; each output line is tagged with
//! the window's name.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::error::DownloadError;
use crate::list::ListRow;
use crate::window::{ListView, WindowContext};

/// Minimum width of the label column.
const LABEL_WIDTH: usize = 28;

/// What `save_session` writes.
#[derive(Debug, Serialize)]
struct SessionSnapshot<'a> {
    window: &'a str,
    saved_at: DateTime<Utc>,
    status_label: &'a str,
    listed: Vec<&'a str>,
}

/// A window drawn as lines on stdout.
pub struct TerminalWindow {
    name: String,
    session_path: PathBuf,
    status_label: String,
    rows: Vec<ListRow>,
    visible: bool,
    selected: Option<usize>,
    closed: bool,
}

impl TerminalWindow {
    pub fn new(name: impl Into<String>, session_path: PathBuf) -> Self {
        Self {
            name: name.into(),
            session_path,
            status_label: String::new(),
            rows: Vec::new(),
            visible: false,
            selected: None,
            closed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn tag(&self) -> colored::ColoredString {
        format!("[{}]", self.name).dimmed()
    }

    fn clamp_selection(&mut self) {
        let last = self.rows.len().saturating_sub(1);
        self.selected = match self.selected {
            _ if last == 0 => None,
            Some(row) => Some(row.clamp(1, last)),
            None => Some(1),
        };
    }

    fn render(&self) {
        if !self.visible {
            return;
        }
        let width = self
            .rows
            .iter()
            .map(|r| r.label.width())
            .max()
            .unwrap_or(0)
            .max(LABEL_WIDTH);

        println!("{}", self.tag());
        for (i, row) in self.rows.iter().enumerate() {
            let label = pad(&row.label, width);
            if i == 0 {
                println!("    {} {}", label.bold(), row.status.bold());
                continue;
            }
            let marker = if self.selected == Some(i) { "›" } else { " " };
            println!("  {} {} {}", marker.cyan(), label, color_status(&row.status));
        }
    }
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn color_status(status: &str) -> colored::ColoredString {
    match status {
        "finished" => status.green(),
        "cancelled" | "aborted" | "error" => status.red(),
        _ => status.cyan(),
    }
}

impl ListView for TerminalWindow {
    fn build(&mut self, rows: &[ListRow]) {
        self.rows = rows.to_vec();
        self.visible = true;
        self.clamp_selection();
        self.render();
    }

    fn update(&mut self, rows: &[ListRow]) -> Result<(), DownloadError> {
        if !self.visible {
            return Err(DownloadError::View("list is hidden".to_string()));
        }
        if rows.len() != self.rows.len() {
            return Err(DownloadError::View(format!(
                "expected {} rows, got {}",
                self.rows.len(),
                rows.len()
            )));
        }
        let changed = rows
            .iter()
            .zip(&self.rows)
            .any(|(new, old)| new.label != old.label || new.status != old.status);
        self.rows = rows.to_vec();
        if changed {
            self.render();
        }
        Ok(())
    }

    fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn select(&mut self, row: usize) {
        self.selected = Some(row);
        self.clamp_selection();
        self.render();
    }

    fn remove(&mut self, row: usize) {
        if row < self.rows.len() {
            self.rows.remove(row);
        }
        self.clamp_selection();
        self.render();
    }

    fn hide(&mut self) {
        self.visible = false;
        self.rows.clear();
        self.selected = None;
    }
}

impl WindowContext for TerminalWindow {
    fn notify(&mut self, text: &str) {
        println!("{} {}", self.tag(), text);
    }

    fn error(&mut self, text: &str) {
        println!("{} {}", self.tag(), text.red());
    }

    fn set_status_label(&mut self, text: &str) {
        if self.status_label == text {
            return;
        }
        self.status_label = text.to_string();
        if !text.is_empty() {
            println!("{} {}", self.tag(), text.yellow());
        }
    }

    fn list_view(&mut self) -> &mut dyn ListView {
        self
    }

    fn save_session(&mut self) -> Result<()> {
        let snapshot = SessionSnapshot {
            window: &self.name,
            saved_at: Utc::now(),
            status_label: &self.status_label,
            listed: self
                .rows
                .iter()
                .skip(1)
                .map(|r| r.label.as_str())
                .collect(),
        };
        let content = serde_json::to_string_pretty(&snapshot)?;
        if let Some(parent) = self.session_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.session_path, content)
            .with_context(|| format!("Failed to write {}", self.session_path.display()))?;
        tracing::info!(path = %self.session_path.display(), "session saved");
        Ok(())
    }

    fn close_win(&mut self) {
        self.closed = true;
        println!("{} {}", self.tag(), "closed".dimmed());
    }
}
