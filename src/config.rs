// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! User configuration, stored as JSON in `~/.dlman/config.json`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Where downloads are saved
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Save straight into `download_dir` without asking (default: false)
    #[serde(default)]
    pub auto_save: bool,
    /// Program used to open finished downloads
    #[serde(default = "default_open_command")]
    pub open_command: String,
    /// Show the running-downloads count in the status bar (default: true)
    #[serde(default = "default_show_status_label")]
    pub show_status_label: bool,
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_open_command() -> String {
    if cfg!(target_os = "macos") {
        "open".to_string()
    } else {
        "xdg-open".to_string()
    }
}

fn default_show_status_label() -> bool {
    true
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            auto_save: false,
            open_command: default_open_command(),
            show_status_label: default_show_status_label(),
        }
    }
}

/// `~/.dlman`, created if missing.
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let config_dir = home.join(".dlman");
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {}", config_dir.display()))?;
    }
    Ok(config_dir)
}

impl DownloadsConfig {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_dir()?.join(CONFIG_FILE))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_dir()?.join(CONFIG_FILE))
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
