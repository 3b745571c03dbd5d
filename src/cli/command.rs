// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Typed commands and key bindings.

use super::completer::{get_canonical_command, parse_command};
use crate::close_guard::CloseRequest;
use crate::download::Target;
use crate::error::DownloadError;

/// Text pre-filled by the download prompt binding.
pub const DOWNLOAD_PROMPT: &str = ":download ";

/// A parsed `:` command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Download(String),
    Downloads,
    Delete(Target),
    Cancel(Target),
    Restart(Target),
    Clear,
    Open(Target),
    Close(CloseRequest),
    Help,
    WinOpen,
}

impl Command {
    /// Parse a line such as `:ddelete 2`.
    pub fn parse(input: &str) -> Result<Self, DownloadError> {
        let input = input.trim();
        let Some((name, args)) = parse_command(input) else {
            let name = input.split_whitespace().next().unwrap_or(input);
            return Err(DownloadError::UnknownCommand(name.to_string()));
        };
        let first = args.first().copied();
        let index = || {
            first
                .ok_or(DownloadError::MissingArgument("index"))
                .and_then(Target::parse)
        };

        let command = match get_canonical_command(name).unwrap_or(name) {
            ":download" => {
                let uri = first.ok_or(DownloadError::MissingArgument("uri"))?;
                Command::Download(uri.to_string())
            }
            ":downloads" => Command::Downloads,
            ":ddelete" => Command::Delete(index()?),
            ":dcancel" => Command::Cancel(index()?),
            ":drestart" => Command::Restart(index()?),
            ":dclear" => Command::Clear,
            ":dopen" => Command::Open(index()?),
            ":quit" => Command::Close(CloseRequest::quit()),
            ":quit!" => Command::Close(CloseRequest::quit().forced()),
            ":writequit" => Command::Close(CloseRequest::writequit()),
            ":writequit!" => Command::Close(CloseRequest::writequit().forced()),
            ":winopen" => Command::WinOpen,
            ":help" => Command::Help,
            other => return Err(DownloadError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// What a normal-mode key sequence does.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// Open the prompt with this text already typed
    Prompt(&'static str),
    Run(Command),
}

/// Normal-mode bindings.
pub fn normal_binding(keys: &str) -> Option<KeyAction> {
    match keys {
        "D" => Some(KeyAction::Prompt(DOWNLOAD_PROMPT)),
        "ZZ" => Some(KeyAction::Run(Command::Close(CloseRequest::writequit()))),
        "ZQ" => Some(KeyAction::Run(Command::Close(CloseRequest::quit()))),
        _ => None,
    }
}
