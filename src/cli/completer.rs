// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Tab completion and typeahead for dlman `:` commands.
//!
//! ## Example UX
//!
//! ```text
//! > :d
//!   :download <uri>     - Start a download
//!   :downloads          - Show the downloads list
//!   :ddelete <index>    - Stop tracking a download
//!   ...
//!
//! > :dopen <Tab>
//!   1
//!   2
//! ```

use std::borrow::Cow;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hint, Hinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper, Result};

/// Information about a `:` command.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    /// Primary command name (e.g., ":quit")
    pub name: &'static str,
    /// Alternative aliases (e.g., [":q"])
    pub aliases: &'static [&'static str],
    /// Short description shown in completion
    pub description: &'static str,
    /// Arguments this command accepts (for display)
    pub args: Option<&'static str>,
    pub arg_values: ArgValues,
}

/// Possible argument values for a command.
#[derive(Debug, Clone)]
pub enum ArgValues {
    None,
    /// Free text, nothing to complete
    Free,
    /// Positions of the tracked downloads
    DownloadIndex,
}

impl CommandInfo {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            aliases: &[],
            description,
            args: None,
            arg_values: ArgValues::None,
        }
    }

    pub const fn with_aliases(
        name: &'static str,
        aliases: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self {
            name,
            aliases,
            description,
            args: None,
            arg_values: ArgValues::None,
        }
    }

    pub const fn with_free_arg(mut self, args: &'static str) -> Self {
        self.args = Some(args);
        self.arg_values = ArgValues::Free;
        self
    }

    pub const fn with_index_arg(mut self) -> Self {
        self.args = Some("<index>");
        self.arg_values = ArgValues::DownloadIndex;
        self
    }

    /// Check if this command matches a given input prefix.
    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.name.starts_with(&input_lower)
            || self.aliases.iter().any(|a| a.starts_with(&input_lower))
    }

    /// Check if this command exactly matches a given input.
    pub fn exact_match(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.name == input_lower || self.aliases.iter().any(|a| *a == input_lower)
    }

    /// Get display string for completion menu.
    pub fn display_string(&self) -> String {
        if let Some(args) = self.args {
            format!("{} {} - {}", self.name, args, self.description)
        } else {
            format!("{} - {}", self.name, self.description)
        }
    }
}

/// All `:` commands.
pub static COMMANDS: &[CommandInfo] = &[
    CommandInfo::new(":download", "Start a download").with_free_arg("<uri>"),
    CommandInfo::new(":downloads", "Show the downloads list"),
    CommandInfo::new(":ddelete", "Stop tracking a download").with_index_arg(),
    CommandInfo::new(":dcancel", "Cancel a running download").with_index_arg(),
    CommandInfo::new(":drestart", "Download the same URI again").with_index_arg(),
    CommandInfo::new(":dclear", "Forget finished and failed downloads"),
    CommandInfo::new(":dopen", "Open a download when it finishes").with_index_arg(),
    CommandInfo::with_aliases(":quit", &[":q"], "Close this window"),
    CommandInfo::with_aliases(":quit!", &[":q!"], "Close even with running downloads"),
    CommandInfo::with_aliases(":writequit", &[":wq"], "Save the session and close"),
    CommandInfo::with_aliases(":writequit!", &[":wq!"], "Save and close even with running downloads"),
    CommandInfo::new(":winopen", "Open another window"),
    CommandInfo::with_aliases(":help", &[":h", ":?"], "Show all commands"),
];

/// Completer and hinter for the dlman prompt.
pub struct DlmanCompleter {
    /// Number of tracked downloads, for index completion
    download_count: usize,
}

impl DlmanCompleter {
    pub fn new() -> Self {
        Self { download_count: 0 }
    }

    pub fn set_download_count(&mut self, count: usize) {
        self.download_count = count;
    }

    fn get_completions(&self, line: &str, pos: usize) -> Vec<Pair> {
        let input = &line[..pos];
        if !input.starts_with(':') {
            return Vec::new();
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.len() <= 1 && !input.ends_with(' ') {
            self.complete_command(input)
        } else {
            let command = parts.first().copied().unwrap_or("");
            let arg_prefix = if input.ends_with(' ') {
                ""
            } else {
                parts.last().copied().unwrap_or("")
            };
            self.complete_arguments(command, arg_prefix, input)
        }
    }

    fn complete_command(&self, input: &str) -> Vec<Pair> {
        COMMANDS
            .iter()
            .filter(|cmd| cmd.matches(input))
            .map(|cmd| Pair {
                display: cmd.display_string(),
                replacement: format!("{} ", cmd.name),
            })
            .collect()
    }

    fn arg_values(&self, info: &CommandInfo) -> Vec<String> {
        match info.arg_values {
            ArgValues::None | ArgValues::Free => Vec::new(),
            ArgValues::DownloadIndex => (1..=self.download_count).map(|i| i.to_string()).collect(),
        }
    }

    fn complete_arguments(&self, command: &str, prefix: &str, full_input: &str) -> Vec<Pair> {
        let Some(info) = COMMANDS.iter().find(|c| c.exact_match(command)) else {
            return Vec::new();
        };

        let base = &full_input[..full_input.len() - prefix.len()];
        self.arg_values(info)
            .into_iter()
            .filter(|v| v.starts_with(prefix))
            .map(|v| Pair {
                display: v.clone(),
                replacement: format!("{}{}", base, v),
            })
            .collect()
    }

    fn get_hint(&self, line: &str) -> Option<CommandHint> {
        if !line.starts_with(':') {
            return None;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 1 || line.ends_with(' ') {
            return None;
        }

        let matches: Vec<_> = COMMANDS.iter().filter(|cmd| cmd.name.starts_with(line)).collect();
        if matches.len() != 1 {
            return None;
        }
        let cmd = matches[0];
        let remaining = &cmd.name[line.len()..];
        let hint = match cmd.args {
            Some(args) => format!("{} {} - {}", remaining, args, cmd.description),
            None => format!("{} - {}", remaining, cmd.description),
        };
        Some(CommandHint(hint))
    }
}

impl Default for DlmanCompleter {
    fn default() -> Self {
        Self::new()
    }
}

/// A hint displayed after the cursor in dim text.
#[derive(Debug, Clone)]
pub struct CommandHint(String);

impl Hint for CommandHint {
    fn display(&self) -> &str {
        &self.0
    }

    fn completion(&self) -> Option<&str> {
        None
    }
}

impl Completer for DlmanCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let start = if line.starts_with(':') { 0 } else { pos };
        Ok((start, self.get_completions(line, pos)))
    }
}

impl Hinter for DlmanCompleter {
    type Hint = CommandHint;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }
        self.get_hint(line)
    }
}

impl Highlighter for DlmanCompleter {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }

    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if !line.starts_with(':') {
            return Cow::Borrowed(line);
        }

        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, Some(r)),
            None => (line, None),
        };

        if COMMANDS.iter().any(|c| c.exact_match(command)) {
            let colored_cmd = format!("\x1b[36m{}\x1b[0m", command);
            match rest {
                Some(rest) => Cow::Owned(format!("{} {}", colored_cmd, rest)),
                None => Cow::Owned(colored_cmd),
            }
        } else if COMMANDS.iter().any(|c| c.matches(command)) {
            Cow::Owned(format!("\x1b[33m{}\x1b[0m", line))
        } else {
            Cow::Owned(format!("\x1b[31m{}\x1b[0m", line))
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for DlmanCompleter {}

impl Helper for DlmanCompleter {}

/// Help text listing every command and the key bindings.
pub fn help_text() -> String {
    let mut out = String::from("Commands:\n");
    for cmd in COMMANDS {
        let aliases = if cmd.aliases.is_empty() {
            String::new()
        } else {
            format!(" ({})", cmd.aliases.join(", "))
        };
        let args = cmd.args.map_or(String::new(), |a| format!(" {}", a));
        out.push_str(&format!("  {}{}{} - {}\n", cmd.name, args, aliases, cmd.description));
    }
    out.push_str("Keys:\n");
    out.push_str("  D  prompt for a download\n");
    out.push_str("  ZZ save and close   ZQ close\n");
    out.push_str("  in the list: d delete  c cancel  o open  r restart  j/k move  q exit");
    out
}

/// Split a `:` command into name and arguments.
/// Returns `None` if the input is not a known command.
pub fn parse_command(input: &str) -> Option<(&str, Vec<&str>)> {
    let input = input.trim();
    if !input.starts_with(':') {
        return None;
    }

    let mut parts = input.split_whitespace();
    let command = parts.next()?;
    let args = parts.collect();

    if COMMANDS.iter().any(|c| c.exact_match(command)) {
        Some((command, args))
    } else {
        None
    }
}

/// Check if input looks like a `:` command (even if invalid).
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with(':')
}

/// Get the canonical command name for an alias.
pub fn get_canonical_command(input: &str) -> Option<&'static str> {
    COMMANDS.iter().find(|c| c.exact_match(input)).map(|c| c.name)
}
