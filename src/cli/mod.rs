// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! CLI module for the dlman prompt.
//!
//! This module provides:
//! - The `:` command table with tab completion and hints
//! - Typed command parsing and normal-mode key bindings
//! - Line input with history and pre-filled prompts
//!
//! ## Example
//!
//! ```no_run
//! use dlman::cli::{Command, InteractiveInput};
//!
//! let mut input = InteractiveInput::new()?;
//! while let Some(line) = input.read_line("dlman> ")? {
//!     match Command::parse(&line) {
//!         Ok(command) => println!("{:?}", command),
//!         Err(e) => println!("{}", e),
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod command;
pub mod completer;
pub mod input;

pub use command::{normal_binding, Command, KeyAction, DOWNLOAD_PROMPT};
pub use completer::{
    get_canonical_command, help_text, is_command, parse_command, CommandInfo, DlmanCompleter,
    COMMANDS,
};
pub use input::InteractiveInput;
