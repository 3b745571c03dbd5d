// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! dlman - interactive download manager demo
//!
//! Drives the download core from a terminal prompt. Transfers are simulated;
//! everything else (registry, pollers, list mode, close guard) is the real
//! thing, ticking once per second on a single-threaded runtime.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::time::MissedTickBehavior;

use dlman::cli::{is_command, normal_binding, Command, InteractiveInput, KeyAction};
use dlman::config::{get_config_dir, DownloadsConfig};
use dlman::download::sim::{SimulatedEngine, Throughput};
use dlman::terminal::TerminalWindow;
use dlman::{CloseRequest, DownloadContext, DownloadError, ListKey, WindowContext, WindowId, POLL_INTERVAL};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of every simulated transfer.
const SIM_TOTAL_SIZE: u64 = 16 * 1024 * 1024;

/// dlman - keyboard-driven download manager.
#[derive(Parser)]
#[command(name = "dlman")]
#[command(version = VERSION)]
#[command(about = "Keyboard-driven download manager with simulated transfers.")]
#[command(long_about = "dlman - keyboard-driven download manager\n\n\
    Start a download:    :download <uri>   (or press D)\n\
    Show the list:       :downloads\n\
    Close the window:    :quit             (ZQ, ZZ saves first)\n\n\
    Type :help at the prompt for every command.")]
struct Cli {
    /// URIs to start downloading right away
    uris: Vec<String>,

    /// Config file to use instead of ~/.dlman/config.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory to save downloads in
    #[arg(long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Save without asking for a location
    #[arg(long)]
    auto_save: bool,

    /// Verbose mode: debug logging on stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// One request for a line of input.
struct PromptRequest {
    prompt: String,
    initial: &'static str,
    download_count: usize,
}

/// What the input thread sends back.
enum InputEvent {
    Line(String),
    Eof,
    Failed(String),
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<DownloadsConfig> {
    let mut config = match &cli.config {
        Some(path) => DownloadsConfig::load_from(path)?,
        None => DownloadsConfig::load()?,
    };
    if let Some(dir) = &cli.download_dir {
        config.download_dir = dir.clone();
    }
    if cli.auto_save {
        config.auto_save = true;
    }
    Ok(config)
}

/// Read lines on a plain thread; the editor blocks, the event loop must not.
fn spawn_reader(requests: mpsc::Receiver<PromptRequest>, events: UnboundedSender<InputEvent>) -> Result<()> {
    std::thread::Builder::new()
        .name("dlman-input".to_string())
        .spawn(move || {
            let mut input = match InteractiveInput::new() {
                Ok(input) => input,
                Err(e) => {
                    let _ = events.send(InputEvent::Failed(format!("{:#}", e)));
                    return;
                }
            };
            while let Ok(request) = requests.recv() {
                input.set_download_count(request.download_count);
                let event = match input.read_line_with_initial(&request.prompt, request.initial) {
                    Ok(Some(line)) => InputEvent::Line(line),
                    Ok(None) => InputEvent::Eof,
                    Err(e) => InputEvent::Failed(format!("{:#}", e)),
                };
                let last = !matches!(event, InputEvent::Line(_));
                if events.send(event).is_err() || last {
                    break;
                }
            }
        })
        .context("Failed to start input thread")?;
    Ok(())
}

/// Handle one line typed in window `win`. Returns text to pre-fill the next
/// prompt with, if a binding asked for it.
fn handle_line(ctx: &mut DownloadContext, win: WindowId, line: &str) -> Option<&'static str> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if is_command(line) {
        match Command::parse(line) {
            Ok(command) => ctx.dispatch(win, command),
            Err(e) => ctx.report(win, &e),
        }
        return None;
    }

    if ctx.in_list_mode(win) {
        for c in line.chars().filter(|c| !c.is_whitespace()) {
            match ListKey::from_char(c) {
                Some(key) => ctx.dispatch_key(win, key),
                None => ctx.report(win, &DownloadError::UnknownCommand(c.to_string())),
            }
            if !ctx.in_list_mode(win) {
                break;
            }
        }
        return None;
    }

    match normal_binding(line) {
        Some(KeyAction::Prompt(initial)) => Some(initial),
        Some(KeyAction::Run(command)) => {
            ctx.dispatch(win, command);
            None
        }
        None => {
            ctx.report(win, &DownloadError::UnknownCommand(line.to_string()));
            None
        }
    }
}

fn prompt_for(ctx: &DownloadContext, win: WindowId, initial: &'static str) -> PromptRequest {
    let label = ctx.registry().indicator().label();
    let mode = if ctx.in_list_mode(win) { " list" } else { "" };
    let status = if label.is_empty() {
        String::new()
    } else {
        format!(" {}", label)
    };
    PromptRequest {
        prompt: format!("{}{}{}> ", format!("w{}", win.0).cyan(), mode, status),
        initial,
        download_count: ctx.registry().len(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let session_dir = get_config_dir()?.join("sessions");
    tracing::debug!(?config, "configuration loaded");

    let engine = SimulatedEngine::with_throughput(
        Some(SIM_TOTAL_SIZE),
        Throughput::Random {
            min: 256 * 1024,
            max: 2 * 1024 * 1024,
        },
    );

    let make_window = {
        let counter = Rc::new(Cell::new(0u32));
        move || -> Box<dyn WindowContext> {
            counter.set(counter.get() + 1);
            let name = format!("w{}", counter.get());
            let path = session_dir.join(format!("{}.json", name));
            Box::new(TerminalWindow::new(name, path))
        }
    };
    let first_window = make_window.clone()();

    let mut ctx = DownloadContext::from_config(Box::new(engine.clone()), &config)
        .with_window_factory(Box::new(make_window));
    let mut focus = ctx.open_window(first_window);

    println!(
        "{} {} - type {} for commands",
        "dlman".bold().cyan(),
        VERSION,
        ":help".cyan()
    );
    for uri in &cli.uris {
        ctx.dispatch(focus, Command::Download(uri.clone()));
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    let _ = ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    });

    let (event_tx, mut event_rx) = unbounded_channel();
    let (prompt_tx, prompt_rx) = mpsc::channel();
    spawn_reader(prompt_rx, event_tx)?;
    let mut input_open = prompt_tx.send(prompt_for(&ctx, focus, "")).is_ok();

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Transfers move by wall-clock time, pollers by whole ticks
                let now = Instant::now();
                engine.step(now - last_tick);
                last_tick = now;
                ctx.advance(POLL_INTERVAL);

                if interrupted.swap(false, Ordering::Relaxed) {
                    ctx.dispatch(focus, Command::Close(CloseRequest::quit()));
                }
                if !input_open && ctx.registry().running_count() == 0 {
                    tracing::info!("input closed and no downloads running");
                    break;
                }
            }
            event = event_rx.recv(), if input_open => {
                let windows_before = ctx.windows().len();
                let initial = match event {
                    Some(InputEvent::Line(line)) => handle_line(&mut ctx, focus, &line),
                    Some(InputEvent::Failed(e)) => {
                        tracing::warn!("input failed: {}", e);
                        input_open = false;
                        None
                    }
                    Some(InputEvent::Eof) | None => {
                        input_open = false;
                        None
                    }
                };

                if !input_open {
                    let running = ctx.registry().running_count();
                    if running > 0 {
                        println!("input closed, waiting for {} running download(s)", running);
                    }
                    continue;
                }
                if ctx.windows().is_empty() {
                    break;
                }
                let ids = ctx.windows().ids();
                if ids.len() > windows_before {
                    focus = ids.last().copied().unwrap_or(focus);
                } else if !ctx.windows().contains(focus) {
                    focus = ids.first().copied().unwrap_or(focus);
                }
                input_open = prompt_tx.send(prompt_for(&ctx, focus, initial.unwrap_or(""))).is_ok();
            }
        }

        if ctx.windows().is_empty() {
            break;
        }
    }

    Ok(())
}
