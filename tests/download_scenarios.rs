//! Scenario tests for the download core.
//!
//! Each test drives a `DownloadContext` the way the prompt does: commands go
//! through `dispatch`, time goes through `advance`, and transfers progress
//! only when the simulated engine is stepped.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::Harness;
use dlman::cli::Command;
use dlman::download::WatchState;
use dlman::{CloseOutcome, CloseRequest, DownloadStatus, ListKey, Target};

const TICK: Duration = Duration::from_secs(1);

// =============================================================================
// Registry
// =============================================================================

#[test]
fn test_add_with_location_hook() {
    let mut h = Harness::new();
    let (win, seen) = h.window();

    h.ctx.dispatch(win, Command::parse(":download http://x/f").unwrap());

    let registry = h.ctx.registry();
    assert_eq!(registry.len(), 1);
    let download = &registry.entries()[0];
    assert_eq!(download.status(), DownloadStatus::Started);
    assert_eq!(download.destination(), Some(PathBuf::from("/tmp/f")));
    assert!(registry.sampler().is_running());
    assert!(seen.borrow().errors.is_empty());
}

#[test]
fn test_ddelete_shifts_indices() {
    let mut h = Harness::new();
    let (win, _) = h.window();
    let first = h.ctx.add(win, "http://x/a").unwrap().unwrap();
    let second = h.ctx.add(win, "http://x/b").unwrap().unwrap();

    h.ctx.dispatch(win, Command::parse(":ddelete 1").unwrap());

    let registry = h.ctx.registry();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.resolve(&Target::ByIndex(1)), Ok(second));
    assert_eq!(first.status(), DownloadStatus::Cancelled);
}

#[test]
fn test_bad_index_arguments_are_reported() {
    let mut h = Harness::new();
    let (win, seen) = h.window();
    h.ctx.add(win, "http://x/a").unwrap();

    h.ctx.dispatch(win, Command::parse(":dcancel 5").unwrap());
    match Command::parse(":dcancel five") {
        Ok(command) => h.ctx.dispatch(win, command),
        Err(e) => h.ctx.report(win, &e),
    }

    let errors = &seen.borrow().errors;
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("Invalid download index: 5"));
    assert!(errors[1].starts_with("Invalid download reference"));
    assert_eq!(h.ctx.registry().len(), 1);
}

#[test]
fn test_restart_is_all_or_nothing() {
    let mut h = Harness::new();
    let (win, _) = h.window();
    // No suggested file name, so the save dialog cannot offer a path
    let original = h.ctx.add(win, "http://x/").unwrap().unwrap();

    *h.location.borrow_mut() = None;
    assert_eq!(h.ctx.restart(win, &Target::ByIndex(1)), Ok(None));
    assert_eq!(h.ctx.registry().entries(), &[original.clone()]);

    *h.location.borrow_mut() = Some(String::new());
    assert!(h.ctx.restart(win, &Target::ByIndex(1)).is_err());
    assert_eq!(h.ctx.registry().entries(), &[original.clone()]);
    assert_eq!(original.status(), DownloadStatus::Started);

    *h.location.borrow_mut() = Some("/tmp/g".to_string());
    let replacement = h.ctx.restart(win, &Target::ByIndex(1)).unwrap().unwrap();
    assert_eq!(h.ctx.registry().entries(), &[replacement.clone()]);
    assert_eq!(replacement.destination(), Some(PathBuf::from("/tmp/g")));
    assert_eq!(original.status(), DownloadStatus::Cancelled);
}

#[test]
fn test_dclear_keeps_running_in_order() {
    let mut h = Harness::new();
    let (win, _) = h.window();
    let handles: Vec<_> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|n| h.ctx.add(win, &format!("http://x/{}", n)).unwrap().unwrap())
        .collect();
    h.engine.get(handles[0].id()).unwrap().finish();
    h.ctx.cancel(&Target::ByIndex(3)).unwrap();
    h.engine.get(handles[4].id()).unwrap().set_status(DownloadStatus::Aborted);

    h.ctx.dispatch(win, Command::Clear);

    assert_eq!(
        h.ctx.registry().entries(),
        &[handles[1].clone(), handles[3].clone()]
    );
}

// =============================================================================
// Pollers
// =============================================================================

#[test]
fn test_speed_follows_engine_progress() {
    let mut h = Harness::new();
    let (win, _) = h.window();
    let download = h.ctx.add(win, "http://x/a").unwrap().unwrap();

    assert_eq!(h.ctx.registry().get_speed(download.id()), 0);
    h.ctx.advance(TICK);
    assert_eq!(h.ctx.registry().get_speed(download.id()), 0);

    h.engine.step(TICK);
    h.ctx.advance(TICK);
    assert_eq!(h.ctx.registry().get_speed(download.id()), 1024);

    h.engine.step(Duration::from_millis(500));
    h.ctx.advance(TICK);
    assert_eq!(h.ctx.registry().get_speed(download.id()), 512);
}

#[test]
fn test_pollers_stop_within_one_tick_of_empty_registry() {
    let mut h = Harness::new();
    let (win, seen) = h.window();
    h.ctx.add(win, "http://x/a").unwrap();
    h.ctx.add(win, "http://x/b").unwrap();
    h.ctx.advance(TICK);
    assert_eq!(seen.borrow().labels.last().map(String::as_str), Some("2↓"));

    h.ctx.delete(&Target::ByIndex(1)).unwrap();
    h.ctx.delete(&Target::ByIndex(1)).unwrap();
    assert!(h.ctx.registry().is_polling());

    h.ctx.advance(TICK);
    assert!(!h.ctx.registry().is_polling());
    assert_eq!(seen.borrow().labels.last().map(String::as_str), Some(""));

    let pushed = seen.borrow().labels.len();
    h.ctx.advance(Duration::from_secs(10));
    assert_eq!(seen.borrow().labels.len(), pushed);
}

#[test]
fn test_status_label_reaches_every_window() {
    let mut h = Harness::new();
    let (first, seen_first) = h.window();
    let (_second, seen_second) = h.window();
    let download = h.ctx.add(first, "http://x/a").unwrap().unwrap();
    h.ctx.add(first, "http://x/b").unwrap();
    h.engine.get(download.id()).unwrap().finish();

    h.ctx.advance(TICK);
    assert_eq!(seen_first.borrow().labels.last().map(String::as_str), Some("1↓"));
    assert_eq!(seen_second.borrow().labels.last().map(String::as_str), Some("1↓"));
}

// =============================================================================
// Completion watcher
// =============================================================================

#[test]
fn test_dopen_on_finished_download() {
    let mut h = Harness::new();
    let (win, seen) = h.window();
    let download = h.ctx.add(win, "http://x/report.pdf").unwrap().unwrap();
    h.engine.get(download.id()).unwrap().finish();

    h.ctx.dispatch(win, Command::parse(":dopen 1").unwrap());
    h.ctx.advance(TICK);
    h.ctx.advance(Duration::from_secs(5));

    assert_eq!(
        *h.opener.calls.borrow(),
        vec![(PathBuf::from("/tmp/f"), Some("application/pdf".to_string()))]
    );
    assert!(h.ctx.watchers().is_empty());
    assert!(seen.borrow().errors.is_empty());
}

#[test]
fn test_dopen_waits_for_transfer_to_finish() {
    let mut h = Harness::new();
    let (win, _) = h.window();
    h.ctx.add(win, "http://x/a.txt").unwrap();
    h.ctx.open(win, &Target::ByIndex(1)).unwrap();

    for _ in 0..9 {
        h.engine.step(TICK);
        h.ctx.advance(TICK);
    }
    assert!(h.opener.calls.borrow().is_empty());
    assert_eq!(h.ctx.watchers()[0].state(), WatchState::Watching);

    h.engine.step(TICK);
    h.ctx.advance(TICK);
    assert_eq!(h.opener.calls.borrow().len(), 1);
}

#[test]
fn test_dopen_on_cancelled_download_gives_up() {
    let mut h = Harness::new();
    let (win, seen) = h.window();
    h.ctx.add(win, "http://x/a").unwrap();
    h.ctx.open(win, &Target::ByIndex(1)).unwrap();

    h.ctx.dispatch(win, Command::Cancel(Target::ByIndex(1)));
    h.ctx.advance(TICK);

    assert!(h.opener.calls.borrow().is_empty());
    assert!(h.ctx.watchers().is_empty());
    assert!(seen
        .borrow()
        .notices
        .iter()
        .any(|n| n.starts_with("Not opening")));
}

// =============================================================================
// List mode
// =============================================================================

#[test]
fn test_list_follows_changes_from_another_window() {
    let mut h = Harness::new();
    let (listing, seen) = h.window();
    let (other, _) = h.window();
    h.ctx.add(other, "http://x/a").unwrap();
    h.ctx.add(other, "http://x/b").unwrap();

    h.ctx.dispatch(listing, Command::Downloads);
    h.ctx.advance(TICK);
    assert_eq!(seen.borrow().builds, 1);
    assert_eq!(seen.borrow().updates, 1);

    h.ctx.dispatch(other, Command::Delete(Target::ByIndex(1)));
    h.ctx.advance(TICK);
    assert_eq!(seen.borrow().builds, 2);

    let rows = h.ctx.list(listing).unwrap().rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].label, "1 f");
}

#[test]
fn test_list_keys_act_on_selection() {
    let mut h = Harness::new();
    let (win, _) = h.window();
    let a = h.ctx.add(win, "http://x/a").unwrap().unwrap();
    let b = h.ctx.add(win, "http://x/b").unwrap().unwrap();
    h.ctx.enter_list(win).unwrap();

    h.ctx.dispatch_key(win, ListKey::Next);
    h.ctx.dispatch_key(win, ListKey::Cancel);
    assert_eq!(b.status(), DownloadStatus::Cancelled);
    assert_eq!(a.status(), DownloadStatus::Started);

    h.ctx.dispatch_key(win, ListKey::Exit);
    assert!(!h.ctx.in_list_mode(win));
}

// =============================================================================
// Close guard
// =============================================================================

#[test]
fn test_quit_blocked_until_forced() {
    let mut h = Harness::new();
    let (win, seen) = h.window();
    h.ctx.add(win, "http://x/a").unwrap();
    assert!(!h.ctx.can_close());

    h.ctx.dispatch(win, Command::parse(":quit").unwrap());
    assert!(!seen.borrow().closed);
    assert_eq!(h.ctx.windows().len(), 1);
    assert!(seen.borrow().errors[0].contains("quit!"));

    h.ctx.dispatch(win, Command::parse(":quit!").unwrap());
    assert!(seen.borrow().closed);
    assert!(h.ctx.windows().is_empty());
}

#[test]
fn test_can_close_with_another_window_or_nothing_running() {
    let mut h = Harness::new();
    let (first, _) = h.window();
    assert!(h.ctx.can_close());

    let download = h.ctx.add(first, "http://x/a").unwrap().unwrap();
    assert!(!h.ctx.can_close());

    let (second, _) = h.window();
    assert!(h.ctx.can_close());
    assert_eq!(
        h.ctx.try_close(second, CloseRequest::quit()),
        Ok(CloseOutcome::Closed)
    );

    h.engine.get(download.id()).unwrap().finish();
    assert!(h.ctx.can_close());
}

#[test]
fn test_writequit_saves_session() {
    let mut h = Harness::new();
    let (win, seen) = h.window();

    h.ctx.dispatch(win, Command::parse(":wq").unwrap());
    assert_eq!(seen.borrow().saved, 1);
    assert!(seen.borrow().closed);
}
