//! Taking and releasing the system-modal grab

use super::fixtures::{busy_user, harness_with, idle_user, short_retry_config};
use crate::collab::Overlay;
use crate::config::DialogConfig;
use pomodoro_types::{ActionMode, DialogState};
use std::time::Duration;

#[test]
fn idle_user_gets_grab_right_after_open() {
    let h = idle_user();
    h.open_settled();

    assert!(h.dialog.has_modal());
    assert!(h.desktop.grab.is_held());
    assert!(h.desktop.overlay.is_reactive());
    assert!(h.desktop.overlay.has_key_focus());
    assert_eq!(h.desktop.grab.announcements(), 1);

    let requests = h.desktop.grab.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].action_mode, ActionMode::SystemModal);
    assert_eq!(requests[0].timestamp, Some(0));
}

#[test]
fn busy_user_keeps_grab_away_until_pause() {
    let h = busy_user();
    h.open_settled();
    h.type_for(2000, 200);

    assert!(!h.dialog.has_modal());
    assert_eq!(h.desktop.grab.attempts(), 0);
    assert!(h.dialog.is_acquiring_modal());

    h.advance_ms(599);
    assert!(!h.dialog.has_modal());
    h.advance_ms(1);
    assert!(h.dialog.has_modal());
    assert_eq!(h.desktop.grab.requests()[0].timestamp, Some(2600));
}

#[test]
fn refused_grab_is_retried_with_same_timestamp() {
    let h = idle_user();
    h.desktop.grab.refuse_next(5);
    h.advance_ms(1000);
    h.open_settled();
    assert_eq!(h.desktop.grab.attempts(), 1);

    // 60 attempts per second
    h.advance_ms(79);
    assert_eq!(h.desktop.grab.attempts(), 5);
    assert!(!h.dialog.has_modal());

    h.advance_ms(1);
    assert_eq!(h.desktop.grab.attempts(), 6);
    assert!(h.dialog.has_modal());
    assert!(!h.dialog.is_acquiring_modal());

    let timestamps: Vec<_> = h
        .desktop
        .grab
        .requests()
        .iter()
        .map(|request| request.timestamp)
        .collect();
    assert_eq!(timestamps, vec![Some(1000); 6]);

    h.advance_ms(5000);
    assert_eq!(h.desktop.grab.attempts(), 6);
}

#[test]
fn exhausted_budget_closes_dialog() {
    let h = harness_with(short_retry_config(), Duration::from_secs(60));
    h.desktop.grab.set_refuse_always(true);
    h.open_settled();

    h.advance_ms(899);
    assert_eq!(h.desktop.grab.attempts(), 9);
    assert_eq!(h.dialog.state(), DialogState::Opened);

    h.advance_ms(1);
    assert_eq!(h.desktop.grab.attempts(), 10);
    assert_eq!(h.dialog.state(), DialogState::Closing);

    h.advance_ms(5000);
    assert_eq!(h.dialog.state(), DialogState::Closed);
    assert_eq!(h.desktop.grab.attempts(), 10);
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn single_attempt_budget_gives_up_at_once() {
    let config = DialogConfig {
        push_modal_rate: 1,
        push_modal_time_limit_secs: 1,
        ..DialogConfig::default()
    };
    let h = harness_with(config, Duration::from_secs(60));
    h.desktop.grab.set_refuse_always(true);
    h.open_settled();

    assert_eq!(h.desktop.grab.attempts(), 1);
    assert_eq!(h.dialog.state(), DialogState::Closing);
}

#[test]
fn push_modal_refused_while_closed_or_closing() {
    let h = idle_user();
    assert!(!h.dialog.push_modal(Some(5)));
    assert_eq!(h.desktop.grab.attempts(), 0);

    h.open_settled();
    h.dialog.close(true);
    assert!(!h.dialog.push_modal(Some(5)));
    assert_eq!(h.desktop.grab.attempts(), 1);
}

#[test]
fn push_modal_while_held_does_not_reacquire() {
    let h = idle_user();
    h.open_settled();
    assert!(h.dialog.push_modal(None));
    assert_eq!(h.desktop.grab.attempts(), 1);
}

#[test]
fn explicit_push_modal_cancels_pending_acquisition() {
    let h = busy_user();
    h.dialog.open(false);
    assert!(h.dialog.is_acquiring_modal());

    assert!(h.dialog.push_modal(Some(42)));
    assert!(!h.dialog.is_acquiring_modal());
    assert_eq!(h.desktop.grab.requests()[0].timestamp, Some(42));

    h.advance_ms(5000);
    assert_eq!(h.desktop.grab.attempts(), 1);
}

#[test]
fn pop_modal_releases_grab_and_input() {
    let h = idle_user();
    h.open_settled();
    h.dialog.pop_modal(Some(7));

    assert!(!h.dialog.has_modal());
    assert!(!h.desktop.grab.is_held());
    assert_eq!(h.desktop.grab.releases(), 1);
    assert!(!h.desktop.overlay.is_reactive());
    assert_eq!(h.desktop.overlay.focus_handler_count(), 0);
    assert_eq!(h.dialog.state(), DialogState::Opened);
}

#[test]
fn pop_modal_without_grab_is_noop() {
    let h = idle_user();
    h.dialog.pop_modal(None);
    assert_eq!(h.desktop.grab.releases(), 0);
}

#[test]
fn close_releases_grab() {
    let h = idle_user();
    h.open_settled();
    h.dialog.close(false);

    assert!(!h.desktop.grab.is_held());
    assert_eq!(h.desktop.grab.releases(), 1);
    assert!(!h.desktop.overlay.is_reactive());
}

#[test]
fn losing_key_focus_closes_dialog() {
    let h = idle_user();
    h.open_settled();
    h.desktop.overlay.steal_focus();

    assert_eq!(h.dialog.state(), DialogState::Closing);
    assert!(!h.dialog.has_modal());
}

#[test]
fn focus_loss_after_pop_modal_is_ignored() {
    let h = idle_user();
    h.open_settled();
    h.dialog.pop_modal(None);
    h.desktop.overlay.steal_focus();

    assert_eq!(h.dialog.state(), DialogState::Opened);
}

#[test]
fn close_cancels_pending_acquisition() {
    let h = busy_user();
    h.open_settled();
    assert!(h.dialog.is_acquiring_modal());

    h.dialog.close(false);
    assert!(!h.dialog.is_acquiring_modal());
    assert_eq!(h.desktop.idle.watch_count(), 0);

    h.advance_ms(10_000);
    assert_eq!(h.desktop.grab.attempts(), 0);
}

#[test]
fn close_stops_retries() {
    let h = idle_user();
    h.desktop.grab.set_refuse_always(true);
    h.open_settled();
    h.advance_ms(100);
    let attempts = h.desktop.grab.attempts();

    h.dialog.close(false);
    h.advance_ms(1000);
    assert_eq!(h.desktop.grab.attempts(), attempts);
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn reopen_takes_grab_again() {
    let h = idle_user();
    h.open_settled();
    h.dialog.close(false);
    h.open_settled();

    assert!(h.dialog.has_modal());
    assert_eq!(h.desktop.grab.attempts(), 2);
    assert_eq!(h.desktop.grab.announcements(), 2);
}

#[test]
fn settle_delay_postpones_idle_watch() {
    let config = DialogConfig {
        min_display_time_ms: 2000,
        ..DialogConfig::default()
    };
    let h = harness_with(config, Duration::from_secs(60));
    h.dialog.open(false);

    h.advance_ms(1399);
    assert!(!h.dialog.has_modal());
    assert_eq!(h.desktop.grab.attempts(), 0);

    h.advance_ms(1);
    assert!(h.dialog.has_modal());
    assert_eq!(h.desktop.grab.requests()[0].timestamp, Some(1400));
}
