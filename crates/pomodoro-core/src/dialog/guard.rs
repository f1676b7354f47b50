//! Checks run before an idle user gets the dialog back.

use pomodoro_types::{TimerSnapshot, WindowInfo};
use std::fmt;

/// What the guard gets to look at when the idle watch fires
#[derive(Debug, Clone, Copy)]
pub struct GuardContext {
    pub timer: TimerSnapshot,
    pub focused_window: Option<WindowInfo>,
    pub min_remaining_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The user is watching something fullscreen
    FullscreenPlayer,
    NotOnBreak,
    /// Too little of the break left to be worth showing
    BreakEndingSoon,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullscreenPlayer => "fullscreen player focused",
            Self::NotOnBreak => "timer is not on a break",
            Self::BreakEndingSoon => "break is about to end",
        })
    }
}

/// Decides whether an idle-triggered open may go ahead.
pub trait AutoOpenGuard {
    /// `None` lets the dialog open.
    fn skip_reason(&self, context: &GuardContext) -> Option<SkipReason>;
}

/// Reopens only during a break that still has time left, and never over a
/// fullscreen video player.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreakGuard;

impl AutoOpenGuard for BreakGuard {
    fn skip_reason(&self, context: &GuardContext) -> Option<SkipReason> {
        if context
            .focused_window
            .is_some_and(|window| window.is_fullscreen_player())
        {
            return Some(SkipReason::FullscreenPlayer);
        }
        if !context.timer.is_break {
            return Some(SkipReason::NotOnBreak);
        }
        if context.timer.remaining_secs < context.min_remaining_secs {
            return Some(SkipReason::BreakEndingSoon);
        }
        None
    }
}

impl<F> AutoOpenGuard for F
where
    F: Fn(&GuardContext) -> Option<SkipReason>,
{
    fn skip_reason(&self, context: &GuardContext) -> Option<SkipReason> {
        self(context)
    }
}
