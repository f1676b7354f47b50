//! Host services the dialog is driven by.
//!
//! The dialog never reaches for process-wide singletons. Everything it
//! consumes from the desktop shell is passed in as one of these traits.
//! All callbacks run on the same thread as the dialog.

use pomodoro_types::{GrabOptions, InputEvent, Propagation, Timestamp, TimerSnapshot, WindowInfo};
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::Duration;

/// Handle of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Handle of an idle monitor watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub u64);

/// Handle of a signal connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

pub type Callback = Box<dyn FnOnce()>;
pub type RepeatingCallback = Box<dyn FnMut() -> ControlFlow<()>>;
pub type EventHandler = Box<dyn Fn(&InputEvent) -> Propagation>;

/// Cooperative timer facility of the event loop.
pub trait Scheduler {
    /// Monotonic time of the loop
    fn now(&self) -> Duration;

    /// Run `callback` once after `delay`. A zero delay still defers to the
    /// next loop iteration.
    fn schedule_once(&self, delay: Duration, callback: Callback) -> TaskId;

    /// Run `callback` every `interval` until it breaks or is cancelled.
    fn schedule_repeating(&self, interval: Duration, callback: RepeatingCallback) -> TaskId;

    /// Cancel a task. Unknown and already finished tasks are ignored; a
    /// repeating task cancelled from its own callback does not run again.
    fn cancel(&self, id: TaskId);
}

/// Source of user idle time.
pub trait IdleMonitor {
    /// Time since the last user input
    fn idle_time(&self) -> Duration;

    /// Fire `callback` once idle time reaches `threshold`. Fires on the next
    /// loop iteration if the user is already idle that long.
    fn add_idle_watch(&self, threshold: Duration, callback: Callback) -> WatchId;

    /// Fire `callback` once on the next user input.
    fn add_user_active_watch(&self, callback: Callback) -> WatchId;

    fn remove_watch(&self, id: WatchId);
}

/// Exclusive input grab of the shell.
pub trait GrabManager {
    /// Try to take the grab for the dialog surface. The host may refuse.
    fn acquire(&self, options: &GrabOptions) -> bool;

    fn release(&self, timestamp: Option<Timestamp>);

    /// Tell the rest of the shell that a system modal is up.
    fn announce_modal_opened(&self);
}

/// Visual surface of the dialog: dimming lightbox plus content.
pub trait Overlay {
    /// Stack above every sibling on the stage
    fn raise_to_top(&self);

    /// Stop any running fade
    fn remove_all_transitions(&self);

    fn show(&self);

    fn hide(&self);

    /// Dim the screen; `None` means immediately.
    fn light_on(&self, fade: Option<Duration>);

    fn light_off(&self, fade: Option<Duration>);

    /// Reactive surfaces receive input events.
    fn set_reactive(&self, reactive: bool);

    fn grab_key_focus(&self);

    /// Whether key focus is on the overlay or one of its children
    fn has_key_focus(&self) -> bool;

    fn connect_key_focus_out(&self, handler: Box<dyn Fn()>) -> HandlerId;

    fn connect_event(&self, handler: EventHandler) -> HandlerId;

    fn disconnect(&self, id: HandlerId);

    fn set_description(&self, text: &str);

    fn set_countdown(&self, minutes: u64, seconds: u64);

    fn destroy(&self);
}

/// The pomodoro timer. Not owned by the dialog.
pub trait TimerSource {
    fn is_break(&self) -> bool;

    /// Seconds left in the current phase
    fn remaining(&self) -> f64;

    fn connect_update(&self, handler: Box<dyn Fn()>) -> HandlerId;

    fn disconnect(&self, id: HandlerId);

    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            is_break: self.is_break(),
            remaining_secs: self.remaining(),
        }
    }
}

/// Window tracking of the shell.
pub trait WindowInspector {
    fn focused_window(&self) -> Option<WindowInfo>;
}

/// Everything a dialog is constructed with
#[derive(Clone)]
pub struct Collaborators {
    pub scheduler: Rc<dyn Scheduler>,
    pub idle_monitor: Rc<dyn IdleMonitor>,
    pub grab: Rc<dyn GrabManager>,
    pub overlay: Rc<dyn Overlay>,
    pub timer: Rc<dyn TimerSource>,
    pub windows: Rc<dyn WindowInspector>,
}

/// Loop time as a host timestamp.
// Host timestamps are 32-bit and wrap, like X server time
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn timestamp_of(now: Duration) -> Timestamp {
    now.as_millis() as Timestamp
}
