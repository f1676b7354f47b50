use crate::collab::{HandlerId, TimerSource};
use crate::signal::Signal;
use std::cell::Cell;

/// Pomodoro timer whose phase is set by hand.
#[derive(Default)]
pub struct SimTimer {
    is_break: Cell<bool>,
    remaining: Cell<f64>,
    updates: Signal<()>,
}

impl SimTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch phase and notify listeners.
    pub fn set_phase(&self, is_break: bool, remaining_secs: f64) {
        self.is_break.set(is_break);
        self.remaining.set(remaining_secs);
        self.updates.emit(&());
    }

    /// Count down within the current phase.
    pub fn set_remaining(&self, remaining_secs: f64) {
        self.remaining.set(remaining_secs);
        self.updates.emit(&());
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.updates.len()
    }
}

impl TimerSource for SimTimer {
    fn is_break(&self) -> bool {
        self.is_break.get()
    }

    fn remaining(&self) -> f64 {
        self.remaining.get()
    }

    fn connect_update(&self, handler: Box<dyn Fn()>) -> HandlerId {
        self.updates.connect(move |_| handler())
    }

    fn disconnect(&self, id: HandlerId) {
        self.updates.disconnect(id);
    }
}
