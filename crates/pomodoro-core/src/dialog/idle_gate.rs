//! Opening for an idle user and closing for a returning one.

use super::DialogInner;
use super::guard::GuardContext;
use crate::collab::{TaskId, WatchId};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Default)]
pub(super) struct IdleGate {
    open_when_idle: Cell<Option<WatchId>>,
    close_delay: Cell<Option<TaskId>>,
    close_when_active: Cell<Option<WatchId>>,
}

impl IdleGate {
    pub(super) fn is_waiting_to_open(&self) -> bool {
        self.open_when_idle.get().is_some()
    }
}

impl DialogInner {
    /// Reopen once the user has been idle long enough, if the guard agrees.
    pub(super) fn open_when_idle(self: &Rc<Self>) {
        if self.destroyed.get() || self.state.get().is_open_or_opening() {
            return;
        }
        if self.gate.open_when_idle.get().is_some() {
            return;
        }

        let id = self.collab.idle_monitor.add_idle_watch(
            self.config.idle_time_to_open(),
            self.callback(Self::on_idle_for_open),
        );
        self.gate.open_when_idle.set(Some(id));
        debug!("waiting for idle user to reopen");
    }

    fn on_idle_for_open(self: &Rc<Self>) {
        self.gate.open_when_idle.set(None);

        let context = GuardContext {
            timer: self.collab.timer.snapshot(),
            focused_window: self.collab.windows.focused_window(),
            min_remaining_secs: self.config.open_when_idle_min_remaining_secs,
        };
        match self.guard.skip_reason(&context) {
            Some(reason) => debug!(%reason, "not reopening"),
            None => self.open(true),
        }
    }

    /// Wait out the minimum display time before input may dismiss.
    pub(super) fn schedule_close_when_active(self: &Rc<Self>) {
        if self.gate.close_delay.get().is_some() {
            return;
        }
        let id = self.collab.scheduler.schedule_once(
            self.config.min_display_time(),
            self.callback(Self::on_min_display_elapsed),
        );
        self.gate.close_delay.set(Some(id));
    }

    fn on_min_display_elapsed(self: &Rc<Self>) {
        self.gate.close_delay.set(None);

        if self.collab.idle_monitor.idle_time() < self.config.idle_time_to_close() {
            self.arm_input_filter();
            return;
        }
        if self.gate.close_when_active.get().is_some() {
            return;
        }

        let id = self
            .collab
            .idle_monitor
            .add_user_active_watch(self.callback(Self::on_user_active));
        self.gate.close_when_active.set(Some(id));
    }

    fn on_user_active(self: &Rc<Self>) {
        self.gate.close_when_active.set(None);
        self.arm_input_filter();
    }

    pub(super) fn disconnect_idle_gate(&self) {
        let idle_monitor = &self.collab.idle_monitor;
        if let Some(id) = self.gate.open_when_idle.take() {
            idle_monitor.remove_watch(id);
        }
        if let Some(id) = self.gate.close_delay.take() {
            self.collab.scheduler.cancel(id);
        }
        if let Some(id) = self.gate.close_when_active.take() {
            idle_monitor.remove_watch(id);
        }
    }
}
