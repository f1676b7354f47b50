//! Taking the system-modal grab once the user pauses.
//!
//! After `open` a one-shot delay task waits for the dialog to settle, then an
//! idle watch waits for a short pause in user input. When the pause arrives
//! the grab is requested with a timestamp taken at that moment. A refused
//! grab is retried at a fixed rate with the same timestamp until it succeeds
//! or the attempt budget runs out, at which point the dialog gives up and
//! closes.

use super::DialogInner;
use crate::collab::{HandlerId, TaskId, WatchId, timestamp_of};
use pomodoro_types::{GrabOptions, Timestamp};
use std::cell::Cell;
use std::ops::ControlFlow;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Handles owned by the acquisition sequence. Each is set while its task or
/// watch is outstanding and cleared when it fires or is cancelled.
#[derive(Debug, Default)]
pub(super) struct ModalAcquisition {
    delay_task: Cell<Option<TaskId>>,
    idle_watch: Cell<Option<WatchId>>,
    retry_task: Cell<Option<TaskId>>,
    attempts: Cell<u64>,
    timestamp: Cell<Option<Timestamp>>,
    has_modal: Cell<bool>,
    key_focus_out: Cell<Option<HandlerId>>,
}

impl ModalAcquisition {
    pub(super) fn has_modal(&self) -> bool {
        self.has_modal.get()
    }

    pub(super) fn is_pending(&self) -> bool {
        self.delay_task.get().is_some()
            || self.idle_watch.get().is_some()
            || self.retry_task.get().is_some()
    }
}

impl DialogInner {
    /// Take the grab now. True if the dialog holds it afterwards.
    pub(super) fn push_modal(self: &Rc<Self>, timestamp: Option<Timestamp>) -> bool {
        if self.modal.has_modal.get() {
            return true;
        }
        if self.destroyed.get() || self.state.get().is_closed_or_closing() {
            return false;
        }

        if !self
            .collab
            .grab
            .acquire(&GrabOptions::system_modal(timestamp))
        {
            debug!(?timestamp, "grab refused");
            return false;
        }

        self.cancel_push_modal();
        self.modal.has_modal.set(true);

        let overlay = &self.collab.overlay;
        overlay.set_reactive(true);
        overlay.grab_key_focus();
        if self.modal.key_focus_out.get().is_none() {
            let id = overlay.connect_key_focus_out(self.handler(Self::on_key_focus_out));
            self.modal.key_focus_out.set(Some(id));
        }
        self.collab.grab.announce_modal_opened();

        info!(?timestamp, "system modal grab taken");
        true
    }

    /// Drop the grab if held and stop any acquisition in progress.
    pub(super) fn pop_modal(&self, timestamp: Option<Timestamp>) {
        self.cancel_push_modal();
        if let Some(id) = self.modal.key_focus_out.take() {
            self.collab.overlay.disconnect(id);
        }

        if !self.modal.has_modal.replace(false) {
            return;
        }
        self.collab.grab.release(timestamp);
        self.collab.overlay.set_reactive(false);
        info!("system modal grab released");
    }

    /// Start the acquisition sequence for a fresh open.
    pub(super) fn schedule_push_modal(self: &Rc<Self>) {
        self.cancel_push_modal();
        let id = self.collab.scheduler.schedule_once(
            self.config.push_modal_delay(),
            self.callback(Self::on_push_modal_delay),
        );
        self.modal.delay_task.set(Some(id));
    }

    fn cancel_push_modal(&self) {
        let scheduler = &self.collab.scheduler;
        if let Some(id) = self.modal.delay_task.take() {
            scheduler.cancel(id);
        }
        if let Some(id) = self.modal.retry_task.take() {
            scheduler.cancel(id);
        }
        if let Some(id) = self.modal.idle_watch.take() {
            self.collab.idle_monitor.remove_watch(id);
        }
    }

    fn on_push_modal_delay(self: &Rc<Self>) {
        self.modal.delay_task.set(None);
        if self.modal.idle_watch.get().is_some() {
            return;
        }

        let id = self.collab.idle_monitor.add_idle_watch(
            self.config.idle_time_to_push_modal(),
            self.callback(Self::on_idle_for_push_modal),
        );
        self.modal.idle_watch.set(Some(id));
    }

    fn on_idle_for_push_modal(self: &Rc<Self>) {
        self.modal.idle_watch.set(None);

        let timestamp = timestamp_of(self.collab.scheduler.now());
        self.modal.timestamp.set(Some(timestamp));
        self.modal.attempts.set(1);

        if self.push_modal(Some(timestamp)) || self.give_up_if_exhausted() {
            return;
        }

        let weak = Rc::downgrade(self);
        let id = self.collab.scheduler.schedule_repeating(
            self.config.push_modal_interval(),
            Box::new(move || {
                weak.upgrade()
                    .map_or(ControlFlow::Break(()), |inner| inner.retry_push_modal())
            }),
        );
        self.modal.retry_task.set(Some(id));
    }

    fn retry_push_modal(self: &Rc<Self>) -> ControlFlow<()> {
        self.modal.attempts.set(self.modal.attempts.get() + 1);

        if self.push_modal(self.modal.timestamp.get()) {
            return ControlFlow::Break(());
        }
        if self.give_up_if_exhausted() {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    /// Close the dialog once the attempt budget is spent.
    fn give_up_if_exhausted(self: &Rc<Self>) -> bool {
        let attempts = self.modal.attempts.get();
        if attempts < self.config.max_push_modal_attempts() {
            return false;
        }

        warn!(attempts, "could not take the grab, closing dialog");
        self.close(true);
        true
    }

    fn on_key_focus_out(self: &Rc<Self>) {
        if self.collab.overlay.has_key_focus() {
            return;
        }
        debug!("key focus left the dialog");
        self.close(true);
    }
}
