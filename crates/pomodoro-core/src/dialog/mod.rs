//! The break dialog.
//!
//! A full-screen lightbox that dims the desktop while the pomodoro timer is
//! on a break. It walks through `Closed -> Opening -> Opened -> Closing ->
//! Closed`, takes the system-modal grab once the user stops typing, and
//! closes again when the user comes back with deliberate input.
//!
//! The dialog lives on the loop thread. Every task, watch and signal
//! connection it makes holds a weak reference and is cancelled on teardown.

mod countdown;
mod guard;
mod idle_gate;
mod input_filter;
mod modal;

pub use guard::{AutoOpenGuard, BreakGuard, GuardContext, SkipReason};
pub use input_filter::{InputFilter, Verdict};

use crate::collab::{Callback, Collaborators, HandlerId, TaskId};
use crate::config::DialogConfig;
use crate::signal::Signal;
use idle_gate::IdleGate;
use modal::ModalAcquisition;
use pomodoro_types::{DialogEvent, DialogState, Timestamp};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

/// Handle to a break dialog. Dropping it tears the dialog down.
pub struct BreakDialog {
    inner: Rc<DialogInner>,
}

struct DialogInner {
    collab: Collaborators,
    config: DialogConfig,
    guard: Box<dyn AutoOpenGuard>,
    events: Signal<DialogEvent>,
    state: Cell<DialogState>,
    destroyed: Cell<bool>,
    description: RefCell<String>,
    /// Fade completion of the running open or close
    transition: Cell<Option<TaskId>>,
    modal: ModalAcquisition,
    gate: IdleGate,
    filter: InputFilter,
    event_handler: Cell<Option<HandlerId>>,
    countdown: Cell<Option<HandlerId>>,
}

impl BreakDialog {
    /// Dialog that reopens for idle users under [`BreakGuard`].
    #[must_use]
    pub fn new(collab: Collaborators, config: DialogConfig) -> Self {
        Self::with_guard(collab, config, BreakGuard)
    }

    #[must_use]
    pub fn with_guard(
        collab: Collaborators,
        config: DialogConfig,
        guard: impl AutoOpenGuard + 'static,
    ) -> Self {
        collab.overlay.set_description(&config.description);
        collab.overlay.set_reactive(false);

        let inner = Rc::new(DialogInner {
            filter: InputFilter::from_config(&config),
            description: RefCell::new(config.description.clone()),
            collab,
            config,
            guard: Box::new(guard),
            events: Signal::new(),
            state: Cell::new(DialogState::Closed),
            destroyed: Cell::new(false),
            transition: Cell::new(None),
            modal: ModalAcquisition::default(),
            gate: IdleGate::default(),
            event_handler: Cell::new(None),
            countdown: Cell::new(None),
        });
        Self { inner }
    }

    #[must_use]
    pub fn state(&self) -> DialogState {
        self.inner.state.get()
    }

    /// Whether the dialog holds the system-modal grab
    #[must_use]
    pub fn has_modal(&self) -> bool {
        self.inner.modal.has_modal()
    }

    /// Whether a grab is still being waited for or retried
    #[must_use]
    pub fn is_acquiring_modal(&self) -> bool {
        self.inner.modal.is_pending()
    }

    /// Whether input currently reaches the dismissal filter
    #[must_use]
    pub fn is_input_filter_armed(&self) -> bool {
        self.inner.event_handler.get().is_some()
    }

    /// Whether an idle watch is waiting to reopen the dialog
    #[must_use]
    pub fn is_waiting_to_open(&self) -> bool {
        self.inner.gate.is_waiting_to_open()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    #[must_use]
    pub fn description(&self) -> String {
        self.inner.description.borrow().clone()
    }

    #[must_use]
    pub fn config(&self) -> &DialogConfig {
        &self.inner.config
    }

    /// Show the dialog. No-op while opened or opening.
    pub fn open(&self, animate: bool) {
        self.inner.open(animate);
    }

    /// Hide the dialog. No-op while closed or closing.
    pub fn close(&self, animate: bool) {
        self.inner.close(animate);
    }

    /// Take the system-modal grab right away. Returns true if held.
    pub fn push_modal(&self, timestamp: Option<Timestamp>) -> bool {
        self.inner.push_modal(timestamp)
    }

    pub fn pop_modal(&self, timestamp: Option<Timestamp>) {
        self.inner.pop_modal(timestamp);
    }

    /// Reopen the dialog once the user has been idle for a while.
    pub fn open_when_idle(&self) {
        self.inner.open_when_idle();
    }

    pub fn set_description(&self, text: impl Into<String>) {
        self.inner.set_description(text.into());
    }

    /// Subscribe to lifecycle events.
    pub fn connect<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&DialogEvent) + 'static,
    {
        self.inner.events.connect(handler)
    }

    pub fn disconnect(&self, id: HandlerId) -> bool {
        self.inner.events.disconnect(id)
    }

    /// Release the grab, cancel everything pending and destroy the overlay.
    /// Later calls to any operation are no-ops.
    pub fn destroy(&self) {
        self.inner.teardown();
    }
}

impl DialogInner {
    fn open(self: &Rc<Self>, animate: bool) {
        if self.destroyed.get() || self.state.get().is_open_or_opening() {
            return;
        }
        info!(animate, "opening break dialog");

        self.schedule_push_modal();

        let overlay = &self.collab.overlay;
        overlay.raise_to_top();
        self.remove_all_transitions();
        overlay.show();
        self.connect_countdown();

        self.set_state(DialogState::Opening);
        self.events.emit(&DialogEvent::Opening);
        if self.state.get() != DialogState::Opening {
            return;
        }

        if animate {
            let fade = self.config.fade_in_time();
            overlay.light_on(Some(fade));
            self.start_transition(fade, Self::on_open_complete);
        } else {
            overlay.light_on(None);
            self.on_open_complete();
        }

        if self.state.get().is_open_or_opening() {
            self.schedule_close_when_active();
        }
    }

    fn on_open_complete(self: &Rc<Self>) {
        self.set_state(DialogState::Opened);
        self.events.emit(&DialogEvent::Opened);
    }

    fn close(self: &Rc<Self>, animate: bool) {
        if self.destroyed.get() || self.state.get().is_closed_or_closing() {
            return;
        }
        info!(animate, "closing break dialog");

        self.pop_modal(None);
        self.set_state(DialogState::Closing);
        self.disconnect_signals();
        self.events.emit(&DialogEvent::Closing);
        if self.state.get() != DialogState::Closing {
            return;
        }

        self.remove_all_transitions();
        if animate {
            let fade = self.config.fade_out_time();
            self.collab.overlay.light_off(Some(fade));
            self.start_transition(fade, Self::on_close_complete);
        } else {
            self.collab.overlay.light_off(None);
            self.on_close_complete();
        }
    }

    fn on_close_complete(self: &Rc<Self>) {
        self.collab.overlay.hide();
        self.set_state(DialogState::Closed);
        self.events.emit(&DialogEvent::Closed);
    }

    fn set_state(&self, state: DialogState) {
        if self.state.replace(state) == state {
            return;
        }
        debug!(%state, "dialog state changed");
        self.events.emit(&DialogEvent::StateChanged { state });
    }

    fn set_description(&self, text: String) {
        if self.destroyed.get() {
            return;
        }
        self.collab.overlay.set_description(&text);
        *self.description.borrow_mut() = text;
    }

    fn start_transition(self: &Rc<Self>, duration: Duration, complete: fn(&Rc<Self>)) {
        let id = self.collab.scheduler.schedule_once(
            duration,
            self.callback(move |inner| {
                inner.transition.set(None);
                complete(inner);
            }),
        );
        self.transition.set(Some(id));
    }

    fn remove_all_transitions(&self) {
        if let Some(id) = self.transition.take() {
            self.collab.scheduler.cancel(id);
        }
        self.collab.overlay.remove_all_transitions();
    }

    /// Drop every connection that only matters while the dialog is up.
    fn disconnect_signals(&self) {
        self.disconnect_idle_gate();
        self.disarm_input_filter();
        self.disconnect_countdown();
    }

    fn teardown(&self) {
        if self.destroyed.replace(true) {
            return;
        }

        self.pop_modal(None);
        self.disconnect_signals();
        if let Some(id) = self.transition.take() {
            self.collab.scheduler.cancel(id);
        }
        self.events.disconnect_all();
        self.collab.overlay.destroy();
        debug!("break dialog destroyed");
    }

    /// One-shot callback that runs `f` if the dialog is still alive.
    fn callback(self: &Rc<Self>, f: impl FnOnce(&Rc<Self>) + 'static) -> Callback {
        let weak = Rc::downgrade(self);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                f(&inner);
            }
        })
    }

    /// Signal handler that runs `f` if the dialog is still alive.
    fn handler(self: &Rc<Self>, f: fn(&Rc<Self>)) -> Box<dyn Fn()> {
        let weak = Rc::downgrade(self);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                f(&inner);
            }
        })
    }
}

impl Drop for DialogInner {
    fn drop(&mut self) {
        self.teardown();
    }
}
