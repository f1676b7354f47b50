use super::{HandlerIds, HandlerList};
use crate::collab::{EventHandler, HandlerId, Overlay};
use pomodoro_types::{InputEvent, Propagation};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Overlay that records what was done to it.
///
/// Events are dispatched only while the overlay is reactive, like a
/// lightbox that lets input through to the windows below otherwise.
#[derive(Default)]
pub struct SimOverlay {
    visible: Cell<bool>,
    lit: Cell<bool>,
    reactive: Cell<bool>,
    key_focus: Cell<bool>,
    destroyed: Cell<bool>,
    raised: Cell<u32>,
    last_fade: Cell<Option<Duration>>,
    description: RefCell<String>,
    countdown: Cell<Option<(u64, u64)>>,
    ids: HandlerIds,
    event_handlers: HandlerList<dyn Fn(&InputEvent) -> Propagation>,
    focus_handlers: HandlerList<dyn Fn()>,
}

impl SimOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an input event to the connected handlers until one stops it.
    pub fn deliver(&self, event: &InputEvent) -> Propagation {
        if !self.reactive.get() || self.destroyed.get() {
            return Propagation::Propagate;
        }

        for handler in self.event_handlers.snapshot() {
            if handler(event) == Propagation::Stop {
                return Propagation::Stop;
            }
        }
        Propagation::Propagate
    }

    /// Another surface takes key focus.
    pub fn steal_focus(&self) {
        self.key_focus.set(false);
        for handler in self.focus_handlers.snapshot() {
            handler();
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    /// Whether the lightbox is dimming the screen
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.lit.get()
    }

    #[must_use]
    pub fn is_reactive(&self) -> bool {
        self.reactive.get()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    #[must_use]
    pub fn times_raised(&self) -> u32 {
        self.raised.get()
    }

    /// Fade of the last `light_on` or `light_off`
    #[must_use]
    pub fn last_fade(&self) -> Option<Duration> {
        self.last_fade.get()
    }

    #[must_use]
    pub fn description(&self) -> String {
        self.description.borrow().clone()
    }

    #[must_use]
    pub fn countdown(&self) -> Option<(u64, u64)> {
        self.countdown.get()
    }

    #[must_use]
    pub fn event_handler_count(&self) -> usize {
        self.event_handlers.len()
    }

    #[must_use]
    pub fn focus_handler_count(&self) -> usize {
        self.focus_handlers.len()
    }
}

impl Overlay for SimOverlay {
    fn raise_to_top(&self) {
        self.raised.set(self.raised.get() + 1);
    }

    fn remove_all_transitions(&self) {}

    fn show(&self) {
        self.visible.set(true);
    }

    fn hide(&self) {
        self.visible.set(false);
    }

    fn light_on(&self, fade: Option<Duration>) {
        self.lit.set(true);
        self.last_fade.set(fade);
    }

    fn light_off(&self, fade: Option<Duration>) {
        self.lit.set(false);
        self.last_fade.set(fade);
    }

    fn set_reactive(&self, reactive: bool) {
        self.reactive.set(reactive);
    }

    fn grab_key_focus(&self) {
        self.key_focus.set(true);
    }

    fn has_key_focus(&self) -> bool {
        self.key_focus.get()
    }

    fn connect_key_focus_out(&self, handler: Box<dyn Fn()>) -> HandlerId {
        let id = self.ids.next();
        self.focus_handlers.insert(id, Rc::from(handler));
        id
    }

    fn connect_event(&self, handler: EventHandler) -> HandlerId {
        let id = self.ids.next();
        self.event_handlers.insert(id, Rc::from(handler));
        id
    }

    fn disconnect(&self, id: HandlerId) {
        if !self.event_handlers.remove(id) {
            self.focus_handlers.remove(id);
        }
    }

    fn set_description(&self, text: &str) {
        text.clone_into(&mut self.description.borrow_mut());
    }

    fn set_countdown(&self, minutes: u64, seconds: u64) {
        self.countdown.set(Some((minutes, seconds)));
    }

    fn destroy(&self) {
        self.destroyed.set(true);
        self.visible.set(false);
        self.reactive.set(false);
        self.event_handlers.clear();
        self.focus_handlers.clear();
    }
}
