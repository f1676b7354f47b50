//! Typed signal emitter.
//!
//! Handlers are cloned out before dispatch, so a handler may connect,
//! disconnect or re-enter the emitting object while a signal is in flight.

use crate::collab::HandlerId;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Handler<E> = Rc<dyn Fn(&E)>;

pub struct Signal<E> {
    handlers: RefCell<Vec<(HandlerId, Handler<E>)>>,
    next_id: Cell<u64>,
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }
}

impl<E> Signal<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&E) + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn disconnect_all(&self) {
        self.handlers.borrow_mut().clear();
    }

    pub fn emit(&self, event: &E) {
        let handlers: Vec<Handler<E>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_every_handler() {
        let signal = Signal::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        signal.connect(move |value| first.borrow_mut().push(("a", *value)));
        let second = Rc::clone(&seen);
        signal.connect(move |value| second.borrow_mut().push(("b", *value)));

        signal.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let signal = Signal::<u32>::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let id = signal.connect(move |_| counter.set(counter.get() + 1));

        signal.emit(&1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(&2);

        assert_eq!(count.get(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn handler_can_disconnect_itself_during_emit() {
        let signal = Rc::new(Signal::<u32>::new());
        let count = Rc::new(Cell::new(0));
        let slot: Rc<Cell<Option<HandlerId>>> = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&signal);
        let counter = Rc::clone(&count);
        let own_id = Rc::clone(&slot);
        let id = signal.connect(move |_| {
            counter.set(counter.get() + 1);
            if let (Some(signal), Some(id)) = (weak.upgrade(), own_id.get()) {
                signal.disconnect(id);
            }
        });
        slot.set(Some(id));

        signal.emit(&1);
        signal.emit(&2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handler_connected_during_emit_waits_for_next_emit() {
        let signal = Rc::new(Signal::<u32>::new());
        let late_calls = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&signal);
        let late = Rc::clone(&late_calls);
        signal.connect(move |_| {
            if let Some(signal) = weak.upgrade() {
                let late = Rc::clone(&late);
                signal.connect(move |_| late.set(late.get() + 1));
            }
        });

        signal.emit(&1);
        assert_eq!(late_calls.get(), 0);
        assert_eq!(signal.len(), 2);
    }
}
