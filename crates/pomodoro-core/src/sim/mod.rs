//! In-process desktop used by scenario replay and the test suite.
//!
//! Every collaborator records what the dialog did to it so callers can
//! assert on grabs, visibility and dimming without a compositor.

mod grab;
mod idle;
mod overlay;
mod timer;
mod windows;

pub use grab::SimGrabManager;
pub use idle::SimIdleMonitor;
pub use overlay::SimOverlay;
pub use timer::SimTimer;
pub use windows::SimWindows;

use crate::collab::{Collaborators, HandlerId, Scheduler};
use pomodoro_types::{InputEvent, Propagation};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Hands out connection ids unique across every list of one object.
#[derive(Default)]
pub(crate) struct HandlerIds(Cell<u64>);

impl HandlerIds {
    pub(crate) fn next(&self) -> HandlerId {
        let id = self.0.get() + 1;
        self.0.set(id);
        HandlerId(id)
    }
}

/// Connected handlers keyed by id, cloned out before each dispatch.
pub(crate) struct HandlerList<F: ?Sized> {
    entries: RefCell<Vec<(HandlerId, Rc<F>)>>,
}

impl<F: ?Sized> Default for HandlerList<F> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> HandlerList<F> {
    pub(crate) fn insert(&self, id: HandlerId, handler: Rc<F>) {
        self.entries.borrow_mut().push((id, handler));
    }

    pub(crate) fn remove(&self, id: HandlerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    pub(crate) fn snapshot(&self) -> Vec<Rc<F>> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub(crate) fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// A full set of simulated collaborators sharing one scheduler.
pub struct SimDesktop {
    pub scheduler: Rc<dyn Scheduler>,
    pub idle: Rc<SimIdleMonitor>,
    pub grab: Rc<SimGrabManager>,
    pub overlay: Rc<SimOverlay>,
    pub timer: Rc<SimTimer>,
    pub windows: Rc<SimWindows>,
}

impl SimDesktop {
    /// Desktop whose user has been idle for `initial_idle`.
    pub fn new(scheduler: Rc<dyn Scheduler>, initial_idle: Duration) -> Self {
        let idle = SimIdleMonitor::new(Rc::clone(&scheduler));
        idle.set_idle_time(initial_idle);

        Self {
            scheduler,
            idle,
            grab: Rc::new(SimGrabManager::new()),
            overlay: Rc::new(SimOverlay::new()),
            timer: Rc::new(SimTimer::new()),
            windows: Rc::new(SimWindows::new()),
        }
    }

    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            scheduler: Rc::clone(&self.scheduler),
            idle_monitor: Rc::clone(&self.idle) as _,
            grab: Rc::clone(&self.grab) as _,
            overlay: Rc::clone(&self.overlay) as _,
            timer: Rc::clone(&self.timer) as _,
            windows: Rc::clone(&self.windows) as _,
        }
    }

    /// The user touches an input device: resets idle time, then the event
    /// reaches the overlay if it is taking input.
    pub fn user_input(&self, event: &InputEvent) -> Propagation {
        if event.has_device {
            self.idle.report_activity();
        }
        self.overlay.deliver(event)
    }
}
