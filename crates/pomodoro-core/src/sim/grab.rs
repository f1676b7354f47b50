use crate::collab::GrabManager;
use pomodoro_types::{GrabOptions, Timestamp};
use std::cell::{Cell, RefCell};

/// Grab manager that can be told to refuse.
#[derive(Default)]
pub struct SimGrabManager {
    held: Cell<bool>,
    refuse_always: Cell<bool>,
    refusals_left: Cell<u64>,
    attempts: Cell<u64>,
    releases: Cell<u64>,
    announcements: Cell<u64>,
    requests: RefCell<Vec<GrabOptions>>,
}

impl SimGrabManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` acquisitions.
    pub fn refuse_next(&self, count: u64) {
        self.refusals_left.set(count);
    }

    /// Refuse every acquisition until switched off.
    pub fn set_refuse_always(&self, refuse: bool) {
        self.refuse_always.set(refuse);
    }

    /// Another client takes the grab away.
    pub fn revoke(&self) {
        self.held.set(false);
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.get()
    }

    #[must_use]
    pub fn releases(&self) -> u64 {
        self.releases.get()
    }

    #[must_use]
    pub fn announcements(&self) -> u64 {
        self.announcements.get()
    }

    /// Options of every acquisition, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<GrabOptions> {
        self.requests.borrow().clone()
    }
}

impl GrabManager for SimGrabManager {
    fn acquire(&self, options: &GrabOptions) -> bool {
        self.attempts.set(self.attempts.get() + 1);
        self.requests.borrow_mut().push(*options);

        if self.held.get() || self.refuse_always.get() {
            return false;
        }
        let left = self.refusals_left.get();
        if left > 0 {
            self.refusals_left.set(left - 1);
            return false;
        }

        self.held.set(true);
        true
    }

    fn release(&self, _timestamp: Option<Timestamp>) {
        self.held.set(false);
        self.releases.set(self.releases.get() + 1);
    }

    fn announce_modal_opened(&self) {
        self.announcements.set(self.announcements.get() + 1);
    }
}
