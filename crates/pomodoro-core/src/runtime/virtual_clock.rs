use crate::collab::{Callback, RepeatingCallback, Scheduler, TaskId};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

/// Shortest period a repeating task can have; keeps `advance` finite.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

enum Job {
    Once(Callback),
    Repeating {
        interval: Duration,
        callback: RepeatingCallback,
    },
}

/// Deterministic scheduler driven by [`advance`](Self::advance).
///
/// Tasks run in deadline order; tasks sharing a deadline run in the order
/// they were created. Tasks scheduled by a callback run in the same
/// `advance` call when their deadline falls inside the window.
pub struct VirtualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, TaskId), Job>>,
    running: Cell<Option<TaskId>>,
    running_cancelled: Cell<bool>,
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            next_id: Cell::new(1),
            queue: RefCell::new(BTreeMap::new()),
            running: Cell::new(None),
            running_cancelled: Cell::new(false),
        }
    }

    /// Move the clock forward by `by`, running every task that falls due.
    pub fn advance(&self, by: Duration) {
        self.advance_to(self.now.get() + by);
    }

    /// Move the clock to `target`. Targets in the past only run due tasks.
    pub fn advance_to(&self, target: Duration) {
        let target = target.max(self.now.get());

        while let Some(((deadline, id), job)) = self.pop_due(target) {
            self.now.set(deadline.max(self.now.get()));

            match job {
                Job::Once(callback) => callback(),
                Job::Repeating {
                    interval,
                    mut callback,
                } => {
                    self.running.set(Some(id));
                    self.running_cancelled.set(false);
                    let flow = callback();
                    self.running.set(None);

                    if flow.is_continue() && !self.running_cancelled.get() {
                        self.queue.borrow_mut().insert(
                            (deadline + interval, id),
                            Job::Repeating { interval, callback },
                        );
                    }
                }
            }
        }

        self.now.set(target);
    }

    /// Run tasks that are already due without moving the clock.
    pub fn run_pending(&self) {
        self.advance(Duration::ZERO);
    }

    /// Number of outstanding tasks
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.borrow().keys().next().map(|(deadline, _)| *deadline)
    }

    fn pop_due(&self, target: Duration) -> Option<((Duration, TaskId), Job)> {
        let mut queue = self.queue.borrow_mut();
        let key = *queue.keys().next()?;
        if key.0 > target {
            return None;
        }
        queue.remove(&key).map(|job| (key, job))
    }

    fn allocate_id(&self) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        id
    }
}

impl Scheduler for VirtualScheduler {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn schedule_once(&self, delay: Duration, callback: Callback) -> TaskId {
        let id = self.allocate_id();
        self.queue
            .borrow_mut()
            .insert((self.now.get() + delay, id), Job::Once(callback));
        id
    }

    fn schedule_repeating(&self, interval: Duration, callback: RepeatingCallback) -> TaskId {
        let interval = interval.max(MIN_INTERVAL);
        let id = self.allocate_id();
        self.queue.borrow_mut().insert(
            (self.now.get() + interval, id),
            Job::Repeating { interval, callback },
        );
        id
    }

    fn cancel(&self, id: TaskId) {
        if self.running.get() == Some(id) {
            self.running_cancelled.set(true);
        }
        self.queue.borrow_mut().retain(|(_, task), _| *task != id);
    }
}
