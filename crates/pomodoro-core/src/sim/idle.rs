use crate::collab::{Callback, IdleMonitor, Scheduler, TaskId, WatchId};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::trace;

enum WatchKind {
    Idle {
        threshold: Duration,
        task: Option<TaskId>,
    },
    UserActive,
}

struct Watch {
    kind: WatchKind,
    callback: Callback,
}

/// Idle monitor over a scheduler clock.
///
/// Idle time is the time since the last [`report_activity`](Self::report_activity).
/// Idle watches are scheduler tasks due when the threshold is reached and
/// are rescheduled whenever the user becomes active again.
pub struct SimIdleMonitor {
    me: Weak<Self>,
    scheduler: Rc<dyn Scheduler>,
    idle_at_mark: Cell<Duration>,
    mark: Cell<Duration>,
    next_id: Cell<u64>,
    watches: RefCell<BTreeMap<WatchId, Watch>>,
}

impl SimIdleMonitor {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Rc<Self> {
        let mark = scheduler.now();
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            scheduler,
            idle_at_mark: Cell::new(Duration::ZERO),
            mark: Cell::new(mark),
            next_id: Cell::new(1),
            watches: RefCell::new(BTreeMap::new()),
        })
    }

    /// User input: idle time drops to zero and user-active watches fire.
    pub fn report_activity(&self) {
        self.set_idle_time(Duration::ZERO);

        let active: Vec<WatchId> = self
            .watches
            .borrow()
            .iter()
            .filter(|(_, watch)| matches!(watch.kind, WatchKind::UserActive))
            .map(|(id, _)| *id)
            .collect();

        for id in active {
            self.fire(id);
        }
    }

    /// Pretend the user has been idle for `idle` as of now.
    pub fn set_idle_time(&self, idle: Duration) {
        self.idle_at_mark.set(idle);
        self.mark.set(self.scheduler.now());
        self.reschedule_idle_watches();
    }

    /// Number of registered watches
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.watches.borrow().len()
    }

    fn reschedule_idle_watches(&self) {
        let ids: Vec<WatchId> = self.watches.borrow().keys().copied().collect();

        for id in ids {
            let stale = {
                let watches = self.watches.borrow();
                match watches.get(&id).map(|watch| &watch.kind) {
                    Some(WatchKind::Idle { threshold, task }) => Some((*threshold, *task)),
                    _ => None,
                }
            };
            let Some((threshold, old_task)) = stale else {
                continue;
            };

            if let Some(task) = old_task {
                self.scheduler.cancel(task);
            }
            let task = self.schedule_fire(id, threshold);
            if let Some(Watch {
                kind: WatchKind::Idle { task: slot, .. },
                ..
            }) = self.watches.borrow_mut().get_mut(&id)
            {
                *slot = Some(task);
            }
        }
    }

    fn schedule_fire(&self, id: WatchId, threshold: Duration) -> TaskId {
        let remaining = threshold.saturating_sub(self.idle_time());
        let me = self.me.clone();
        self.scheduler.schedule_once(
            remaining,
            Box::new(move || {
                if let Some(monitor) = me.upgrade() {
                    monitor.fire(id);
                }
            }),
        )
    }

    fn fire(&self, id: WatchId) {
        let watch = self.watches.borrow_mut().remove(&id);
        if let Some(watch) = watch {
            trace!(watch = id.0, "idle watch fired");
            (watch.callback)();
        }
    }

    fn allocate_id(&self) -> WatchId {
        let id = WatchId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        id
    }
}

impl IdleMonitor for SimIdleMonitor {
    fn idle_time(&self) -> Duration {
        self.idle_at_mark.get() + self.scheduler.now().saturating_sub(self.mark.get())
    }

    fn add_idle_watch(&self, threshold: Duration, callback: Callback) -> WatchId {
        let id = self.allocate_id();
        let task = self.schedule_fire(id, threshold);
        self.watches.borrow_mut().insert(
            id,
            Watch {
                kind: WatchKind::Idle {
                    threshold,
                    task: Some(task),
                },
                callback,
            },
        );
        id
    }

    fn add_user_active_watch(&self, callback: Callback) -> WatchId {
        let id = self.allocate_id();
        self.watches.borrow_mut().insert(
            id,
            Watch {
                kind: WatchKind::UserActive,
                callback,
            },
        );
        id
    }

    fn remove_watch(&self, id: WatchId) {
        let watch = self.watches.borrow_mut().remove(&id);
        if let Some(Watch {
            kind: WatchKind::Idle {
                task: Some(task), ..
            },
            ..
        }) = watch
        {
            self.scheduler.cancel(task);
        }
    }
}
