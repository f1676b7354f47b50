use crate::collab::{Callback, RepeatingCallback, Scheduler, TaskId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Real-time scheduler on the current tokio `LocalSet`.
///
/// Each task is a local tokio task sleeping until its deadline. A task is
/// live while its id is in `tasks`; cancelling removes the id and aborts
/// the tokio task.
pub struct LocalScheduler {
    origin: Instant,
    next_id: Cell<u64>,
    tasks: Rc<RefCell<HashMap<TaskId, AbortHandle>>>,
}

impl Default for LocalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_id: Cell::new(1),
            tasks: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Number of outstanding tasks
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    fn allocate_id(&self) -> TaskId {
        let id = TaskId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        id
    }
}

impl Scheduler for LocalScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule_once(&self, delay: Duration, callback: Callback) -> TaskId {
        let id = self.allocate_id();
        let tasks = Rc::clone(&self.tasks);

        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            // Removed before running so a cancel from inside the callback is a no-op
            let live = tasks.borrow_mut().remove(&id).is_some();
            if live {
                callback();
            }
        });

        self.tasks.borrow_mut().insert(id, handle.abort_handle());
        id
    }

    fn schedule_repeating(&self, interval: Duration, mut callback: RepeatingCallback) -> TaskId {
        let id = self.allocate_id();
        let tasks = Rc::clone(&self.tasks);
        let interval = interval.max(Duration::from_millis(1));

        let handle = tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !tasks.borrow().contains_key(&id) {
                    break;
                }
                if callback().is_break() {
                    tasks.borrow_mut().remove(&id);
                    break;
                }
            }
        });

        self.tasks.borrow_mut().insert(id, handle.abort_handle());
        id
    }

    fn cancel(&self, id: TaskId) {
        let handle = self.tasks.borrow_mut().remove(&id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for LocalScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.borrow_mut().drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::ControlFlow;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn once_task_fires_after_delay() {
        LocalSet::new()
            .run_until(async {
                let scheduler = LocalScheduler::new();
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);

                scheduler.schedule_once(
                    Duration::from_millis(100),
                    Box::new(move || flag.set(true)),
                );

                tokio::time::sleep(Duration::from_millis(50)).await;
                assert!(!fired.get());

                tokio::time::sleep(Duration::from_millis(60)).await;
                assert!(fired.get());
                assert_eq!(scheduler.pending(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_fires() {
        LocalSet::new()
            .run_until(async {
                let scheduler = LocalScheduler::new();
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);

                let id = scheduler.schedule_once(
                    Duration::from_millis(100),
                    Box::new(move || flag.set(true)),
                );
                scheduler.cancel(id);

                tokio::time::sleep(Duration::from_millis(200)).await;
                assert!(!fired.get());
                assert_eq!(scheduler.pending(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_task_stops_on_break() {
        LocalSet::new()
            .run_until(async {
                let scheduler = LocalScheduler::new();
                let count = Rc::new(Cell::new(0));
                let counter = Rc::clone(&count);

                scheduler.schedule_repeating(
                    Duration::from_millis(10),
                    Box::new(move || {
                        counter.set(counter.get() + 1);
                        if counter.get() == 3 {
                            ControlFlow::Break(())
                        } else {
                            ControlFlow::Continue(())
                        }
                    }),
                );

                tokio::time::sleep(Duration::from_millis(100)).await;
                assert_eq!(count.get(), 3);
                assert_eq!(scheduler.pending(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn now_follows_tokio_clock() {
        LocalSet::new()
            .run_until(async {
                let scheduler = LocalScheduler::new();
                tokio::time::sleep(Duration::from_millis(500)).await;
                assert!(scheduler.now() >= Duration::from_millis(500));
            })
            .await;
    }
}
