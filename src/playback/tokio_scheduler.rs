//! Real-time tick scheduling on tokio.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::scheduler::{Scheduler, TickCallback, TickHandle};

/// [`Scheduler`] backed by tokio timers.
///
/// Each tick is a local task that sleeps for its delay and then runs the
/// callback, so the scheduler must be used inside a
/// [`LocalSet`](tokio::task::LocalSet). Cancelling a tick aborts its task;
/// dropping the scheduler aborts every outstanding tick.
#[derive(Debug)]
pub struct TokioScheduler {
    origin: Instant,
    next_id: Cell<u64>,
    tasks: Rc<RefCell<HashMap<u64, JoinHandle<()>>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_id: Cell::new(0),
            tasks: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Number of ticks waiting to fire.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule_tick(&self, delay: Duration, callback: TickCallback) -> TickHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let tasks = Rc::clone(&self.tasks);
        let origin = self.origin;
        let task = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            tasks.borrow_mut().remove(&id);
            callback(origin.elapsed());
        });

        // The task cannot run before this returns to the executor
        self.tasks.borrow_mut().insert(id, task);
        TickHandle::new(id)
    }

    fn cancel(&self, handle: TickHandle) {
        if let Some(task) = self.tasks.borrow_mut().remove(&handle.id()) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        let mut tasks = self.tasks.borrow_mut();
        if !tasks.is_empty() {
            debug!("[TokioScheduler] Aborting {} pending ticks", tasks.len());
        }
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }
}
