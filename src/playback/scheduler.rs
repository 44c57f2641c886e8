//! Tick scheduling port.
//!
//! The animator never sleeps or reads a wall clock. It asks a [`Scheduler`]
//! to run a callback after a delay and keeps the returned handle so the
//! callback can be cancelled. Swapping the scheduler swaps the time source:
//! [`SimulatedScheduler`] runs on a virtual clock that tests advance by hand;
//! `TokioScheduler` (feature `runtime`) uses real timers.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Callback run when a scheduled tick fires; receives the firing time.
pub type TickCallback = Box<dyn FnOnce(Duration)>;

/// Identifies one scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Single-threaded source of delayed callbacks.
///
/// Methods take `&self` so a firing callback can schedule its successor.
/// A cancelled callback must never run, and cancelling a handle that already
/// fired (or was already cancelled) is a no-op.
pub trait Scheduler {
    /// Time on this scheduler's clock.
    fn now(&self) -> Duration;

    /// Run `callback` once, `delay` from now.
    fn schedule_tick(&self, delay: Duration, callback: TickCallback) -> TickHandle;

    fn cancel(&self, handle: TickHandle);
}

/// Deterministic scheduler on a virtual clock.
///
/// Nothing fires until the clock is moved with [`advance`](Self::advance) or
/// [`run_until`](Self::run_until). Callbacks fire in due-time order (ties in
/// scheduling order) and see the clock set to their due time.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
/// use route_replay::{Scheduler, SimulatedScheduler};
///
/// let scheduler = SimulatedScheduler::new();
/// let fired = Rc::new(Cell::new(false));
///
/// let flag = Rc::clone(&fired);
/// scheduler.schedule_tick(Duration::from_millis(50), Box::new(move |_| flag.set(true)));
///
/// scheduler.advance(Duration::from_millis(49));
/// assert!(!fired.get());
/// scheduler.advance(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Default)]
pub struct SimulatedScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<(Duration, u64), TickCallback>>,
    due_by_id: RefCell<HashMap<u64, Duration>>,
}

impl SimulatedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `by`, firing everything that falls due.
    /// Returns the number of callbacks fired.
    pub fn advance(&self, by: Duration) -> usize {
        self.run_until(self.now.get() + by)
    }

    /// Move the clock to `deadline`, firing everything due at or before it.
    /// Returns the number of callbacks fired.
    pub fn run_until(&self, deadline: Duration) -> usize {
        let mut fired = 0;

        while let Some((due, callback)) = self.pop_due(deadline) {
            self.now.set(due);
            callback(due);
            fired += 1;
        }

        if deadline > self.now.get() {
            self.now.set(deadline);
        }
        fired
    }

    /// Number of callbacks waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Due time of the earliest pending callback.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.borrow().keys().next().map(|(due, _)| *due)
    }

    fn pop_due(&self, deadline: Duration) -> Option<(Duration, TickCallback)> {
        let mut queue = self.queue.borrow_mut();
        let key = *queue.keys().next()?;
        if key.0 > deadline {
            return None;
        }
        let callback = queue.remove(&key)?;
        self.due_by_id.borrow_mut().remove(&key.1);
        Some((key.0, callback))
    }
}

impl Scheduler for SimulatedScheduler {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn schedule_tick(&self, delay: Duration, callback: TickCallback) -> TickHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let due = self.now.get() + delay;
        self.queue.borrow_mut().insert((due, id), callback);
        self.due_by_id.borrow_mut().insert(id, due);
        TickHandle(id)
    }

    fn cancel(&self, handle: TickHandle) {
        if let Some(due) = self.due_by_id.borrow_mut().remove(&handle.0) {
            self.queue.borrow_mut().remove(&(due, handle.0));
        }
    }
}

impl std::fmt::Debug for SimulatedScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedScheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending())
            .finish()
    }
}
