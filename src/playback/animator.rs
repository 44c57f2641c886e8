//! Scheduler-driven playback for one route.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::debug;

use super::scheduler::{Scheduler, TickHandle};
use super::{Frame, Playback, PlaybackStatus};
use crate::Result;

/// Receives each new frame after a tick.
pub type FrameCallback = Box<dyn FnMut(&Frame)>;

struct Shared<S> {
    scheduler: Rc<S>,
    playback: RefCell<Playback>,
    pending: Cell<Option<TickHandle>>,
    on_frame: RefCell<Option<FrameCallback>>,
}

impl<S: Scheduler + 'static> Shared<S> {
    /// Keep exactly one tick in flight while running.
    fn schedule_next(self: &Rc<Self>) {
        self.cancel_pending();

        let Some(delay) = self.playback.borrow().time_until_next_tick() else {
            return;
        };

        let weak: Weak<Self> = Rc::downgrade(self);
        let handle = self.scheduler.schedule_tick(
            delay,
            Box::new(move |now| {
                if let Some(shared) = weak.upgrade() {
                    shared.fire(now);
                }
            }),
        );
        self.pending.set(Some(handle));
    }

    fn fire(self: &Rc<Self>, now: Duration) {
        self.pending.set(None);

        let ticks = self.playback.borrow_mut().advance_to(now);
        if ticks > 0 {
            self.emit_frame();
        }

        self.schedule_next();
    }

    fn emit_frame(&self) {
        let frame = self.playback.borrow().frame();
        if let (Some(frame), Some(callback)) = (frame, self.on_frame.borrow_mut().as_mut()) {
            callback(&frame);
        }
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

/// Replays one route on a [`Scheduler`].
///
/// While running, exactly one tick is scheduled at a time. Pausing, stopping
/// and dropping the animator all cancel it, so no callback outlives the
/// animator's interest in it.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use std::time::Duration;
/// use route_replay::{Animator, GpsPoint, Playback, PlaybackConfig, SimulatedScheduler, UniformRoute};
///
/// let route = UniformRoute::new((0..50).map(|i| GpsPoint::new(i as f64 * 1e-4, 0.0)).collect());
/// let playback = Playback::new(route, 600.0, PlaybackConfig::default()).unwrap();
///
/// let scheduler = Rc::new(SimulatedScheduler::new());
/// let animator = Animator::new(Rc::clone(&scheduler), playback);
/// animator.start();
///
/// scheduler.advance(Duration::from_millis(1200));
/// assert_eq!(animator.current_index(), 10);
///
/// animator.pause(); // map zoom started
/// scheduler.advance(Duration::from_secs(5));
/// assert_eq!(animator.current_index(), 10);
///
/// animator.resume(); // map zoom ended
/// scheduler.advance(Duration::from_millis(120));
/// assert_eq!(animator.current_index(), 11);
/// ```
pub struct Animator<S: Scheduler + 'static> {
    shared: Rc<Shared<S>>,
}

impl<S: Scheduler + 'static> Animator<S> {
    pub fn new(scheduler: Rc<S>, playback: Playback) -> Self {
        Self {
            shared: Rc::new(Shared {
                scheduler,
                playback: RefCell::new(playback),
                pending: Cell::new(None),
                on_frame: RefCell::new(None),
            }),
        }
    }

    /// Deliver every new frame to `callback`.
    pub fn on_frame(&self, callback: impl FnMut(&Frame) + 'static) {
        *self.shared.on_frame.borrow_mut() = Some(Box::new(callback));
    }

    /// Start replaying. Returns `false` if the route cannot be animated.
    pub fn start(&self) -> bool {
        let now = self.shared.scheduler.now();
        let started = self.shared.playback.borrow_mut().start(now);
        if started && self.shared.pending.get().is_none() {
            debug!(
                "[Animator] Starting replay of {} points every {:?}",
                self.shared.playback.borrow().route().len(),
                self.shared.playback.borrow().tick_interval()
            );
            self.shared.schedule_next();
        }
        started
    }

    /// Suspend ticking, keeping position and trail.
    pub fn pause(&self) {
        self.shared.cancel_pending();
        self.shared.playback.borrow_mut().pause();
    }

    /// Resume after [`pause`](Self::pause) from the retained position.
    pub fn resume(&self) {
        let now = self.shared.scheduler.now();
        let resumed = {
            let mut playback = self.shared.playback.borrow_mut();
            playback.resume(now);
            playback.status() == PlaybackStatus::Running
        };
        if resumed && self.shared.pending.get().is_none() {
            self.shared.schedule_next();
        }
    }

    /// Stop and discard position and trail.
    pub fn stop(&self) {
        self.shared.cancel_pending();
        self.shared.playback.borrow_mut().stop();
    }

    /// Change the speed multiplier without restarting.
    ///
    /// Position and trail are kept; the pending tick is rescheduled at the
    /// new interval. Ticks already due at the old speed are taken first and
    /// reported through [`on_frame`](Self::on_frame).
    pub fn set_speed(&self, speed_multiplier: f64) -> Result<()> {
        let now = self.shared.scheduler.now();
        let ticks = {
            let mut playback = self.shared.playback.borrow_mut();
            let ticks = playback.advance_to(now);
            playback.set_speed(speed_multiplier)?;
            ticks
        };
        if ticks > 0 {
            self.shared.emit_frame();
        }
        if self.shared.pending.get().is_some() {
            self.shared.schedule_next();
        }
        Ok(())
    }

    pub fn set_trail_length(&self, trail_length: u32) {
        self.shared.playback.borrow_mut().set_trail_length(trail_length);
    }

    pub fn status(&self) -> PlaybackStatus {
        self.shared.playback.borrow().status()
    }

    pub fn current_index(&self) -> usize {
        self.shared.playback.borrow().current_index()
    }

    pub fn trail_len(&self) -> usize {
        self.shared.playback.borrow().trail_len()
    }

    /// Current frame, or `None` for an empty route.
    pub fn frame(&self) -> Option<Frame> {
        self.shared.playback.borrow().frame()
    }

    /// Whether a tick is currently scheduled.
    pub fn has_pending_tick(&self) -> bool {
        self.shared.pending.get().is_some()
    }

    /// Read-only view of the underlying state machine.
    pub fn with_playback<R>(&self, f: impl FnOnce(&Playback) -> R) -> R {
        f(&self.shared.playback.borrow())
    }
}

impl<S: Scheduler + 'static> Drop for Animator<S> {
    fn drop(&mut self) {
        self.shared.cancel_pending();
    }
}

impl<S: Scheduler + 'static> std::fmt::Debug for Animator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("playback", &self.shared.playback.borrow())
            .field("pending", &self.shared.pending.get())
            .finish()
    }
}
