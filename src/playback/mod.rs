//! # Playback
//!
//! Route replay: a marker walks the resampled route one point per tick and
//! leaves a fading trail behind it.
//!
//! The pieces, from the inside out:
//!
//! | Type | Role |
//! |------|------|
//! | [`Playback`] | Pure per-route state machine: index, trail, clock |
//! | [`Scheduler`] | Port for delayed callbacks (virtual or real time) |
//! | [`Animator`] | Drives one `Playback` from a `Scheduler` |
//! | [`ReplaySession`] | One animator per displayed route |
//!
//! ## Timing
//!
//! A full loop of the route lasts the activity's moving time divided by the
//! speed multiplier, however many points the route was resampled to:
//!
//! ```text
//! tick_interval = (moving_time_s * 1000 / speed) / point_count   [ms]
//! ```
//!
//! The clock is an accumulator. Elapsed time since the last update is added
//! to a carry and one tick is taken per whole interval in the carry, so a
//! frame-aligned caller with frames longer than the interval still replays at
//! the right speed. Resuming after a pause resets the clock: a long pause never
//! turns into a burst of catch-up ticks.

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::require_positive;
use crate::resample::UniformRoute;
use crate::{GpsPoint, ReplayError, Result};

mod animator;
mod scheduler;
mod session;
#[cfg(feature = "runtime")]
mod tokio_scheduler;

pub use animator::{Animator, FrameCallback};
pub use scheduler::{Scheduler, SimulatedScheduler, TickCallback, TickHandle};
pub use session::ReplaySession;
#[cfg(feature = "runtime")]
pub use tokio_scheduler::TokioScheduler;

/// Shortest tick the clock will schedule.
const MIN_TICK: Duration = Duration::from_micros(1);

/// Longest trail a playback accepts.
pub const MAX_TRAIL_LENGTH: u32 = 10_000;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for route playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PlaybackConfig {
    /// How many times faster than real time the route replays.
    /// Default: 100.0
    pub speed_multiplier: f64,

    /// Number of recent points kept in the trail, at most [`MAX_TRAIL_LENGTH`].
    /// Default: 20
    pub trail_length: u32,

    /// Scale applied to the trail fade, which runs linearly from 0 at the
    /// oldest end of a full trail window.
    /// Default: 0.8
    pub trail_opacity: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 100.0,
            trail_length: 20,
            trail_opacity: 0.8,
        }
    }
}

impl PlaybackConfig {
    /// Check the numeric fields.
    pub fn validate(&self) -> Result<()> {
        require_positive(self.speed_multiplier, |speed| ReplayError::InvalidSpeed {
            speed,
        })?;
        if self.trail_length > MAX_TRAIL_LENGTH {
            return Err(ReplayError::InvalidTrailLength {
                length: self.trail_length,
                max: MAX_TRAIL_LENGTH,
            });
        }
        if !(0.0..=1.0).contains(&self.trail_opacity) {
            return Err(ReplayError::InvalidOpacity {
                opacity: self.trail_opacity,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Frame Types
// ============================================================================

/// Playback state machine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum PlaybackStatus {
    /// Not animating; also the permanent state of routes with fewer than two points
    Stopped,
    /// Advancing on every tick
    Running,
    /// Suspended with index and trail retained
    Paused,
}

/// A point in the trail and the route index it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrailPoint {
    pub position: GpsPoint,
    pub index: u32,
}

/// One drawable piece of the trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrailSegment {
    pub from: GpsPoint,
    pub to: GpsPoint,
    /// Within `[0, 1]`; oldest segment is faintest
    pub opacity: f64,
}

/// What the renderer draws for one route on one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Frame {
    pub current_position: GpsPoint,
    pub trail_segments: Vec<TrailSegment>,
}

/// Time per tick for a route, or `None` if it cannot be animated.
///
/// Zero, negative or non-finite durations and speeds and an empty route all
/// yield `None`.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use route_replay::tick_interval;
///
/// // 10 minute activity at 100x over 50 points
/// assert_eq!(tick_interval(600.0, 100.0, 50), Some(Duration::from_millis(120)));
/// assert_eq!(tick_interval(600.0, 0.0, 50), None);
/// ```
pub fn tick_interval(
    moving_time_secs: f64,
    speed_multiplier: f64,
    point_count: usize,
) -> Option<Duration> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if point_count == 0 || !positive(moving_time_secs) || !positive(speed_multiplier) {
        return None;
    }

    let loop_secs = moving_time_secs / speed_multiplier;
    let nanos = (loop_secs / point_count as f64 * 1e9).round();
    if !nanos.is_finite() || nanos >= u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(nanos as u64).max(MIN_TICK))
}

// ============================================================================
// Playback State Machine
// ============================================================================

/// Replay state for one route.
///
/// `Playback` never reads a clock of its own: callers pass the current time
/// into [`start`](Self::start), [`resume`](Self::resume) and
/// [`advance_to`](Self::advance_to), or step it directly with
/// [`tick`](Self::tick). That keeps it usable from timers, display links and
/// tests alike.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use route_replay::{GpsPoint, Playback, PlaybackConfig, PlaybackStatus, UniformRoute};
///
/// let route = UniformRoute::new((0..50).map(|i| GpsPoint::new(i as f64 * 1e-4, 0.0)).collect());
/// let mut playback = Playback::new(route, 600.0, PlaybackConfig::default()).unwrap();
///
/// assert!(playback.start(Duration::ZERO));
/// assert_eq!(playback.advance_to(Duration::from_millis(360)), 3);
/// assert_eq!(playback.current_index(), 3);
///
/// playback.pause();
/// assert_eq!(playback.status(), PlaybackStatus::Paused);
/// assert_eq!(playback.advance_to(Duration::from_secs(60)), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Playback {
    route: UniformRoute,
    moving_time_secs: f64,
    config: PlaybackConfig,
    status: PlaybackStatus,
    current_index: usize,
    trail: VecDeque<TrailPoint>,
    /// Clock reading at the last `advance_to`/`start`/`resume`
    last_update: Option<Duration>,
    /// Elapsed time not yet converted into ticks
    carry: Duration,
}

impl Playback {
    /// Create a stopped playback for `route`.
    ///
    /// Fails on a non-positive or non-finite moving time or an invalid
    /// config. The trail grows on demand and never holds more than one loop
    /// of points. A route with fewer than two points is accepted but will
    /// never start.
    pub fn new(route: UniformRoute, moving_time_secs: f64, config: PlaybackConfig) -> Result<Self> {
        require_positive(moving_time_secs, |seconds| ReplayError::InvalidDuration {
            seconds,
        })?;
        config.validate()?;

        Ok(Self {
            route,
            moving_time_secs,
            trail: VecDeque::new(),
            config,
            status: PlaybackStatus::Stopped,
            current_index: 0,
            last_update: None,
            carry: Duration::ZERO,
        })
    }

    pub fn route(&self) -> &UniformRoute {
        &self.route
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn moving_time_secs(&self) -> f64 {
        self.moving_time_secs
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Marker position, or `None` for an empty route.
    pub fn current_position(&self) -> Option<GpsPoint> {
        self.route.get(self.current_index).copied()
    }

    /// Trail points, oldest first.
    pub fn trail(&self) -> impl ExactSizeIterator<Item = &TrailPoint> {
        self.trail.iter()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Whether this route can ever leave `Stopped`.
    pub fn is_animatable(&self) -> bool {
        self.route.len() >= 2
    }

    /// Time per tick at the current speed, `None` for routes that cannot animate.
    pub fn tick_interval(&self) -> Option<Duration> {
        if !self.is_animatable() {
            return None;
        }
        tick_interval(
            self.moving_time_secs,
            self.config.speed_multiplier,
            self.route.len(),
        )
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// `Stopped -> Running`. Returns whether playback is running afterwards.
    pub fn start(&mut self, now: Duration) -> bool {
        match self.status {
            PlaybackStatus::Running => true,
            PlaybackStatus::Paused => false,
            PlaybackStatus::Stopped => {
                if self.tick_interval().is_none() {
                    debug!(
                        "[Playback] Route with {} points cannot animate; staying stopped",
                        self.route.len()
                    );
                    return false;
                }
                self.status = PlaybackStatus::Running;
                self.reset_clock(now);
                true
            }
        }
    }

    /// `Running -> Paused`, keeping index and trail.
    pub fn pause(&mut self) {
        if self.status == PlaybackStatus::Running {
            self.status = PlaybackStatus::Paused;
        }
    }

    /// `Paused -> Running`. Time spent paused is not replayed.
    pub fn resume(&mut self, now: Duration) {
        if self.status == PlaybackStatus::Paused {
            self.status = PlaybackStatus::Running;
            self.reset_clock(now);
        }
    }

    /// Any state to `Stopped`, discarding index and trail.
    pub fn stop(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.current_index = 0;
        self.trail.clear();
        self.last_update = None;
        self.carry = Duration::ZERO;
    }

    /// Advance one point. Does nothing unless running.
    ///
    /// Wrapping back to the start clears the trail so no segment is drawn
    /// from the end of the route to its beginning.
    pub fn tick(&mut self) {
        if self.status != PlaybackStatus::Running || self.route.is_empty() {
            return;
        }

        self.current_index = (self.current_index + 1) % self.route.len();

        if self.current_index == 0 {
            self.trail.clear();
            return;
        }

        self.trail.push_back(TrailPoint {
            position: self.route[self.current_index],
            index: self.current_index as u32,
        });
        self.truncate_trail();
    }

    /// Advance the clock to `now`, ticking once per elapsed interval.
    ///
    /// At most one full loop is taken per call. Returns the number of ticks.
    pub fn advance_to(&mut self, now: Duration) -> usize {
        if self.status != PlaybackStatus::Running {
            return 0;
        }
        let Some(interval) = self.tick_interval() else {
            return 0;
        };

        let last = *self.last_update.get_or_insert(now);
        let elapsed = now.saturating_sub(last);
        self.last_update = Some(now);

        let pending = self.carry + elapsed;
        let due = pending.as_nanos() / interval.as_nanos();
        let ticks = due.min(self.route.len() as u128) as usize;

        self.carry = if (ticks as u128) < due {
            // Dropped a backlog larger than a loop
            Duration::from_nanos((pending.as_nanos() % interval.as_nanos()) as u64)
        } else {
            pending - interval * ticks as u32
        };

        for _ in 0..ticks {
            self.tick();
        }
        ticks
    }

    /// Delay until the next tick falls due, `None` unless running.
    pub fn time_until_next_tick(&self) -> Option<Duration> {
        if self.status != PlaybackStatus::Running {
            return None;
        }
        let interval = self.tick_interval()?;
        Some(interval.saturating_sub(self.carry).max(MIN_TICK))
    }

    // ------------------------------------------------------------------------
    // Reconfiguration
    // ------------------------------------------------------------------------

    /// Change the speed multiplier; applies from the next tick.
    pub fn set_speed(&mut self, speed_multiplier: f64) -> Result<()> {
        require_positive(speed_multiplier, |speed| ReplayError::InvalidSpeed {
            speed,
        })?;
        self.config.speed_multiplier = speed_multiplier;
        Ok(())
    }

    /// Change the trail length; a shorter trail is cut back immediately.
    ///
    /// Lengths above [`MAX_TRAIL_LENGTH`] are clamped to it.
    pub fn set_trail_length(&mut self, trail_length: u32) {
        self.config.trail_length = trail_length.min(MAX_TRAIL_LENGTH);
        self.truncate_trail();
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    /// Trail segments with opacity rising linearly from oldest to newest.
    ///
    /// The ramp spans the configured window rather than the current trail:
    /// segment `i` (0 = oldest) gets `i / (trail_length - 1) * trail_opacity`,
    /// so a young trail starts faint and the oldest segment fades out.
    pub fn trail_segments(&self) -> Vec<TrailSegment> {
        let count = self.trail.len().saturating_sub(1);
        let mut segments = Vec::with_capacity(count);
        let window = self.config.trail_length.saturating_sub(1).max(1) as f64;

        for (i, (from, to)) in self.trail.iter().zip(self.trail.iter().skip(1)).enumerate() {
            let recency = i as f64 / window;
            segments.push(TrailSegment {
                from: from.position,
                to: to.position,
                opacity: recency * self.config.trail_opacity,
            });
        }

        segments
    }

    /// Current frame, or `None` for an empty route.
    pub fn frame(&self) -> Option<Frame> {
        Some(Frame {
            current_position: self.current_position()?,
            trail_segments: self.trail_segments(),
        })
    }

    fn reset_clock(&mut self, now: Duration) {
        self.last_update = Some(now);
        self.carry = Duration::ZERO;
    }

    fn truncate_trail(&mut self) {
        let max = self.config.trail_length as usize;
        while self.trail.len() > max {
            self.trail.pop_front();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
