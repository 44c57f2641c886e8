//! FFI bindings for mobile platforms (iOS/Android).
//!
//! Platform display links drive playback with their own frame clock, so the
//! exported [`PlaybackHandle`] wraps the pure [`Playback`] state machine and
//! takes timestamps in milliseconds rather than owning a scheduler.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::codec::PrecisionFiveDecoder;
use crate::playback::{tick_interval, Frame, Playback, PlaybackConfig, PlaybackStatus};
use crate::resample::{resample_route, UniformRoute};
use crate::styling::{rainbow_color, speed_color};
use crate::{init_logging, GpsPoint};

fn millis(ms: f64) -> Duration {
    if !ms.is_finite() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_nanos((ms * 1e6).round() as u64)
}

fn as_millis(interval: Duration) -> f64 {
    interval.as_nanos() as f64 / 1e6
}

/// Decode an encoded polyline and resample it to `spacing` meters.
///
/// Returns `None` if the polyline cannot be decoded or the spacing is invalid.
#[uniffi::export]
pub fn resample_polyline(encoded: String, spacing: f64) -> Option<Vec<GpsPoint>> {
    init_logging();
    match resample_route(&encoded, spacing, &PrecisionFiveDecoder) {
        Ok(route) => {
            info!(
                "[RouteReplayRust] Resampled {}-char polyline to {} points",
                encoded.len(),
                route.len()
            );
            Some(route.to_vec())
        }
        Err(e) => {
            warn!("[RouteReplayRust] resample_polyline failed: {}", e);
            None
        }
    }
}

/// Milliseconds per tick, or `None` if the route cannot be animated.
#[uniffi::export]
pub fn playback_tick_interval_ms(
    moving_time_secs: f64,
    speed_multiplier: f64,
    point_count: u32,
) -> Option<f64> {
    tick_interval(moving_time_secs, speed_multiplier, point_count as usize)
        .map(as_millis)
}

/// Rainbow color for a position in `[0, 1]`.
#[uniffi::export]
pub fn route_rainbow_color(position: f64) -> String {
    rainbow_color(position)
}

/// Speed scale color for an average speed in km/h.
#[uniffi::export]
pub fn route_speed_color(speed_kmh: f64) -> String {
    speed_color(speed_kmh)
}

/// Get default playback configuration.
#[uniffi::export]
pub fn default_playback_config() -> PlaybackConfig {
    PlaybackConfig::default()
}

/// Create a playback handle for a resampled route.
///
/// Returns `None` for an invalid moving time or config.
#[uniffi::export]
pub fn create_playback(
    points: Vec<GpsPoint>,
    moving_time_secs: f64,
    config: PlaybackConfig,
) -> Option<Arc<PlaybackHandle>> {
    init_logging();
    match Playback::new(UniformRoute::new(points), moving_time_secs, config) {
        Ok(playback) => {
            debug!(
                "[RouteReplayRust] Created playback: {} points, tick {:?}",
                playback.route().len(),
                playback.tick_interval()
            );
            Some(Arc::new(PlaybackHandle {
                inner: Mutex::new(playback),
            }))
        }
        Err(e) => {
            warn!("[RouteReplayRust] create_playback failed: {}", e);
            None
        }
    }
}

/// Frame-clock driven playback for one route.
#[derive(Debug, uniffi::Object)]
pub struct PlaybackHandle {
    inner: Mutex<Playback>,
}

impl PlaybackHandle {
    fn lock(&self) -> MutexGuard<'_, Playback> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export]
impl PlaybackHandle {
    /// Start at `now_ms`. Returns `false` for routes that cannot animate.
    pub fn start(&self, now_ms: f64) -> bool {
        self.lock().start(millis(now_ms))
    }

    pub fn pause(&self) {
        self.lock().pause();
    }

    pub fn resume(&self, now_ms: f64) {
        self.lock().resume(millis(now_ms));
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    /// Advance to `now_ms`; returns the number of ticks taken.
    pub fn advance_to(&self, now_ms: f64) -> u32 {
        self.lock().advance_to(millis(now_ms)) as u32
    }

    pub fn frame(&self) -> Option<Frame> {
        self.lock().frame()
    }

    /// Returns `false` and keeps the old speed if `speed_multiplier` is invalid.
    pub fn set_speed(&self, speed_multiplier: f64) -> bool {
        self.lock().set_speed(speed_multiplier).is_ok()
    }

    pub fn set_trail_length(&self, trail_length: u32) {
        self.lock().set_trail_length(trail_length);
    }

    pub fn status(&self) -> PlaybackStatus {
        self.lock().status()
    }

    pub fn current_index(&self) -> u32 {
        self.lock().current_index() as u32
    }

    pub fn tick_interval_ms(&self) -> Option<f64> {
        self.lock().tick_interval().map(as_millis)
    }
}
