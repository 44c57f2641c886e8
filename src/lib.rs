//! # Route Replay
//!
//! Route preprocessing and replay animation for fitness activity maps.
//!
//! This library provides:
//! - Uniform-distance resampling of encoded activity polylines
//! - A memoizing route cache shared by every consumer of resampled routes
//! - A tick-driven playback engine with a fading trail and pause/resume
//! - Route styling (static, chronological rainbow, speed based) and overlay assembly
//!
//! Fetching activities and drawing the map are left to the host application:
//! the crate consumes [`Activity`] records and produces [`RouteOverlay`] and
//! [`Frame`] values for a renderer.
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel overlay preprocessing with rayon
//! - **`runtime`** - Enable the tokio-backed real-time tick scheduler
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use std::time::Duration;
//! use route_replay::{
//!     encode_route, Animator, GpsPoint, Playback, PlaybackConfig, RouteCache, SimulatedScheduler,
//! };
//!
//! // ~333 m due north
//! let encoded = encode_route(&[GpsPoint::new(0.0, 0.0), GpsPoint::new(0.003, 0.0)]).unwrap();
//!
//! let cache = RouteCache::new();
//! let route = cache.get_or_resample(&encoded, 15.0).unwrap();
//! assert_eq!(route.first(), Some(&GpsPoint::new(0.0, 0.0)));
//!
//! let playback = Playback::new(route, 600.0, PlaybackConfig::default()).unwrap();
//! let scheduler = Rc::new(SimulatedScheduler::new());
//! let animator = Animator::new(Rc::clone(&scheduler), playback);
//!
//! assert!(animator.start());
//! scheduler.advance(Duration::from_secs(1));
//! assert!(animator.current_index() > 0);
//! ```

use geo::{Coord, Point};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{ReplayError, Result};

// Geographic utilities (distance, interpolation, bounds)
pub mod geo_utils;

// Encoded polyline port
pub mod codec;
pub use codec::{decode_route, encode_route, PolylineDecoder, PrecisionFiveDecoder};

// Uniform-distance resampling
pub mod resample;
pub use resample::{
    resample_points, resample_route, UniformRoute, DEFAULT_RESAMPLE_DISTANCE, MAX_RESAMPLED_POINTS,
};

// Memoized resampled routes
pub mod cache;
pub use cache::{CachedRoute, RouteCache};

// Activity records supplied by the fetch layer
pub mod activity;
pub use activity::{Activity, ActivityMap};

// Route colors
pub mod styling;
pub use styling::{hsl_to_hex, rainbow_color, speed_color, RouteStyle};

// Renderable route overlays
pub mod overlay;
#[cfg(feature = "parallel")]
pub use overlay::build_overlays_parallel;
pub use overlay::{build_overlays, combined_bounds, OverlayConfig, RouteOverlay};

// Playback animation engine
pub mod playback;
#[cfg(feature = "runtime")]
pub use playback::TokioScheduler;
pub use playback::{
    tick_interval, Animator, Frame, Playback, PlaybackConfig, PlaybackStatus, ReplaySession,
    Scheduler, SimulatedScheduler, TickCallback, TickHandle, TrailPoint, TrailSegment,
    MAX_TRAIL_LENGTH,
};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RouteReplayRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_replay::GpsPoint;
/// let point = GpsPoint::new(-33.85, 151.15); // Sydney
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

// geo works in (x, y) = (lng, lat)
impl From<GpsPoint> for Coord {
    fn from(p: GpsPoint) -> Self {
        Coord {
            x: p.longitude,
            y: p.latitude,
        }
    }
}

impl From<GpsPoint> for Point {
    fn from(p: GpsPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

impl From<Coord> for GpsPoint {
    fn from(c: Coord) -> Self {
        GpsPoint::new(c.y, c.x)
    }
}

/// Bounding box for a route, used to fit the map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points, or `None` for an empty track.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        geo_utils::route_bounds(points)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Smallest bounds containing both `self` and `other`.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lng: self.min_lng.min(other.min_lng),
            max_lng: self.max_lng.max(other.max_lng),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
