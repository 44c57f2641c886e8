//! # Geographic Utilities
//!
//! Distance and interpolation helpers used by the resampler and overlay builder.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`cumulative_distances`] | Running distance along a track, aligned with its points |
//! | [`polyline_length`] | Total length of a GPS track in meters |
//! | [`interpolate`] | Linear lat/lng interpolation between two points |
//! | [`route_bounds`] | Bounding box of a GPS track |
//!
//! ## Example
//!
//! ```rust
//! use route_replay::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(-33.8688, 151.2093), // Sydney
//!     GpsPoint::new(-33.8700, 151.2100),
//!     GpsPoint::new(-33.8710, 151.2110),
//! ];
//!
//! let cumulative = geo_utils::cumulative_distances(&track);
//! assert_eq!(cumulative[0], 0.0);
//! assert!((cumulative[2] - geo_utils::polyline_length(&track)).abs() < 1e-9);
//! ```
//!
//! ## Algorithm Notes
//!
//! Distances use the haversine formula on a spherical Earth (geo's mean radius,
//! 6,371,008.8 m). Interpolation is linear in latitude/longitude space, which is
//! indistinguishable from a great-circle slerp at resampling scales (tens of meters).

use geo::{BoundingRect, Coord, Distance, Haversine, LineString, Point};

use crate::{Bounds, GpsPoint};

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface.
///
/// # Example
///
/// ```rust
/// use route_replay::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(0.0, 0.0);
/// let b = GpsPoint::new(0.001, 0.0);
///
/// let distance = geo_utils::haversine_distance(&a, &b);
/// assert!((distance - 111.2).abs() < 0.1);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    Haversine::distance(Point::from(*p1), Point::from(*p2))
}

/// Running distance along a track in meters.
///
/// The result has one entry per input point; the first entry is always `0.0`
/// and the last is the total track length. Empty input yields an empty vector.
pub fn cumulative_distances(points: &[GpsPoint]) -> Vec<f64> {
    let mut cumulative = Vec::with_capacity(points.len());
    let mut total = 0.0;

    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            total += haversine_distance(&points[i - 1], point);
        }
        cumulative.push(total);
    }

    cumulative
}

/// Total length of a GPS track in meters; 0 for fewer than two points.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    cumulative_distances(points).last().copied().unwrap_or(0.0)
}

// =============================================================================
// Interpolation
// =============================================================================

/// Linearly interpolate between two points.
///
/// `ratio` is the fraction of the way from `from` to `to`. A ratio at or
/// beyond either end returns that endpoint exactly, so callers never see
/// rounding noise on route vertices.
///
/// # Example
///
/// ```rust
/// use route_replay::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(10.0, 20.0);
/// let b = GpsPoint::new(12.0, 24.0);
///
/// let mid = geo_utils::interpolate(&a, &b, 0.5);
/// assert_eq!(mid, GpsPoint::new(11.0, 22.0));
/// assert_eq!(geo_utils::interpolate(&a, &b, 1.0), b);
/// ```
#[inline]
pub fn interpolate(from: &GpsPoint, to: &GpsPoint, ratio: f64) -> GpsPoint {
    if ratio <= 0.0 {
        return *from;
    }
    if ratio >= 1.0 {
        return *to;
    }

    let start = Coord::from(*from);
    let end = Coord::from(*to);
    GpsPoint::from(start + (end - start) * ratio)
}

// =============================================================================
// Bounds
// =============================================================================

/// Bounding box of a GPS track, or `None` when it is empty.
pub fn route_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    let line: LineString = points.iter().map(|p| Coord::from(*p)).collect();
    let rect = line.bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
