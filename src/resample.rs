//! Uniform-distance route resampling.
//!
//! Encoded activity polylines are sparse and irregular: long straights carry
//! two vertices, tight corners carry dozens. Playback advances one point per
//! tick, so the route is first rebuilt with points roughly `spacing` meters
//! apart. The animated marker then moves at a constant ground speed, and a
//! denser resample changes only smoothness, never the playback duration.

use std::ops::Deref;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::codec::PolylineDecoder;
use crate::error::require_positive;
use crate::geo_utils::{cumulative_distances, haversine_distance, interpolate};
use crate::{GpsPoint, ReplayError, Result};

/// Default spacing between resampled points, in meters.
pub const DEFAULT_RESAMPLE_DISTANCE: f64 = 15.0;

/// Most points a single resampled route may hold.
///
/// A spacing fine enough to exceed this is rejected before anything is
/// allocated.
pub const MAX_RESAMPLED_POINTS: usize = 1_000_000;

/// A route resampled to uniform spacing.
///
/// Cloning is cheap and shares the underlying points, so a route handed out by
/// the [`RouteCache`](crate::RouteCache) can be kept by any number of overlays
/// and animators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniformRoute(Arc<[GpsPoint]>);

impl UniformRoute {
    pub fn new(points: Vec<GpsPoint>) -> Self {
        Self(points.into())
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.0
    }

    /// True when both handles share the same allocation.
    pub fn ptr_eq(a: &UniformRoute, b: &UniformRoute) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for UniformRoute {
    type Target = [GpsPoint];

    fn deref(&self) -> &[GpsPoint] {
        &self.0
    }
}

impl From<Vec<GpsPoint>> for UniformRoute {
    fn from(points: Vec<GpsPoint>) -> Self {
        Self::new(points)
    }
}

/// Decode an encoded polyline and resample it to uniform spacing.
///
/// # Example
///
/// ```rust
/// use route_replay::{encode_route, resample_route, GpsPoint, PrecisionFiveDecoder};
///
/// let start = GpsPoint::new(0.0, 0.0);
/// let end = GpsPoint::new(0.001, 0.0); // ~111 m north
/// let encoded = encode_route(&[start, end]).unwrap();
///
/// let route = resample_route(&encoded, 15.0, &PrecisionFiveDecoder).unwrap();
/// assert_eq!(route.len(), 9);
/// assert_eq!(route[0], start);
/// assert_eq!(route[route.len() - 1], end);
/// ```
pub fn resample_route<D: PolylineDecoder>(
    encoded: &str,
    spacing: f64,
    decoder: &D,
) -> Result<UniformRoute> {
    let spacing = require_positive(spacing, |spacing| ReplayError::InvalidSpacing { spacing })?;
    let decoded = decoder.decode(encoded)?;
    let resampled = resample_points(&decoded, spacing)?;

    debug!(
        "[Resample] {} raw points -> {} points at {:.1}m spacing",
        decoded.len(),
        resampled.len(),
        spacing
    );

    Ok(UniformRoute::new(resampled))
}

/// Resample already-decoded points to uniform spacing.
///
/// The first output point is the first input point and the last output point
/// is the last input point. Inputs with fewer than two points come back
/// unchanged. Fails if the route at this spacing would need more than
/// [`MAX_RESAMPLED_POINTS`] points.
pub fn resample_points(points: &[GpsPoint], spacing: f64) -> Result<Vec<GpsPoint>> {
    let spacing = require_positive(spacing, |spacing| ReplayError::InvalidSpacing { spacing })?;

    let (first, last) = match points {
        [first, .., last] => (*first, *last),
        _ => return Ok(points.to_vec()),
    };

    let cumulative = cumulative_distances(points);
    let steps = cumulative[cumulative.len() - 1] / spacing;
    if steps >= MAX_RESAMPLED_POINTS as f64 {
        return Err(ReplayError::InvalidSpacing { spacing });
    }
    let mut resampled = Vec::with_capacity((steps as usize).saturating_add(2));
    resampled.push(first);

    let mut target = spacing;
    for i in 1..points.len() {
        let seg_start = cumulative[i - 1];
        let seg_end = cumulative[i];
        let seg_length = seg_end - seg_start;

        while target <= seg_end {
            let ratio = if seg_length > 0.0 {
                (target - seg_start) / seg_length
            } else {
                0.0
            };
            resampled.push(interpolate(&points[i - 1], &points[i], ratio));
            target += spacing;
        }
    }

    // Keep the true endpoint. A near-miss replaces the last interior point
    // rather than leaving a sliver segment at the end.
    let last_emitted = resampled[resampled.len() - 1];
    if haversine_distance(&last_emitted, &last) > spacing / 4.0 || resampled.len() == 1 {
        resampled.push(last);
    } else if let Some(tail) = resampled.last_mut() {
        *tail = last;
    }

    Ok(resampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_route, PrecisionFiveDecoder};
    use crate::geo_utils::polyline_length;

    fn north_line(step_deg: f64, count: usize) -> Vec<GpsPoint> {
        (0..count)
            .map(|i| GpsPoint::new(i as f64 * step_deg, 0.0))
            .collect()
    }

    #[test]
    fn test_resample_two_point_example() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.001, 0.0);
        let out = resample_points(&[a, b], 15.0).unwrap();

        // 15, 30, ... 105m interior points, then the endpoint ~6m later
        assert_eq!(out.len(), 9);
        assert_eq!(out[0], a);
        assert_eq!(out[8], b);
        for w in out[..8].windows(2) {
            let d = haversine_distance(&w[0], &w[1]);
            assert!((d - 15.0).abs() < 0.01, "gap {d}");
        }
    }

    #[test]
    fn test_resample_short_route_keeps_both_ends() {
        // ~11m, shorter than the spacing
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0001, 0.0);
        assert_eq!(resample_points(&[a, b], 15.0).unwrap(), vec![a, b]);

        // ~2m, inside the quarter-spacing snap radius
        let c = GpsPoint::new(0.00002, 0.0);
        assert_eq!(resample_points(&[a, c], 15.0).unwrap(), vec![a, c]);
    }

    #[test]
    fn test_resample_degenerate_inputs_unchanged() {
        assert!(resample_points(&[], 15.0).unwrap().is_empty());

        let single = vec![GpsPoint::new(-33.85, 151.15)];
        assert_eq!(resample_points(&single, 15.0).unwrap(), single);
    }

    #[test]
    fn test_resample_identical_points() {
        let p = GpsPoint::new(-33.85, 151.15);
        assert_eq!(resample_points(&[p, p, p], 15.0).unwrap(), vec![p, p]);
    }

    #[test]
    fn test_resample_snaps_near_endpoint() {
        // 101m route: interior point at 90m, endpoint 11m further -> appended
        // 92m route: interior point at 90m, endpoint 2m further -> snapped
        let a = GpsPoint::new(0.0, 0.0);
        let far = GpsPoint::new(101.0 / 111_195.08, 0.0);
        let near = GpsPoint::new(92.0 / 111_195.08, 0.0);

        let appended = resample_points(&[a, far], 15.0).unwrap();
        assert_eq!(appended.len(), 8);
        assert_eq!(appended[7], far);

        let snapped = resample_points(&[a, near], 15.0).unwrap();
        assert_eq!(snapped.len(), 7);
        assert_eq!(snapped[6], near);
    }

    #[test]
    fn test_resample_uniform_spacing_across_vertices() {
        // Irregular vertices along a straight line
        let points = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0003, 0.0),
            GpsPoint::new(0.0004, 0.0),
            GpsPoint::new(0.0021, 0.0),
            GpsPoint::new(0.0025, 0.0),
            GpsPoint::new(0.0050, 0.0),
        ];
        let out = resample_points(&points, 15.0).unwrap();

        assert_eq!(out[0], points[0]);
        assert_eq!(out[out.len() - 1], points[5]);
        let interior = &out[..out.len() - 1];
        for w in interior.windows(2) {
            let d = haversine_distance(&w[0], &w[1]);
            assert!((d - 15.0).abs() < 1.5, "gap {d}");
        }
        // Count follows length / spacing
        let expected = (polyline_length(&points) / 15.0) as usize + 1;
        assert!(out.len() == expected || out.len() == expected + 1);
    }

    #[test]
    fn test_resample_monotonic_along_route() {
        let points = north_line(0.0007, 12);
        let out = resample_points(&points, 20.0).unwrap();
        for w in out.windows(2) {
            assert!(w[1].latitude >= w[0].latitude);
        }
    }

    #[test]
    fn test_resample_rejects_bad_spacing() {
        let points = north_line(0.001, 3);
        for spacing in [0.0, -15.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                resample_points(&points, spacing),
                Err(ReplayError::InvalidSpacing { .. })
            ));
        }
    }

    #[test]
    fn test_resample_rejects_spacing_too_fine_for_route() {
        let points = [GpsPoint::new(0.0, 0.0), GpsPoint::new(0.001, 0.0)];
        for spacing in [1e-300, 1e-9, 1e-4] {
            assert_eq!(
                resample_points(&points, spacing),
                Err(ReplayError::InvalidSpacing { spacing })
            );
        }

        // The cap depends on route length, so a tiny spacing on a
        // zero-length route is still fine
        let p = GpsPoint::new(-33.85, 151.15);
        assert_eq!(resample_points(&[p, p], 1e-300).unwrap(), vec![p, p]);

        // 111m at 1mm stays under the cap
        let fine = resample_points(&points, 0.001).unwrap();
        assert!(fine.len() > 100_000 && fine.len() <= MAX_RESAMPLED_POINTS);
    }

    #[test]
    fn test_resample_route_decodes() {
        let points = north_line(0.001, 4);
        let encoded = encode_route(&points).unwrap();
        let route = resample_route(&encoded, 15.0, &PrecisionFiveDecoder).unwrap();
        assert_eq!(route[0], points[0]);
        assert_eq!(route[route.len() - 1], points[3]);
        assert!(route.len() > 20);
    }

    #[test]
    fn test_uniform_route_sharing() {
        let route = UniformRoute::new(north_line(0.001, 3));
        let clone = route.clone();
        assert!(UniformRoute::ptr_eq(&route, &clone));

        let rebuilt = UniformRoute::new(route.to_vec());
        assert_eq!(route, rebuilt);
        assert!(!UniformRoute::ptr_eq(&route, &rebuilt));
    }
}
