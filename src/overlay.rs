//! Renderable route overlays.
//!
//! Turns activity records into what the map draws for each route: the
//! decoded line, the resampled geometry the marker walks, a color, an opacity
//! and the bounds to fit the camera.
//! Rebuilding after a style, speed or live mode change goes through the
//! [`RouteCache`], so only the first build pays for resampling.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cache::RouteCache;
use crate::codec::PolylineDecoder;
use crate::resample::{UniformRoute, DEFAULT_RESAMPLE_DISTANCE};
use crate::styling::RouteStyle;
use crate::{Activity, Bounds, GpsPoint};

/// Configuration for overlay assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// How routes are colored.
    /// Default: static red
    pub style: RouteStyle,

    /// Route line opacity.
    /// Default: 0.5
    pub opacity: f64,

    /// Live mode dims the static routes so the animated markers stand out.
    /// Default: false
    pub live_mode: bool,

    /// Spacing between resampled points in meters.
    /// Default: 15.0
    pub resample_distance: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            style: RouteStyle::default(),
            opacity: 0.5,
            live_mode: false,
            resample_distance: DEFAULT_RESAMPLE_DISTANCE,
        }
    }
}

impl OverlayConfig {
    /// Opacity actually applied to route lines.
    pub fn effective_opacity(&self) -> f64 {
        if self.live_mode {
            self.opacity * 0.5
        } else {
            self.opacity
        }
    }
}

/// One route ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOverlay {
    pub activity_id: u64,
    /// `#rrggbb` or any CSS color from a static style
    pub color: String,
    pub opacity: f64,
    /// Decoded polyline, drawn as the static line so corners stay sharp
    pub path: Arc<[GpsPoint]>,
    /// Resampled points the animated marker walks
    pub route: UniformRoute,
    /// Activity moving time, which fixes the replay loop duration
    pub moving_time_secs: f64,
    /// `None` when the route decoded to no points
    pub bounds: Option<Bounds>,
}

/// Build overlays for every activity that has a route.
///
/// Activities without a polyline are skipped, and so are routes that fail to
/// decode (with a warning); neither stops the rest of the batch. Colors are
/// assigned by position among the activities that have routes, preserving
/// input order.
///
/// # Example
///
/// ```rust
/// use route_replay::{build_overlays, encode_route, Activity, ActivityMap, GpsPoint, OverlayConfig, RouteCache};
///
/// let encoded = encode_route(&[GpsPoint::new(0.0, 0.0), GpsPoint::new(0.001, 0.0)]).unwrap();
/// let activity = Activity {
///     id: 7,
///     name: "Lunch Run".into(),
///     distance: 111.0,
///     moving_time: 40.0,
///     total_elevation_gain: 0.0,
///     start_date: String::new(),
///     map: ActivityMap { summary_polyline: Some(encoded), polyline: None },
/// };
///
/// let cache = RouteCache::new();
/// let overlays = build_overlays(&[activity], &OverlayConfig::default(), &cache);
/// assert_eq!(overlays.len(), 1);
/// assert_eq!(overlays[0].color, "#ff0000");
/// assert_eq!(overlays[0].route.len(), 9);
/// ```
pub fn build_overlays<D: PolylineDecoder>(
    activities: &[Activity],
    config: &OverlayConfig,
    cache: &RouteCache<D>,
) -> Vec<RouteOverlay> {
    let routed = with_routes(activities);
    let count = routed.len();

    let overlays: Vec<RouteOverlay> = routed
        .iter()
        .enumerate()
        .filter_map(|(index, (activity, encoded))| {
            build_overlay(activity, encoded, index, count, config, cache)
        })
        .collect();

    debug!(
        "[Overlays] Built {} of {} activities ({} with routes)",
        overlays.len(),
        activities.len(),
        count
    );
    overlays
}

/// Build overlays using parallel processing.
///
/// This is the same as [`build_overlays`] but resamples on rayon. Output
/// order matches the input order.
#[cfg(feature = "parallel")]
pub fn build_overlays_parallel<D: PolylineDecoder + Sync>(
    activities: &[Activity],
    config: &OverlayConfig,
    cache: &RouteCache<D>,
) -> Vec<RouteOverlay> {
    use rayon::prelude::*;

    let routed = with_routes(activities);
    let count = routed.len();

    let overlays: Vec<RouteOverlay> = routed
        .par_iter()
        .enumerate()
        .filter_map(|(index, (activity, encoded))| {
            build_overlay(activity, encoded, index, count, config, cache)
        })
        .collect();

    debug!(
        "[Overlays] Built {} of {} activities in parallel",
        overlays.len(),
        activities.len()
    );
    overlays
}

/// Bounds covering every overlay, or `None` if none have points.
pub fn combined_bounds(overlays: &[RouteOverlay]) -> Option<Bounds> {
    overlays
        .iter()
        .filter_map(|overlay| overlay.bounds)
        .reduce(|acc, bounds| acc.union(&bounds))
}

fn with_routes(activities: &[Activity]) -> Vec<(&Activity, &str)> {
    activities
        .iter()
        .filter_map(|activity| Some((activity, activity.encoded_route()?)))
        .collect()
}

fn build_overlay<D: PolylineDecoder>(
    activity: &Activity,
    encoded: &str,
    index: usize,
    count: usize,
    config: &OverlayConfig,
    cache: &RouteCache<D>,
) -> Option<RouteOverlay> {
    let prepared = match cache.get_or_prepare(encoded, config.resample_distance) {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("[Overlays] Skipping activity {}: {}", activity.id, e);
            return None;
        }
    };

    Some(RouteOverlay {
        activity_id: activity.id,
        color: config.style.color_for(activity, index, count),
        opacity: config.effective_opacity(),
        bounds: Bounds::from_points(&prepared.path),
        moving_time_secs: activity.moving_time,
        path: prepared.path,
        route: prepared.route,
    })
}
