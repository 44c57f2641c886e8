//! Build overlays for a batch of synthetic activities in parallel.
//!
//! Run with: cargo run --example batch_overlays --features parallel

use std::time::Instant;

use route_replay::{
    build_overlays, build_overlays_parallel, combined_bounds, encode_route, Activity, ActivityMap,
    GpsPoint, OverlayConfig, RouteCache, RouteStyle,
};

fn synthetic_activity(id: u64) -> Activity {
    // Out-and-back loops radiating from Sydney
    let angle = id as f64 * 0.37;
    let points: Vec<GpsPoint> = (0..40)
        .map(|i| {
            let reach = (i as f64 / 39.0 * std::f64::consts::PI).sin() * 0.05;
            GpsPoint::new(-33.85 + angle.sin() * reach, 151.15 + angle.cos() * reach)
        })
        .collect();

    Activity {
        id,
        name: format!("Run {}", id),
        distance: 10_000.0 + id as f64 * 50.0,
        moving_time: 3000.0,
        total_elevation_gain: 0.0,
        start_date: String::new(),
        map: ActivityMap {
            summary_polyline: encode_route(&points).ok(),
            polyline: None,
        },
    }
}

fn main() {
    let activities: Vec<Activity> = (0..500).map(synthetic_activity).collect();
    let config = OverlayConfig {
        style: RouteStyle::Speed,
        ..OverlayConfig::default()
    };

    println!("Batch Overlay Example\n");
    println!("Activities: {}", activities.len());

    let cache = RouteCache::new();
    let start = Instant::now();
    let overlays = build_overlays_parallel(&activities, &config, &cache);
    println!("Parallel build (cold cache): {:?}", start.elapsed());

    let start = Instant::now();
    let rebuilt = build_overlays(&activities, &OverlayConfig::default(), &cache);
    println!("Sequential restyle (warm cache): {:?}", start.elapsed());

    let points: usize = overlays.iter().map(|o| o.route.len()).sum();
    println!("\nOverlays: {} ({} resampled points)", overlays.len(), points);
    println!("Restyled overlays: {}", rebuilt.len());
    println!("Cached routes: {}", cache.len());
    if let Some(bounds) = combined_bounds(&overlays) {
        let center = bounds.center();
        println!("Fit map to center ({:.4}, {:.4})", center.latitude, center.longitude);
    }
}
