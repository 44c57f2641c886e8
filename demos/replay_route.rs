//! Replay one activity on a virtual clock and print the marker position.
//!
//! Run with: cargo run --example replay_route

use std::rc::Rc;
use std::time::Duration;

use route_replay::{
    Animator, Playback, PlaybackConfig, RouteCache, SimulatedScheduler, DEFAULT_RESAMPLE_DISTANCE,
};

fn main() {
    // Three-vertex polyline from the encoding reference (California to Oregon)
    let encoded = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    let cache = RouteCache::new();
    let route = cache
        .get_or_resample(encoded, 5000.0)
        .expect("reference polyline decodes");

    println!("Route Replay Example\n");
    println!(
        "Resampled to {} points at 5 km spacing (default spacing is {} m)",
        route.len(),
        DEFAULT_RESAMPLE_DISTANCE
    );

    // Pretend the activity took 4 hours of moving time
    let config = PlaybackConfig {
        speed_multiplier: 1000.0,
        trail_length: 5,
        ..PlaybackConfig::default()
    };
    let playback = Playback::new(route, 4.0 * 3600.0, config).expect("valid playback config");
    println!(
        "Tick interval: {:?} (one loop in {:.1}s)\n",
        playback.tick_interval().unwrap_or_default(),
        4.0 * 3600.0 / 1000.0
    );

    let scheduler = Rc::new(SimulatedScheduler::new());
    let animator = Animator::new(Rc::clone(&scheduler), playback);
    animator.on_frame(|frame| {
        let p = frame.current_position;
        println!(
            "  marker at ({:.4}, {:.4}), {} trail segments",
            p.latitude,
            p.longitude,
            frame.trail_segments.len()
        );
    });

    animator.start();
    scheduler.advance(Duration::from_millis(600));

    println!("\nMap zoom: pausing at index {}", animator.current_index());
    animator.pause();
    scheduler.advance(Duration::from_secs(2));
    println!("Still at index {} after 2s paused", animator.current_index());

    animator.resume();
    scheduler.advance(Duration::from_millis(300));
    println!("Resumed; now at index {}", animator.current_index());
}
