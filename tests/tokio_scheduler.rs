#![cfg(feature = "runtime")]
//! Real-time scheduling on a paused tokio clock.

use std::rc::Rc;
use std::time::Duration;

use route_replay::{
    Animator, GpsPoint, Playback, PlaybackConfig, PlaybackStatus, Scheduler, TokioScheduler,
    UniformRoute,
};
use tokio::task::LocalSet;

fn playback() -> Playback {
    let route = UniformRoute::new(
        (0..50)
            .map(|i| GpsPoint::new(-33.85 + i as f64 * 1e-4, 151.15))
            .collect(),
    );
    // 120ms per tick
    Playback::new(route, 600.0, PlaybackConfig::default()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_animator_ticks_on_tokio_timers() {
    LocalSet::new()
        .run_until(async {
            let scheduler = Rc::new(TokioScheduler::new());
            let animator = Animator::new(Rc::clone(&scheduler), playback());
            assert!(animator.start());

            tokio::time::sleep(Duration::from_millis(1260)).await;
            assert_eq!(animator.current_index(), 10);

            animator.pause();
            assert_eq!(scheduler.pending(), 0);
            tokio::time::sleep(Duration::from_secs(5)).await;
            assert_eq!(animator.current_index(), 10);
            assert_eq!(animator.status(), PlaybackStatus::Paused);

            animator.resume();
            tokio::time::sleep(Duration::from_millis(1260)).await;
            assert_eq!(animator.current_index(), 20);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_tick_never_fires() {
    LocalSet::new()
        .run_until(async {
            let scheduler = TokioScheduler::new();
            let fired = Rc::new(std::cell::Cell::new(false));

            let flag = Rc::clone(&fired);
            let handle =
                scheduler.schedule_tick(Duration::from_millis(50), Box::new(move |_| flag.set(true)));
            assert_eq!(scheduler.pending(), 1);
            scheduler.cancel(handle);

            tokio::time::sleep(Duration::from_millis(200)).await;
            assert!(!fired.get());
            assert_eq!(scheduler.pending(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_now_follows_tokio_clock() {
    let scheduler = TokioScheduler::new();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(scheduler.now(), Duration::from_millis(300));
}
