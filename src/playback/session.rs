//! One animator per displayed route.

use std::rc::Rc;

use log::{debug, warn};

use super::animator::Animator;
use super::scheduler::Scheduler;
use super::{Frame, Playback, PlaybackConfig, MAX_TRAIL_LENGTH};
use crate::overlay::RouteOverlay;
use crate::Result;

/// Animates every route on the map.
///
/// Replacing the route set tears down every existing animator before the new
/// ones are built, so ticks from a previous set can never reach the new one.
/// Routes that cannot be animated (too few points, no moving time) are kept
/// out of the session and stay drawn as static lines.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use std::time::Duration;
/// use route_replay::{
///     build_overlays, encode_route, Activity, ActivityMap, GpsPoint, OverlayConfig,
///     PlaybackConfig, ReplaySession, RouteCache, SimulatedScheduler,
/// };
///
/// let encoded = encode_route(&[GpsPoint::new(0.0, 0.0), GpsPoint::new(0.003, 0.0)]).unwrap();
/// let activity = Activity {
///     id: 1,
///     name: "Ride".into(),
///     distance: 333.0,
///     moving_time: 60.0,
///     total_elevation_gain: 0.0,
///     start_date: String::new(),
///     map: ActivityMap { summary_polyline: Some(encoded), polyline: None },
/// };
/// let overlays = build_overlays(&[activity], &OverlayConfig::default(), &RouteCache::new());
///
/// let scheduler = Rc::new(SimulatedScheduler::new());
/// let mut session = ReplaySession::new(Rc::clone(&scheduler), PlaybackConfig::default()).unwrap();
/// assert_eq!(session.set_routes(&overlays), 1);
///
/// scheduler.advance(Duration::from_millis(100));
/// let frames = session.frames();
/// assert_eq!(frames[0].0, 1);
/// ```
pub struct ReplaySession<S: Scheduler + 'static> {
    scheduler: Rc<S>,
    config: PlaybackConfig,
    animators: Vec<(u64, Animator<S>)>,
    paused: bool,
}

impl<S: Scheduler + 'static> ReplaySession<S> {
    /// Create an empty session. Fails on an invalid config.
    pub fn new(scheduler: Rc<S>, config: PlaybackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scheduler,
            config,
            animators: Vec::new(),
            paused: false,
        })
    }

    /// Replace the animated route set and start every animatable route.
    ///
    /// Returns how many routes are animating. A session paused with
    /// [`pause_all`](Self::pause_all) starts the new routes paused.
    pub fn set_routes(&mut self, overlays: &[RouteOverlay]) -> usize {
        self.clear();

        for overlay in overlays {
            let playback = match Playback::new(
                overlay.route.clone(),
                overlay.moving_time_secs,
                self.config.clone(),
            ) {
                Ok(playback) => playback,
                Err(e) => {
                    warn!(
                        "[ReplaySession] Activity {} stays static: {}",
                        overlay.activity_id, e
                    );
                    continue;
                }
            };

            let animator = Animator::new(Rc::clone(&self.scheduler), playback);
            if !animator.start() {
                warn!(
                    "[ReplaySession] Activity {} stays static: {} points",
                    overlay.activity_id,
                    overlay.route.len()
                );
                continue;
            }
            if self.paused {
                animator.pause();
            }
            self.animators.push((overlay.activity_id, animator));
        }

        debug!(
            "[ReplaySession] Animating {} of {} routes",
            self.animators.len(),
            overlays.len()
        );
        self.animators.len()
    }

    /// Pause every route, e.g. while the map is zooming.
    pub fn pause_all(&mut self) {
        self.paused = true;
        for (_, animator) in &self.animators {
            animator.pause();
        }
    }

    /// Resume every route from where it paused.
    pub fn resume_all(&mut self) {
        self.paused = false;
        for (_, animator) in &self.animators {
            animator.resume();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change the speed of every route, and of routes added later.
    pub fn set_speed(&mut self, speed_multiplier: f64) -> Result<()> {
        let mut config = self.config.clone();
        config.speed_multiplier = speed_multiplier;
        config.validate()?;

        for (_, animator) in &self.animators {
            animator.set_speed(speed_multiplier)?;
        }
        self.config = config;
        Ok(())
    }

    /// Change the trail length of every route, and of routes added later.
    ///
    /// Lengths above [`MAX_TRAIL_LENGTH`] are clamped to it.
    pub fn set_trail_length(&mut self, trail_length: u32) {
        let trail_length = trail_length.min(MAX_TRAIL_LENGTH);
        self.config.trail_length = trail_length;
        for (_, animator) in &self.animators {
            animator.set_trail_length(trail_length);
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Current frame of every animated route, keyed by activity id.
    pub fn frames(&self) -> Vec<(u64, Frame)> {
        self.animators
            .iter()
            .filter_map(|(id, animator)| Some((*id, animator.frame()?)))
            .collect()
    }

    /// Animator for one activity, if it is animating.
    pub fn animator(&self, activity_id: u64) -> Option<&Animator<S>> {
        self.animators
            .iter()
            .find(|(id, _)| *id == activity_id)
            .map(|(_, animator)| animator)
    }

    /// Stop and drop every animator.
    pub fn clear(&mut self) {
        for (_, animator) in &self.animators {
            animator.stop();
        }
        self.animators.clear();
    }

    pub fn len(&self) -> usize {
        self.animators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }
}

impl<S: Scheduler + 'static> std::fmt::Debug for ReplaySession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySession")
            .field("config", &self.config)
            .field("routes", &self.animators.len())
            .field("paused", &self.paused)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{PlaybackStatus, SimulatedScheduler};
    use crate::resample::UniformRoute;
    use crate::{Bounds, GpsPoint, ReplayError};
    use std::time::Duration;

    fn overlay(activity_id: u64, points: usize, moving_time_secs: f64) -> RouteOverlay {
        let route = UniformRoute::new(
            (0..points)
                .map(|i| GpsPoint::new(-33.85 + i as f64 * 1e-4, 151.15))
                .collect(),
        );
        RouteOverlay {
            activity_id,
            color: "#ff0000".to_string(),
            opacity: 0.5,
            bounds: Bounds::from_points(&route),
            path: route.to_vec().into(),
            route,
            moving_time_secs,
        }
    }

    fn session() -> (Rc<SimulatedScheduler>, ReplaySession<SimulatedScheduler>) {
        let scheduler = Rc::new(SimulatedScheduler::new());
        let session = ReplaySession::new(Rc::clone(&scheduler), PlaybackConfig::default()).unwrap();
        (scheduler, session)
    }

    #[test]
    fn test_degenerate_routes_stay_static() {
        let (scheduler, mut session) = session();
        let overlays = vec![
            overlay(1, 50, 600.0),
            overlay(2, 1, 600.0),
            overlay(3, 0, 600.0),
            overlay(4, 50, 0.0),
        ];

        assert_eq!(session.set_routes(&overlays), 1);
        assert!(session.animator(1).is_some());
        assert!(session.animator(2).is_none());
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_set_routes_tears_down_previous() {
        let (scheduler, mut session) = session();
        session.set_routes(&[overlay(1, 50, 600.0), overlay(2, 50, 300.0)]);
        scheduler.advance(Duration::from_millis(600));
        assert_eq!(scheduler.pending(), 2);

        session.set_routes(&[overlay(3, 50, 600.0)]);
        assert_eq!(session.len(), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(session.animator(3).unwrap().current_index(), 0);

        session.clear();
        assert!(session.is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_routes_loop_independently() {
        let (scheduler, mut session) = session();
        // 120ms and 60ms ticks
        session.set_routes(&[overlay(1, 50, 600.0), overlay(2, 50, 300.0)]);

        scheduler.advance(Duration::from_millis(600));
        assert_eq!(session.animator(1).unwrap().current_index(), 5);
        assert_eq!(session.animator(2).unwrap().current_index(), 10);

        let frames = session.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].0, 2);
        assert_eq!(frames[1].1.trail_segments.len(), 9);
    }

    #[test]
    fn test_pause_all_and_resume_all() {
        let (scheduler, mut session) = session();
        session.set_routes(&[overlay(1, 50, 600.0), overlay(2, 50, 300.0)]);
        scheduler.advance(Duration::from_millis(600));

        session.pause_all();
        assert!(session.is_paused());
        assert_eq!(scheduler.pending(), 0);
        scheduler.advance(Duration::from_secs(30));
        assert_eq!(session.animator(1).unwrap().current_index(), 5);

        // Routes added while paused start paused
        session.set_routes(&[overlay(3, 50, 600.0)]);
        assert_eq!(session.animator(3).unwrap().status(), PlaybackStatus::Paused);

        session.resume_all();
        scheduler.advance(Duration::from_millis(120));
        assert_eq!(session.animator(3).unwrap().current_index(), 1);
    }

    #[test]
    fn test_speed_and_trail_fan_out() {
        let (scheduler, mut session) = session();
        session.set_routes(&[overlay(1, 50, 600.0)]);

        session.set_speed(200.0).unwrap();
        scheduler.advance(Duration::from_millis(600));
        assert_eq!(session.animator(1).unwrap().current_index(), 10);

        session.set_trail_length(3);
        assert_eq!(session.animator(1).unwrap().trail_len(), 3);
        assert_eq!(session.config().trail_length, 3);

        // Clamped, so routes added later still build
        session.set_trail_length(u32::MAX);
        assert_eq!(session.config().trail_length, MAX_TRAIL_LENGTH);
        assert_eq!(session.set_routes(&[overlay(2, 50, 600.0)]), 1);

        assert_eq!(
            session.set_speed(-1.0),
            Err(ReplayError::InvalidSpeed { speed: -1.0 })
        );
        assert_eq!(session.config().speed_multiplier, 200.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlaybackConfig {
            trail_opacity: 1.5,
            ..PlaybackConfig::default()
        };
        let result = ReplaySession::new(Rc::new(SimulatedScheduler::new()), config);
        assert!(result.is_err());
    }
}
