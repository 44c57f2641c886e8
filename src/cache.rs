//! Memoized route resampling.
//!
//! Resampling is repeated every time the overlay set is rebuilt (style change,
//! speed change, live mode toggle), so resampled routes are cached by their
//! exact `(encoded polyline, spacing)` input, together with the decoded
//! polyline the static line is drawn from. Entries are immutable once
//! inserted and the cache holds only derived data: clearing it affects
//! performance, never results.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::codec::{PolylineDecoder, PrecisionFiveDecoder};
use crate::error::require_positive;
use crate::resample::{resample_points, UniformRoute};
use crate::{GpsPoint, ReplayError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    encoded: String,
    // f64 has no Hash; validated spacings are finite so the bits are canonical
    spacing_bits: u64,
}

/// One cache entry: the decoded polyline and its resampled form.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRoute {
    /// Decoded polyline vertices, for drawing the static route
    pub path: Arc<[GpsPoint]>,
    /// Uniformly spaced points, for animation
    pub route: UniformRoute,
}

/// Cache of resampled routes keyed by encoded polyline and spacing.
///
/// Create one per application and pass it by reference to whatever builds
/// overlays; tests get their own instance and never see each other's entries.
///
/// # Example
///
/// ```rust
/// use route_replay::{encode_route, GpsPoint, RouteCache, UniformRoute};
///
/// let encoded = encode_route(&[GpsPoint::new(0.0, 0.0), GpsPoint::new(0.002, 0.0)]).unwrap();
/// let cache = RouteCache::new();
///
/// let first = cache.get_or_resample(&encoded, 15.0).unwrap();
/// let second = cache.get_or_resample(&encoded, 15.0).unwrap();
/// assert!(UniformRoute::ptr_eq(&first, &second));
///
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct RouteCache<D = PrecisionFiveDecoder> {
    decoder: D,
    routes: RwLock<HashMap<CacheKey, CachedRoute>>,
}

impl RouteCache<PrecisionFiveDecoder> {
    /// Create an empty cache using the precision-5 polyline decoder.
    pub fn new() -> Self {
        Self::with_decoder(PrecisionFiveDecoder)
    }
}

impl<D: PolylineDecoder> RouteCache<D> {
    /// Create an empty cache with a custom decoder.
    pub fn with_decoder(decoder: D) -> Self {
        Self {
            decoder,
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Get the resampled route for `encoded`, computing it on first request.
    ///
    /// Repeated calls with the same key return handles to the same shared
    /// route without decoding again. Failures are not cached.
    pub fn get_or_resample(&self, encoded: &str, spacing: f64) -> Result<UniformRoute> {
        Ok(self.get_or_prepare(encoded, spacing)?.route)
    }

    /// Like [`get_or_resample`](Self::get_or_resample), but also returns the
    /// decoded polyline.
    pub fn get_or_prepare(&self, encoded: &str, spacing: f64) -> Result<CachedRoute> {
        let spacing = require_positive(spacing, |spacing| ReplayError::InvalidSpacing { spacing })?;
        let key = CacheKey {
            encoded: encoded.to_string(),
            spacing_bits: spacing.to_bits(),
        };

        if let Some(route) = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(route.clone());
        }

        debug!(
            "[RouteCache] Miss for {}-char polyline at {:.1}m spacing",
            encoded.len(),
            spacing
        );
        let decoded = self.decoder.decode(encoded)?;
        let route = UniformRoute::new(resample_points(&decoded, spacing)?);
        debug!(
            "[RouteCache] {} raw points -> {} points",
            decoded.len(),
            route.len()
        );
        let entry = CachedRoute {
            path: decoded.into(),
            route,
        };

        // A concurrent miss may have inserted first; hand out that entry so
        // every caller shares one allocation per key.
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        Ok(routes.entry(key).or_insert(entry).clone())
    }

    /// Drop every cached route.
    pub fn clear(&self) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        debug!("[RouteCache] Clearing {} routes", routes.len());
        routes.clear();
    }

    /// Check whether a route is cached for this key.
    pub fn contains(&self, encoded: &str, spacing: f64) -> bool {
        let key = CacheKey {
            encoded: encoded.to_string(),
            spacing_bits: spacing.to_bits(),
        };
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
    }

    /// Number of cached routes.
    pub fn len(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_route, encode_route};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts decode calls so memoization can be observed.
    #[derive(Default)]
    struct CountingDecoder {
        calls: AtomicUsize,
    }

    impl PolylineDecoder for CountingDecoder {
        fn decode(&self, encoded: &str) -> Result<Vec<GpsPoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PrecisionFiveDecoder.decode(encoded)
        }
    }

    fn sample_encoded() -> String {
        encode_route(&[
            GpsPoint::new(-33.8500, 151.1500),
            GpsPoint::new(-33.8510, 151.1520),
            GpsPoint::new(-33.8530, 151.1530),
        ])
        .unwrap()
    }

    #[test]
    fn test_cache_hit_skips_decode() {
        let cache = RouteCache::with_decoder(CountingDecoder::default());
        let encoded = sample_encoded();

        let first = cache.get_or_resample(&encoded, 15.0).unwrap();
        let second = cache.get_or_resample(&encoded, 15.0).unwrap();

        assert_eq!(cache.decoder().calls.load(Ordering::SeqCst), 1);
        assert!(UniformRoute::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_spacing_is_part_of_key() {
        let cache = RouteCache::with_decoder(CountingDecoder::default());
        let encoded = sample_encoded();

        let fine = cache.get_or_resample(&encoded, 10.0).unwrap();
        let coarse = cache.get_or_resample(&encoded, 30.0).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.decoder().calls.load(Ordering::SeqCst), 2);
        assert!(fine.len() > coarse.len());
        assert!(cache.contains(&encoded, 10.0));
        assert!(!cache.contains(&encoded, 20.0));
    }

    #[test]
    fn test_cache_clear_recomputes() {
        let cache = RouteCache::with_decoder(CountingDecoder::default());
        let encoded = sample_encoded();

        let before = cache.get_or_resample(&encoded, 15.0).unwrap();
        cache.clear();
        assert!(cache.is_empty());

        let after = cache.get_or_resample(&encoded, 15.0).unwrap();
        assert_eq!(cache.decoder().calls.load(Ordering::SeqCst), 2);
        assert_eq!(before, after);
        assert!(!UniformRoute::ptr_eq(&before, &after));
    }

    #[test]
    fn test_cache_rejects_invalid_spacing_without_decoding() {
        let cache = RouteCache::with_decoder(CountingDecoder::default());
        let result = cache.get_or_resample(&sample_encoded(), f64::NAN);

        assert!(matches!(result, Err(ReplayError::InvalidSpacing { .. })));
        assert_eq!(cache.decoder().calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_keeps_decoded_path() {
        let cache = RouteCache::with_decoder(CountingDecoder::default());
        let encoded = sample_encoded();

        let prepared = cache.get_or_prepare(&encoded, 15.0).unwrap();
        assert_eq!(&*prepared.path, decode_route(&encoded).unwrap().as_slice());
        assert!(prepared.route.len() > prepared.path.len());

        let resampled = cache.get_or_resample(&encoded, 15.0).unwrap();
        assert!(UniformRoute::ptr_eq(&prepared.route, &resampled));
        assert!(Arc::ptr_eq(
            &prepared.path,
            &cache.get_or_prepare(&encoded, 15.0).unwrap().path
        ));
        assert_eq!(cache.decoder().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_is_shareable_across_threads() {
        let cache = RouteCache::new();
        let encoded = sample_encoded();

        let routes: Vec<UniformRoute> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| cache.get_or_resample(&encoded, 15.0).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), 1);
        for route in &routes[1..] {
            assert!(UniformRoute::ptr_eq(&routes[0], route));
        }
    }
}
