//! Activity records as supplied by the fetch layer.
//!
//! The shape mirrors the fitness API's activity summary JSON, so a host can
//! hand over the response body unchanged. Only the fields the map needs are
//! modelled; anything else in the payload is ignored.

use serde::{Deserialize, Serialize};

/// A recorded activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    /// Moving time in seconds
    #[serde(default)]
    pub moving_time: f64,
    /// Elevation gain in meters
    #[serde(default)]
    pub total_elevation_gain: f64,
    /// ISO-8601 start timestamp
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub map: ActivityMap,
}

/// Route geometry attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMap {
    /// Low-resolution route, present on list responses
    #[serde(default)]
    pub summary_polyline: Option<String>,
    /// Full-resolution route, present on detail responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polyline: Option<String>,
}

impl Activity {
    /// The encoded route to draw, if the activity has one.
    ///
    /// Indoor activities come back with an empty or null summary polyline.
    pub fn encoded_route(&self) -> Option<&str> {
        self.map
            .summary_polyline
            .as_deref()
            .filter(|encoded| !encoded.is_empty())
    }

    /// Average moving speed in km/h, or 0 when no moving time was recorded.
    pub fn speed_kmh(&self) -> f64 {
        if self.moving_time <= 0.0 || !self.moving_time.is_finite() {
            return 0.0;
        }
        self.distance / self.moving_time * 3.6
    }
}
