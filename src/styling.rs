//! Route colors.
//!
//! Three styles are supported: one static color for every route, a
//! chronological rainbow (oldest red, newest violet), and a speed scale that
//! runs from blue for slow activities through red to violet for fast ones.

use serde::{Deserialize, Serialize};

use crate::Activity;

/// Slowest speed on the color scale, in km/h.
pub const SPEED_SCALE_MIN_KMH: f64 = 10.0;
/// Fastest speed on the color scale, in km/h.
pub const SPEED_SCALE_MAX_KMH: f64 = 17.0;

/// How routes are colored on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteStyle {
    /// Every route shares one CSS color
    Static { color: String },
    /// Hue follows the route's position in the activity list
    Chronological,
    /// Hue follows the activity's average moving speed
    Speed,
}

impl Default for RouteStyle {
    fn default() -> Self {
        RouteStyle::Static {
            color: "#ff0000".to_string(),
        }
    }
}

impl RouteStyle {
    /// Color for the `index`-th of `count` routes.
    pub fn color_for(&self, activity: &Activity, index: usize, count: usize) -> String {
        match self {
            RouteStyle::Static { color } => color.clone(),
            RouteStyle::Chronological => {
                let position = if count > 1 {
                    index as f64 / (count - 1) as f64
                } else {
                    0.0
                };
                rainbow_color(position)
            }
            RouteStyle::Speed => speed_color(activity.speed_kmh()),
        }
    }
}

/// Convert HSL to a `#rrggbb` hex string.
///
/// `h` is in degrees (0-360), `s` and `l` in percent (0-100).
///
/// # Example
///
/// ```rust
/// use route_replay::hsl_to_hex;
///
/// assert_eq!(hsl_to_hex(0.0, 100.0, 50.0), "#ff0000");
/// assert_eq!(hsl_to_hex(120.0, 100.0, 50.0), "#00ff00");
/// ```
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let lightness = l / 100.0;
    let a = s * lightness.min(1.0 - lightness) / 100.0;
    let channel = |n: f64| {
        let k = (n + h / 30.0) % 12.0;
        let value = lightness - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (255.0 * value).round().clamp(0.0, 255.0) as u8
    };
    format!("#{:02x}{:02x}{:02x}", channel(0.0), channel(8.0), channel(4.0))
}

/// Color along the rainbow for `position` in `[0, 1]` (red to violet).
///
/// Positions outside the range are clamped.
pub fn rainbow_color(position: f64) -> String {
    let position = if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    };
    hsl_to_hex(position * 270.0, 100.0, 50.0)
}

/// Color for an average speed in km/h.
///
/// Speeds are clamped to 10-17 km/h. The lower 80% of the scale sweeps the
/// hue from blue (240) down to red (0); the top 20% continues from red round
/// to violet (300).
pub fn speed_color(speed_kmh: f64) -> String {
    let speed = if speed_kmh.is_nan() {
        SPEED_SCALE_MIN_KMH
    } else {
        speed_kmh.clamp(SPEED_SCALE_MIN_KMH, SPEED_SCALE_MAX_KMH)
    };
    let normalized = (speed - SPEED_SCALE_MIN_KMH) / (SPEED_SCALE_MAX_KMH - SPEED_SCALE_MIN_KMH);

    let hue = if normalized <= 0.8 {
        240.0 - (normalized / 0.8) * 240.0
    } else {
        let factor = (normalized - 0.8) / 0.2;
        360.0 - 60.0 * factor
    };

    hsl_to_hex(hue, 100.0, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActivityMap;

    fn activity(distance: f64, moving_time: f64) -> Activity {
        Activity {
            id: 1,
            name: String::new(),
            distance,
            moving_time,
            total_elevation_gain: 0.0,
            start_date: String::new(),
            map: ActivityMap::default(),
        }
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_hex(0.0, 100.0, 50.0), "#ff0000");
        assert_eq!(hsl_to_hex(240.0, 100.0, 50.0), "#0000ff");
        assert_eq!(hsl_to_hex(0.0, 0.0, 100.0), "#ffffff");
        assert_eq!(hsl_to_hex(0.0, 0.0, 0.0), "#000000");
    }

    #[test]
    fn test_rainbow_ends() {
        assert_eq!(rainbow_color(0.0), "#ff0000");
        assert_eq!(rainbow_color(1.0), "#8000ff");
        assert_eq!(rainbow_color(-2.0), rainbow_color(0.0));
        assert_eq!(rainbow_color(7.0), rainbow_color(1.0));
    }

    #[test]
    fn test_speed_scale() {
        assert_eq!(speed_color(10.0), "#0000ff");
        assert_eq!(speed_color(3.0), "#0000ff");
        assert_eq!(speed_color(17.0), "#ff00ff");
        assert_eq!(speed_color(40.0), "#ff00ff");
        // 80% of the scale is pure red
        assert_eq!(speed_color(15.6), "#ff0000");
    }

    #[test]
    fn test_style_color_for() {
        let a = activity(10_000.0, 3000.0);

        let fixed = RouteStyle::Static {
            color: "#123456".to_string(),
        };
        assert_eq!(fixed.color_for(&a, 3, 10), "#123456");

        let chrono = RouteStyle::Chronological;
        assert_eq!(chrono.color_for(&a, 0, 5), "#ff0000");
        assert_eq!(chrono.color_for(&a, 4, 5), "#8000ff");
        assert_eq!(chrono.color_for(&a, 0, 1), "#ff0000");

        // 12 km/h
        assert_eq!(RouteStyle::Speed.color_for(&a, 0, 1), speed_color(12.0));
    }

    #[test]
    fn test_style_serde() {
        let style: RouteStyle = serde_json::from_str(r#"{"type": "chronological"}"#).unwrap();
        assert_eq!(style, RouteStyle::Chronological);

        let style: RouteStyle =
            serde_json::from_str(r##"{"type": "static", "color": "#00ff00"}"##).unwrap();
        assert_eq!(
            style,
            RouteStyle::Static {
                color: "#00ff00".to_string()
            }
        );
    }
}
