//! Encoded polyline decoding.
//!
//! Activity routes arrive as Google encoded polylines with a precision factor
//! of 1e5. Decoding sits behind [`PolylineDecoder`] so the resampler and the
//! route cache can be exercised with an instrumented decoder in tests.

use geo::Coord;

use crate::{GpsPoint, ReplayError, Result};

/// Precision used by the activity API's `summary_polyline`.
pub const POLYLINE_PRECISION: u32 = 5;

/// Converts an encoded route into an ordered sequence of GPS points.
///
/// Implementations are trusted to invert the encoding faithfully; the
/// resampler does not re-validate decoded coordinates.
pub trait PolylineDecoder {
    fn decode(&self, encoded: &str) -> Result<Vec<GpsPoint>>;
}

impl<D: PolylineDecoder + ?Sized> PolylineDecoder for &D {
    fn decode(&self, encoded: &str) -> Result<Vec<GpsPoint>> {
        (**self).decode(encoded)
    }
}

/// Decoder for precision-5 polylines, backed by the `polyline` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecisionFiveDecoder;

impl PolylineDecoder for PrecisionFiveDecoder {
    fn decode(&self, encoded: &str) -> Result<Vec<GpsPoint>> {
        decode_route(encoded)
    }
}

/// Decode a precision-5 polyline.
///
/// # Example
///
/// ```rust
/// use route_replay::{decode_route, GpsPoint};
///
/// let points = decode_route("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert_eq!(points[0], GpsPoint::new(38.5, -120.2));
/// ```
pub fn decode_route(encoded: &str) -> Result<Vec<GpsPoint>> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION).map_err(|e| {
        ReplayError::Decode {
            message: e.to_string(),
        }
    })?;

    Ok(line.into_inner().into_iter().map(GpsPoint::from).collect())
}

/// Encode points as a precision-5 polyline.
pub fn encode_route(points: &[GpsPoint]) -> Result<String> {
    polyline::encode_coordinates(points.iter().map(|p| Coord::from(*p)), POLYLINE_PRECISION)
        .map_err(|e| ReplayError::Encode {
            message: e.to_string(),
        })
}
