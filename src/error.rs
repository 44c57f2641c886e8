//! Error types for route preprocessing and playback.

use thiserror::Error;

/// Errors produced while resampling routes or configuring playback.
///
/// Degenerate routes (fewer than two points) are not errors: resampling
/// returns them unchanged and playback stays stopped.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ReplayError {
    /// Resample spacing was zero, negative or not finite, or so fine that the
    /// route would exceed [`MAX_RESAMPLED_POINTS`](crate::MAX_RESAMPLED_POINTS).
    #[error(
        "resample spacing must be a positive finite number of meters giving at most {max} points, got {spacing}",
        max = crate::resample::MAX_RESAMPLED_POINTS
    )]
    InvalidSpacing { spacing: f64 },

    /// Playback speed multiplier was zero, negative or not finite.
    #[error("speed multiplier must be a positive finite number, got {speed}")]
    InvalidSpeed { speed: f64 },

    /// Activity moving time was zero, negative or not finite.
    #[error("moving time must be a positive finite number of seconds, got {seconds}")]
    InvalidDuration { seconds: f64 },

    /// Trail length exceeded [`MAX_TRAIL_LENGTH`](crate::MAX_TRAIL_LENGTH).
    #[error("trail length must be at most {max}, got {length}")]
    InvalidTrailLength { length: u32, max: u32 },

    /// Trail opacity was outside `[0, 1]`.
    #[error("trail opacity must lie within [0, 1], got {opacity}")]
    InvalidOpacity { opacity: f64 },

    /// The encoded polyline could not be decoded.
    #[error("failed to decode polyline: {message}")]
    Decode { message: String },

    /// The points could not be encoded as a polyline.
    #[error("failed to encode polyline: {message}")]
    Encode { message: String },
}

/// Result type alias for route replay operations.
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Reject anything that is not a positive finite number.
pub(crate) fn require_positive(value: f64, err: impl FnOnce(f64) -> ReplayError) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(err(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReplayError::InvalidSpacing { spacing: -1.0 };
        assert!(err.to_string().contains("-1"));

        let err = ReplayError::Decode {
            message: "bad byte".to_string(),
        };
        assert_eq!(err.to_string(), "failed to decode polyline: bad byte");
    }

    #[test]
    fn test_require_positive() {
        let make = |speed| ReplayError::InvalidSpeed { speed };
        assert_eq!(require_positive(2.5, make), Ok(2.5));
        assert!(require_positive(0.0, make).is_err());
        assert!(require_positive(-3.0, make).is_err());
        assert!(require_positive(f64::NAN, make).is_err());
        assert!(require_positive(f64::INFINITY, make).is_err());
    }
}
